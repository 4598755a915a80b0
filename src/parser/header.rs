use super::error::{BadRequestReason, Reject};
use crate::common::ParseResult;
use crate::headers::StandardHeader;
use crate::io::{LineBuffer, Span};
use crate::matches;

/// Header section progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderLine {
    /// A header field line is buffered.
    Field,
    /// The empty line terminating the header section was consumed.
    End,
}

/// Locate the next header line.
///
/// Returns [`HeaderLine::End`] after consuming the empty terminator line. Otherwise returns
/// [`HeaderLine::Field`] once the whole field line is buffered, then [`parse_header_name`] and
/// [`parse_header_value`] consume it.
pub fn parse_header_line(buf: &mut LineBuffer) -> ParseResult<HeaderLine, Reject> {
    if buf.consume_if_empty_line() {
        return ParseResult::Ok(HeaderLine::End);
    }

    match buf.buffered() {
        [] | [b'\r'] => return pending(buf),
        [b'\r', ..] => return ParseResult::Err(BadRequestReason::InvalidHeaderName.into()),
        _ => {}
    }

    match buf.find_line() {
        Some(_) => ParseResult::Ok(HeaderLine::Field),
        None => pending(buf),
    }
}

fn pending<T>(buf: &LineBuffer) -> ParseResult<T, Reject> {
    if buf.is_exhausted() {
        ParseResult::Err(Reject::Overflow)
    } else {
        ParseResult::Pending
    }
}

/// Scan the header name and its colon on a located line.
///
/// Returns `None` for names outside of [`StandardHeader`].
pub fn parse_header_name(buf: &mut LineBuffer) -> Result<Option<StandardHeader>, Reject> {
    let invalid = Reject::BadRequest(BadRequestReason::InvalidHeaderName);

    let &first = buf.buffered().first().ok_or(invalid)?;

    for &header in StandardHeader::candidates(first) {
        if buf.matches_ignore_case(header.token()) {
            return Ok(Some(header));
        }
    }

    let line_limit = buf.line_limit();
    let colon = match buf.index_of(b':') {
        Some(colon) if colon < line_limit => colon,
        _ => return Err(invalid),
    };
    let name_len = colon - buf.index();
    let name = &buf.buffered()[..name_len];

    if name.is_empty() || !name.iter().all(|&b| matches::is_token(b)) {
        return Err(invalid);
    }

    buf.advance(name_len + 1);
    Ok(None)
}

/// Scan the header value and the line terminator on a located line.
///
/// At most one leading and one trailing optional whitespace is excluded from the value.
pub fn parse_header_value(buf: &mut LineBuffer) -> Result<Span, Reject> {
    let invalid = Reject::BadRequest(BadRequestReason::InvalidHeaderValue);

    let line_limit = buf.line_limit();
    let index = buf.index();

    // the byte before LF must be CR
    let cr = match line_limit.checked_sub(1) {
        Some(cr) if cr >= index && buf.buffered()[cr - index] == b'\r' => cr,
        _ => return Err(invalid),
    };

    let raw = &buf.buffered()[..cr - index];
    if !raw.iter().all(|&b| matches::is_field_value(b)) {
        return Err(invalid);
    }

    let mut value = buf.span(index, cr);
    if raw.first().is_some_and(|&b| matches::is_ows(b)) {
        value = value.trim_start(1);
    }
    if !value.is_empty() && raw.last().is_some_and(|&b| matches::is_ows(b)) {
        value = value.trim_end(1);
    }

    buf.advance(cr - index);
    if !buf.consume_if_end_of_line() {
        return Err(invalid);
    }

    Ok(value)
}
