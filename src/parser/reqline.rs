use super::error::{BadRequestReason, Reject};
use crate::common::ParseResult;
use crate::http::{Method, Version};
use crate::io::{LineBuffer, Span};
use crate::matches;

macro_rules! err {
    ($variant:ident) => {
        ParseResult::Err(Reject::BadRequest(BadRequestReason::$variant))
    };
}

const VERSION_PREFIX: &[u8] = b"HTTP/";

const VERSION_SIZE: usize = b"HTTP/1.1".len();

/// Request target in origin form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    /// Absolute path, starting with `/`.
    pub path: Span,
    /// Query string, after `?` and excluding it.
    pub query: Option<Span>,
}

// ===== Method =====

/// Scan the method and its trailing SP.
///
/// The first byte selects the candidate methods, each candidate is then compared with its
/// `"METHOD "` token.
pub fn parse_method(buf: &mut LineBuffer) -> ParseResult<Method, Reject> {
    let Some(&first) = buf.buffered().first() else {
        return ParseResult::Pending;
    };

    let mut partial = false;

    for &method in Method::candidates(first) {
        let token = method.token();
        if buf.matches(token) {
            return ParseResult::Ok(method);
        }
        let bytes = buf.buffered();
        if bytes.len() < token.len() && token.starts_with(bytes) {
            partial = true;
        }
    }

    if partial && !buf.is_exhausted() {
        ParseResult::Pending
    } else {
        err!(InvalidMethod)
    }
}

// ===== Target =====

/// Scan the request target, the optional query and the trailing SP.
///
/// Only origin form is accepted.
pub fn parse_target(buf: &mut LineBuffer) -> ParseResult<Target, Reject> {
    let bytes = buf.buffered();

    match bytes.first() {
        Some(b'/') => {}
        Some(_) => return err!(InvalidTarget),
        None => return ParseResult::Pending,
    }

    let path_len = match scan_target(bytes, true) {
        Some(Ok(len)) => len,
        Some(Err(reject)) => return ParseResult::Err(reject),
        None => return pending(buf),
    };

    let query_len = if bytes[path_len] == b'?' {
        match scan_target(&bytes[path_len + 1..], false) {
            Some(Ok(len)) => Some(len),
            Some(Err(reject)) => return ParseResult::Err(reject),
            None => return pending(buf),
        }
    } else {
        None
    };

    let path = buf.take(path_len);
    let query = query_len.map(|len| {
        buf.advance(1);
        buf.take(len)
    });

    // trailing SP
    buf.advance(1);

    ParseResult::Ok(Target { path, query })
}

/// Returns the length of the target component, up to SP, or up to `?` when `path` is `true`.
///
/// Returns `None` if the delimiter is not buffered yet.
fn scan_target(bytes: &[u8], path: bool) -> Option<Result<usize, Reject>> {
    for (i, &byte) in bytes.iter().enumerate() {
        if byte == b' ' || (path && byte == b'?') {
            return Some(Ok(i));
        }
        if !matches::is_target(byte) {
            return Some(Err(Reject::BadRequest(BadRequestReason::InvalidTarget)));
        }
    }
    None
}

/// More bytes are required, unless the request line already fills the whole buffer.
fn pending<T>(buf: &LineBuffer) -> ParseResult<T, Reject> {
    if buf.is_exhausted() {
        err!(UriTooLong)
    } else {
        ParseResult::Pending
    }
}

// ===== Version =====

/// Scan `HTTP/` DIGIT `.` DIGIT and the line terminator.
///
/// The digits are not judged, any major and minor version is returned.
pub fn parse_version(buf: &mut LineBuffer) -> ParseResult<Version, Reject> {
    let bytes = buf.buffered();

    for (i, &byte) in bytes.iter().take(VERSION_SIZE).enumerate() {
        let valid = match i {
            0..5 => byte == VERSION_PREFIX[i],
            5 | 7 => byte.is_ascii_digit(),
            _ => byte == b'.',
        };
        if !valid {
            return err!(InvalidProtocol);
        }
    }

    let Some((version, rest)) = bytes.split_first_chunk::<VERSION_SIZE>() else {
        return pending(buf);
    };
    let version = Version::from_ascii_digits(version[5], version[7]);

    match rest {
        [b'\n', ..] | [b'\r', b'\n', ..] => {}
        [] | [b'\r'] => return pending(buf),
        _ => return err!(InvalidRequestLineTerminator),
    }

    buf.advance(VERSION_SIZE);
    let located = buf.find_line().is_some();
    debug_assert!(located);
    if !buf.consume_if_end_of_line() {
        return err!(InvalidRequestLineTerminator);
    }

    ParseResult::Ok(version)
}
