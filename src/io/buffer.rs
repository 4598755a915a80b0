use std::io::{self, Read};

use super::Span;
use crate::config::{Config, HARD_MAX_BUFFER_SIZE, MIN_BUFFER_SIZE};
use crate::log::debug;

/// Returns the smallest power of two greater than or equal to `size`, capped at `max`.
///
/// A `size` that is already a power of two is returned unchanged, `0` yields `1`. `max` is
/// expected to be a power of two.
#[inline]
pub const fn power_of_two(size: usize, max: usize) -> usize {
    match size.checked_next_power_of_two() {
        Some(pow) if pow < max => pow,
        _ => max,
    }
}

/// Outcome of a single [`LineBuffer::fill`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    /// `n` bytes were appended.
    Read(usize),
    /// The source reached end of stream.
    Eof,
    /// Buffer is full at its maximum size, no read was attempted.
    Full,
}

/// Growable line oriented read buffer.
///
/// The buffer owns a byte array whose length is always a power of two, never larger than the
/// maximum given at construction. Bytes are appended at `limit` by reads from a source passed by
/// the caller, and consumed from `index` by the scanners.
///
/// ```text
///  0        index         line_limit   scan      limit      len
///  |  read  |  unread line  |  LF  |  unread  |  free  |
/// ```
///
/// `line_limit` is the position of the last located LF and `scan` is the first byte not yet
/// examined for LF, line scanning never examines a byte twice.
pub struct LineBuffer {
    buffer: Box<[u8]>,
    index: usize,
    limit: usize,
    line_limit: usize,
    scan: usize,
    max: usize,
    epoch: u32,
}

impl LineBuffer {
    /// Create buffer with `initial` capacity that grows up to `max` bytes.
    ///
    /// Both sizes are rounded up to a power of two, `max` is kept within [`MIN_BUFFER_SIZE`] and
    /// [`HARD_MAX_BUFFER_SIZE`].
    pub fn new(initial: usize, max: usize) -> LineBuffer {
        let max = power_of_two(max.max(MIN_BUFFER_SIZE), HARD_MAX_BUFFER_SIZE);
        let capacity = power_of_two(initial, max);
        LineBuffer {
            buffer: vec![0; capacity].into_boxed_slice(),
            index: 0,
            limit: 0,
            line_limit: 0,
            scan: 0,
            max,
            epoch: 0,
        }
    }

    /// Create buffer with sizes from [`Config`].
    #[inline]
    pub fn from_config(config: &Config) -> LineBuffer {
        LineBuffer::new(config.initial_buffer_size, config.max_buffer_size)
    }

    // ===== Accessors =====

    /// Current allocated size.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Maximum size the buffer may grow to.
    #[inline]
    pub fn max(&self) -> usize {
        self.max
    }

    /// Position of the next unread byte.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// End of the filled region.
    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Position of the last located LF.
    #[inline]
    pub fn line_limit(&self) -> usize {
        self.line_limit
    }

    /// Returns the buffered but unread bytes.
    #[inline]
    pub fn buffered(&self) -> &[u8] {
        &self.buffer[self.index..self.limit]
    }

    /// Returns `true` if there is no unread byte.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index == self.limit
    }

    /// Returns `true` if the buffer is full and can not grow any further.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.limit == self.buffer.len() && self.buffer.len() == self.max
    }

    /// Resolve a span into bytes.
    ///
    /// The span must have been taken since the last compaction or reset.
    #[inline]
    pub fn slice(&self, span: Span) -> &[u8] {
        debug_assert_eq!(span.epoch(), self.epoch, "span resolved after compact or reset");
        &self.buffer[span.start()..span.end()]
    }

    /// Create span `[start, end)` in the current epoch.
    #[inline]
    pub(crate) fn span(&self, start: usize, end: usize) -> Span {
        debug_assert!(end <= self.limit);
        Span::new(start, end, self.epoch)
    }

    /// Consume `n` unread bytes.
    #[inline]
    pub(crate) fn advance(&mut self, n: usize) {
        debug_assert!(self.index + n <= self.limit);
        self.index += n;
    }

    /// Consume `n` unread bytes, returning them as span.
    #[inline]
    pub(crate) fn take(&mut self, n: usize) -> Span {
        let span = self.span(self.index, self.index + n);
        self.advance(n);
        span
    }

    // ===== Reading =====

    /// Perform exactly one read from `src` into the free region.
    ///
    /// The buffer is doubled when it is full and below its maximum.
    ///
    /// # Errors
    ///
    /// Returns error from the underlying source, [`io::ErrorKind::Interrupted`] is retried.
    pub fn fill<R: Read + ?Sized>(&mut self, src: &mut R) -> io::Result<Fill> {
        if self.limit == self.buffer.len() {
            if self.buffer.len() == self.max {
                return Ok(Fill::Full);
            }
            self.grow(self.buffer.len() + 1);
        }

        loop {
            match src.read(&mut self.buffer[self.limit..]) {
                Ok(0) => return Ok(Fill::Eof),
                Ok(read) => {
                    self.limit += read;
                    return Ok(Fill::Read(read));
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }

    /// Locate the next line in already buffered bytes.
    ///
    /// Returns span `[index, line_limit)`, where `line_limit` is the position of the LF. The span
    /// includes the CR if present, use [`consume_if_end_of_line`] to consume the terminator.
    ///
    /// [`consume_if_end_of_line`]: LineBuffer::consume_if_end_of_line
    pub fn find_line(&mut self) -> Option<Span> {
        let start = self.scan.max(self.index);
        match self.buffer[start..self.limit].iter().position(|&b| b == b'\n') {
            Some(offset) => {
                let lf = start + offset;
                self.line_limit = lf;
                // the LF itself is re-examined, so a located line can be requested again
                self.scan = lf;
                Some(self.span(self.index, lf))
            }
            None => {
                self.scan = self.limit;
                None
            }
        }
    }

    /// Read from `src` until a line is buffered.
    ///
    /// # Errors
    ///
    /// Returns [`LineError::Overflow`] if the buffer is exhausted without a line,
    /// [`LineError::Eof`] if the source ends first, or [`LineError::Io`] on transport failure.
    pub fn parse_line<R: Read + ?Sized>(&mut self, src: &mut R) -> Result<Span, LineError> {
        loop {
            if let Some(line) = self.find_line() {
                return Ok(line);
            }
            match self.fill(src)? {
                Fill::Read(_) => {}
                Fill::Eof => return Err(LineError::Eof),
                Fill::Full => return Err(LineError::Overflow),
            }
        }
    }

    /// Ensure at least `n` bytes are buffered starting at `index`.
    ///
    /// The buffer grows to hold `index + n` bytes, reads are issued until enough bytes are
    /// available. Returns the number of unread bytes buffered.
    ///
    /// # Errors
    ///
    /// Returns [`LineError::Overflow`] if `index + n` exceeds the maximum size,
    /// [`LineError::Eof`] if the source ends first, or [`LineError::Io`] on transport failure.
    pub fn read<R: Read + ?Sized>(&mut self, src: &mut R, n: usize) -> Result<usize, LineError> {
        let required = self.index.checked_add(n).ok_or(LineError::Overflow)?;
        if required > self.max {
            return Err(LineError::Overflow);
        }
        if required > self.buffer.len() {
            self.grow(required);
        }

        while self.limit - self.index < n {
            match self.fill(src)? {
                Fill::Read(_) => {}
                Fill::Eof => return Err(LineError::Eof),
                Fill::Full => return Err(LineError::Overflow),
            }
        }

        Ok(self.limit - self.index)
    }

    fn grow(&mut self, min: usize) {
        let size = power_of_two(min, self.max);
        debug_assert!(size >= min && size > self.buffer.len());

        let mut buffer = vec![0; size].into_boxed_slice();
        buffer[..self.limit].copy_from_slice(&self.buffer[..self.limit]);
        self.buffer = buffer;

        debug!("line buffer grow to {size}");
    }

    // ===== Matching =====

    /// Consume `literal` if the unread bytes start with it.
    #[inline]
    pub fn matches(&mut self, literal: &[u8]) -> bool {
        let matched = self.buffered().starts_with(literal);
        if matched {
            self.index += literal.len();
        }
        matched
    }

    /// Consume `literal` if the unread bytes start with it, ignoring ASCII case.
    pub fn matches_ignore_case(&mut self, literal: &[u8]) -> bool {
        let matched = match self.buffered().get(..literal.len()) {
            Some(bytes) => bytes.eq_ignore_ascii_case(literal),
            None => false,
        };
        if matched {
            self.index += literal.len();
        }
        matched
    }

    /// Returns the position of the first `needle` in the unread bytes.
    #[inline]
    pub fn index_of(&self, needle: u8) -> Option<usize> {
        self.buffered()
            .iter()
            .position(|&b| b == needle)
            .map(|offset| self.index + offset)
    }

    /// Consume a LF or CRLF that ends exactly at `line_limit`.
    ///
    /// Returns `false` without consuming anything otherwise.
    pub fn consume_if_end_of_line(&mut self) -> bool {
        if self.line_limit >= self.limit || self.buffer[self.line_limit] != b'\n' {
            return false;
        }
        let consumed = match self.line_limit.checked_sub(self.index) {
            Some(0) => 1,
            Some(1) if self.buffer[self.index] == b'\r' => 2,
            _ => return false,
        };
        self.index += consumed;
        true
    }

    /// Consume an empty line, a LF or CRLF right at `index`.
    ///
    /// Returns `false` without consuming anything otherwise.
    pub fn consume_if_empty_line(&mut self) -> bool {
        let consumed = match self.buffered() {
            [b'\n', ..] => 1,
            [b'\r', b'\n', ..] => 2,
            _ => return false,
        };
        self.index += consumed;
        true
    }

    // ===== Lifecycle =====

    /// Move the unread bytes to the start of the buffer.
    ///
    /// All previously taken spans are invalidated.
    pub fn compact(&mut self) {
        if self.index == 0 {
            return;
        }
        let shift = self.index;
        self.buffer.copy_within(shift..self.limit, 0);
        self.limit -= shift;
        self.scan = self.scan.saturating_sub(shift);
        self.line_limit = match self.line_limit.checked_sub(shift) {
            Some(line_limit) => line_limit,
            // already consumed line, points past the filled region
            None => self.limit,
        };
        self.index = 0;
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Discard all content, keeping the allocation.
    ///
    /// All previously taken spans are invalidated.
    pub fn reset(&mut self) {
        self.index = 0;
        self.limit = 0;
        self.line_limit = 0;
        self.scan = 0;
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Returns a display adapter for debug logging.
    ///
    /// Shows the bytes around the read position, starting up to 64 bytes behind it, at most 256
    /// bytes in total.
    #[inline]
    pub fn hex_dump(&self) -> HexDump<'_> {
        let start = self.index.saturating_sub(HEX_DUMP_BEHIND) & !0xf;
        let end = self.limit.min(start + HEX_DUMP_WINDOW);
        HexDump { offset: start, bytes: &self.buffer[start..end] }
    }
}

impl std::fmt::Debug for LineBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("LineBuffer")
            .field("capacity", &self.buffer.len())
            .field("index", &self.index)
            .field("limit", &self.limit)
            .field("line_limit", &self.line_limit)
            .field("max", &self.max)
            .finish()
    }
}

// ===== HexDump =====

const HEX_DUMP_BEHIND: usize = 64;

const HEX_DUMP_WINDOW: usize = 256;

/// Hex dump of buffered bytes, 16 bytes per line.
///
/// ```text
/// 00000000  47 45 54 20 2f 20 48 54  54 50 2f 31 2e 31 0d 0a  |GET / HTTP/1.1..|
/// ```
pub struct HexDump<'a> {
    offset: usize,
    bytes: &'a [u8],
}

impl std::fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for (i, line) in self.bytes.chunks(16).enumerate() {
            if i != 0 {
                f.write_str("\n")?;
            }
            write!(f, "{:08x} ", self.offset + i * 16)?;
            for col in 0..16 {
                if col == 8 {
                    f.write_str(" ")?;
                }
                match line.get(col) {
                    Some(byte) => write!(f, " {byte:02x}")?,
                    None => f.write_str("   ")?,
                }
            }
            f.write_str("  |")?;
            for &byte in line {
                let ch = if byte.is_ascii_graphic() || byte == b' ' { byte as char } else { '.' };
                write!(f, "{ch}")?;
            }
            f.write_str("|")?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for HexDump<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

// ===== Error =====

/// Blocking [`LineBuffer`] operation error.
#[derive(Debug)]
pub enum LineError {
    /// Buffer can not grow to hold the requested bytes.
    Overflow,
    /// Source reached end of stream before the requested bytes.
    Eof,
    /// Transport error.
    Io(io::Error),
}

impl From<io::Error> for LineError {
    #[inline]
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl std::error::Error for LineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for LineError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Overflow => f.write_str("buffer exceeded maximum size"),
            Self::Eof => f.write_str("unexpected end of stream"),
            Self::Io(err) => write!(f, "io error: {err}"),
        }
    }
}
