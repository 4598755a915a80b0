/// Zero-copy view into a [`LineBuffer`].
///
/// A span is only a pair of offsets, the bytes are resolved with [`LineBuffer::slice`]. Spans are
/// invalidated by [`LineBuffer::compact`] and [`LineBuffer::reset`], resolving an invalidated span
/// is a logic error and is caught by debug assertion.
///
/// [`LineBuffer`]: super::LineBuffer
/// [`LineBuffer::slice`]: super::LineBuffer::slice
/// [`LineBuffer::compact`]: super::LineBuffer::compact
/// [`LineBuffer::reset`]: super::LineBuffer::reset
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    start: usize,
    end: usize,
    epoch: u32,
}

impl Span {
    #[inline]
    pub(crate) const fn new(start: usize, end: usize, epoch: u32) -> Span {
        debug_assert!(start <= end);
        Span { start, end, epoch }
    }

    /// Offset of the first byte.
    #[inline]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// Offset past the last byte.
    #[inline]
    pub const fn end(&self) -> usize {
        self.end
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[inline]
    pub(crate) const fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Returns span with `n` bytes removed from the front.
    #[inline]
    pub(crate) const fn trim_start(self, n: usize) -> Span {
        debug_assert!(n <= self.len());
        Span { start: self.start + n, ..self }
    }

    /// Returns span with `n` bytes removed from the back.
    #[inline]
    pub(crate) const fn trim_end(self, n: usize) -> Span {
        debug_assert!(n <= self.len());
        Span { end: self.end - n, ..self }
    }
}

impl std::fmt::Debug for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Span({}..{})", self.start, self.end)
    }
}
