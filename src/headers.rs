//! Recognized request headers.
use crate::io::Span;
use crate::parser::{BadRequestReason, Reject};

macro_rules! standard_headers {
    (
        $(
            $(#[$doc:meta])*
            $id:ident = $name:literal;
        )*
    ) => {
        /// Header names stored by [`HeaderMap`].
        ///
        /// Other header names are validated and skipped.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum StandardHeader {
            $(
                $(#[$doc])*
                $id,
            )*
        }

        impl StandardHeader {
            /// Returns the canonical header name, e.g: `"Content-Length"`.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(
                        Self::$id => $name,
                    )*
                }
            }

            /// Returns the header name followed by colon, e.g: `b"Host:"`.
            pub const fn token(&self) -> &'static [u8] {
                match self {
                    $(
                        Self::$id => concat!($name, ":").as_bytes(),
                    )*
                }
            }
        }
    };
}

standard_headers! {
    /// `Accept-Encoding`
    AcceptEncoding = "Accept-Encoding";
    /// `Connection`
    Connection = "Connection";
    /// `Content-Length`
    ContentLength = "Content-Length";
    /// `Content-Type`
    ContentType = "Content-Type";
    /// `Cookie`
    Cookie = "Cookie";
    /// `Date`
    Date = "Date";
    /// `From`
    From = "From";
    /// `Host`
    Host = "Host";
    /// `Transfer-Encoding`
    TransferEncoding = "Transfer-Encoding";
    /// `User-Agent`
    UserAgent = "User-Agent";
}

impl StandardHeader {
    /// Returns the headers whose name starts with `first`, ignoring ASCII case.
    pub const fn candidates(first: u8) -> &'static [StandardHeader] {
        use StandardHeader::*;
        match first.to_ascii_lowercase() {
            b'a' => &[AcceptEncoding],
            b'c' => &[Connection, ContentLength, ContentType, Cookie],
            b'd' => &[Date],
            b'f' => &[From],
            b'h' => &[Host],
            b't' => &[TransferEncoding],
            b'u' => &[UserAgent],
            _ => &[],
        }
    }

    /// Returns `true` if the header must not be repeated.
    #[inline]
    pub const fn is_singleton(&self) -> bool {
        matches!(self, Self::Host | Self::ContentLength)
    }
}

impl std::fmt::Display for StandardHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ===== HeaderMap =====

/// Recognized header values of one request.
///
/// Values are spans into the connection buffer, in the order they appear. Repeated headers keep
/// every value, except for [singleton] headers which are rejected.
///
/// [singleton]: StandardHeader::is_singleton
#[derive(Debug, Default)]
pub struct HeaderMap {
    entries: Vec<(StandardHeader, Span)>,
}

impl HeaderMap {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored values.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store a header value.
    ///
    /// # Errors
    ///
    /// Returns [`BadRequestReason::DuplicateHeader`] if a singleton header is repeated.
    pub fn insert(&mut self, header: StandardHeader, value: Span) -> Result<(), Reject> {
        if header.is_singleton() && self.contains(header) {
            return Err(Reject::BadRequest(BadRequestReason::DuplicateHeader));
        }
        self.entries.push((header, value));
        Ok(())
    }

    #[inline]
    pub fn contains(&self, header: StandardHeader) -> bool {
        self.entries.iter().any(|(name, _)| *name == header)
    }

    /// Returns the first value of `header`.
    pub fn get(&self, header: StandardHeader) -> Option<Span> {
        self.entries
            .iter()
            .find(|(name, _)| *name == header)
            .map(|&(_, value)| value)
    }

    /// Returns every value of `header` in order.
    pub fn get_all(&self, header: StandardHeader) -> impl Iterator<Item = Span> + '_ {
        self.entries
            .iter()
            .filter(move |(name, _)| *name == header)
            .map(|&(_, value)| value)
    }

    /// Returns every stored header in order.
    pub fn iter(&self) -> impl Iterator<Item = (StandardHeader, Span)> + '_ {
        self.entries.iter().copied()
    }

    /// Remove all values, keeping the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
