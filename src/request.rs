//! HTTP Request
use crate::headers::{HeaderMap, StandardHeader};
use crate::http::{Method, Version};
use crate::io::LineBuffer;

/// Borrowed view of a parsed request.
///
/// Every byte slice points into the connection buffer, no request data is copied. The view is
/// only available while the request is being processed.
#[derive(Debug)]
pub struct Request<'a> {
    method: Method,
    version: Version,
    path: &'a [u8],
    query: Option<&'a [u8]>,
    headers: &'a HeaderMap,
    buffer: &'a LineBuffer,
    body: &'a [u8],
}

impl<'a> Request<'a> {
    pub(crate) fn new(
        method: Method,
        version: Version,
        path: &'a [u8],
        query: Option<&'a [u8]>,
        headers: &'a HeaderMap,
        buffer: &'a LineBuffer,
        body: &'a [u8],
    ) -> Self {
        Self { method, version, path, query, headers, buffer, body }
    }

    #[inline]
    pub fn method(&self) -> Method {
        self.method
    }

    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns the request path, e.g: `b"/search"`.
    #[inline]
    pub fn path(&self) -> &'a [u8] {
        self.path
    }

    /// Returns the request path as string, if it is valid UTF-8.
    #[inline]
    pub fn path_str(&self) -> Option<&'a str> {
        std::str::from_utf8(self.path).ok()
    }

    /// Returns the raw query string, without the leading `?`.
    #[inline]
    pub fn query(&self) -> Option<&'a [u8]> {
        self.query
    }

    /// Returns an iterator over `name=value` pairs of the query string.
    ///
    /// Pairs are not percent-decoded. A pair without `=` yields an empty value.
    #[inline]
    pub fn query_pairs(&self) -> QueryPairs<'a> {
        QueryPairs {
            query: self.query.unwrap_or_default(),
        }
    }

    /// Returns the first value of `header`.
    pub fn header(&self, header: StandardHeader) -> Option<&'a [u8]> {
        let buffer = self.buffer;
        self.headers.get(header).map(|span| buffer.slice(span))
    }

    /// Returns every value of `header` in order.
    pub fn header_all(&self, header: StandardHeader) -> impl Iterator<Item = &'a [u8]> + 'a {
        let buffer = self.buffer;
        self.headers.get_all(header).map(move |span| buffer.slice(span))
    }

    /// Returns every recognized header in order.
    pub fn headers(&self) -> impl Iterator<Item = (StandardHeader, &'a [u8])> + 'a {
        let buffer = self.buffer;
        self.headers.iter().map(move |(name, span)| (name, buffer.slice(span)))
    }

    /// Returns the request body, empty when the request has none.
    #[inline]
    pub fn body(&self) -> &'a [u8] {
        self.body
    }

    /// Returns `true` if the client asked to keep the connection open.
    ///
    /// HTTP/1.1 persists unless `Connection: close` is given, HTTP/1.0 closes unless
    /// `Connection: keep-alive` is given.
    ///
    /// [httpwg](https://httpwg.org/specs/rfc9112.html#persistent.connections)
    pub fn is_keep_alive(&self) -> bool {
        let mut keep_alive = self.version.is_persistent_by_default();
        for value in self.header_all(StandardHeader::Connection) {
            for option in value.split(|&b| b == b',') {
                let option = option.trim_ascii();
                if option.eq_ignore_ascii_case(b"close") {
                    return false;
                }
                if option.eq_ignore_ascii_case(b"keep-alive") {
                    keep_alive = true;
                }
            }
        }
        keep_alive
    }
}

/// Parse a `Content-Length` value.
///
/// [httpwg](https://httpwg.org/specs/rfc9110.html#field.content-length)
pub(crate) fn parse_content_length(value: &[u8]) -> Option<u64> {
    if value.is_empty() {
        return None;
    }
    value.iter().try_fold(0u64, |acc, &b| {
        if !b.is_ascii_digit() {
            return None;
        }
        acc.checked_mul(10)?.checked_add((b - b'0') as u64)
    })
}

// ===== QueryPairs =====

/// Iterator over query string pairs, see [`Request::query_pairs`].
#[derive(Debug, Clone)]
pub struct QueryPairs<'a> {
    query: &'a [u8],
}

impl<'a> Iterator for QueryPairs<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.query.is_empty() {
                return None;
            }

            let pair = match self.query.iter().position(|&b| b == b'&') {
                Some(amp) => {
                    let (pair, rest) = self.query.split_at(amp);
                    self.query = &rest[1..];
                    pair
                }
                None => std::mem::take(&mut self.query),
            };

            if pair.is_empty() {
                continue;
            }

            return Some(match pair.iter().position(|&b| b == b'=') {
                Some(eq) => (&pair[..eq], &pair[eq + 1..]),
                None => (pair, &pair[pair.len()..]),
            });
        }
    }
}
