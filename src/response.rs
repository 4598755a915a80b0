//! HTTP Response
use bytes::BytesMut;
use std::io::{self, Write};

use crate::chunked::ChunkedWriter;
use crate::http::{Status, Version, httpdate_now};
use crate::matches;

const CRLF: &[u8] = b"\r\n";

/// Body framing of the response head.
#[derive(Debug, Clone, Copy)]
enum Framing {
    Length(usize),
    Chunked,
    /// body is delimited by closing the connection
    Close,
}

/// HTTP Response writer.
///
/// The response head is assembled in memory and written together with the body by one of the
/// `send` methods. A response can only be sent once.
///
/// `Date`, `Content-Length`, `Transfer-Encoding` and `Connection` are written by the response
/// itself.
pub struct Response<'a> {
    io: &'a mut dyn Write,
    status: Status,
    headers: BytesMut,
    version: Version,
    head: bool,
    keep_alive: bool,
    chunk_size: usize,
    invalid_header: bool,
    sent: bool,
}

impl<'a> Response<'a> {
    /// Create response for a request with the given `version`.
    ///
    /// When `head` is `true` the body is never written.
    pub(crate) fn new(
        io: &'a mut dyn Write,
        version: Version,
        head: bool,
        keep_alive: bool,
        chunk_size: usize,
    ) -> Self {
        Self {
            io,
            status: Status::OK,
            headers: BytesMut::new(),
            version,
            head,
            keep_alive,
            chunk_size,
            invalid_header: false,
            sent: false,
        }
    }

    /// Set the response status.
    #[inline]
    pub fn status(&mut self, status: Status) -> &mut Self {
        self.status = status;
        self
    }

    /// Append a header field.
    ///
    /// An invalid name or value makes the following `send` fail with
    /// [`io::ErrorKind::InvalidInput`].
    pub fn header(&mut self, name: &str, value: impl AsRef<[u8]>) -> &mut Self {
        let value = value.as_ref();
        let valid = !name.is_empty()
            && name.bytes().all(matches::is_token)
            && value.iter().all(|&b| matches::is_field_value(b));
        if !valid {
            self.invalid_header = true;
            return self;
        }

        self.headers.extend_from_slice(name.as_bytes());
        self.headers.extend_from_slice(b": ");
        self.headers.extend_from_slice(value);
        self.headers.extend_from_slice(CRLF);
        self
    }

    /// Close the connection after this response.
    #[inline]
    pub fn close(&mut self) -> &mut Self {
        self.keep_alive = false;
        self
    }

    /// Returns `true` if the connection persists after this response.
    #[inline]
    pub fn is_keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// Returns `true` if the response was sent.
    #[inline]
    pub fn is_sent(&self) -> bool {
        self.sent
    }

    fn has_body(&self) -> bool {
        !self.head && !self.status.is_bodyless()
    }

    fn write_head(&mut self, framing: Framing) -> io::Result<()> {
        if self.sent {
            return Err(io::Error::other("response already sent"));
        }
        if self.invalid_header {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "invalid response header"));
        }
        self.sent = true;

        let mut head = BytesMut::with_capacity(128 + self.headers.len());
        head.extend_from_slice(b"HTTP/1.1 ");
        head.extend_from_slice(self.status.as_str().as_bytes());
        head.extend_from_slice(CRLF);

        head.extend_from_slice(b"Date: ");
        head.extend_from_slice(&httpdate_now());
        head.extend_from_slice(CRLF);

        head.extend_from_slice(&self.headers);

        if !self.status.is_bodyless() {
            match framing {
                Framing::Length(len) => {
                    head.extend_from_slice(b"Content-Length: ");
                    head.extend_from_slice(itoa::Buffer::new().format(len).as_bytes());
                    head.extend_from_slice(CRLF);
                }
                Framing::Chunked => head.extend_from_slice(b"Transfer-Encoding: chunked\r\n"),
                Framing::Close => {}
            }
        }

        if !self.keep_alive {
            head.extend_from_slice(b"Connection: close\r\n");
        } else if !self.version.is_persistent_by_default() {
            head.extend_from_slice(b"Connection: keep-alive\r\n");
        }

        head.extend_from_slice(CRLF);
        self.io.write_all(&head)
    }

    /// Send the response with a fixed length body.
    ///
    /// # Errors
    ///
    /// Returns error if the response was already sent, a header is invalid, or from the
    /// transport.
    pub fn send(&mut self, body: &[u8]) -> io::Result<()> {
        self.write_head(Framing::Length(body.len()))?;
        if self.has_body() {
            self.io.write_all(body)?;
        }
        self.io.flush()
    }

    /// Send the response without body.
    ///
    /// # Errors
    ///
    /// See [`send`][Response::send].
    #[inline]
    pub fn send_empty(&mut self) -> io::Result<()> {
        self.send(&[])
    }

    /// Send the response with a streamed body.
    ///
    /// `producer` appends the body to a [`ChunkedWriter`]. Peers before HTTP/1.1 do not
    /// understand chunked coding, for those the body is written as is and the connection is
    /// closed afterwards.
    ///
    /// # Errors
    ///
    /// See [`send`][Response::send], also returns error from `producer`.
    pub fn send_chunked<F>(&mut self, producer: F) -> io::Result<()>
    where
        F: FnOnce(&mut ChunkedWriter<&mut dyn Write>) -> io::Result<()>,
    {
        let chunked = self.version.is_persistent_by_default();
        if chunked {
            self.write_head(Framing::Chunked)?;
        } else {
            self.keep_alive = false;
            self.write_head(Framing::Close)?;
        }

        if !self.has_body() {
            return self.io.flush();
        }

        let sink: &mut dyn Write = &mut *self.io;
        let mut writer = if chunked {
            ChunkedWriter::new(sink, self.chunk_size)
        } else {
            ChunkedWriter::identity(sink, self.chunk_size)
        };
        writer.write(producer)
    }
}

impl std::fmt::Debug for Response<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("keep_alive", &self.keep_alive)
            .field("sent", &self.sent)
            .finish_non_exhaustive()
    }
}
