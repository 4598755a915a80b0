//! Request / response exchange over a blocking stream.
//!
//! [`Exchange`] is a resumable state machine. Every step consumes buffered bytes with the
//! [scanners], when they are not sufficient the machine moves to [`State::SocketRead`] carrying
//! the stage to resume in, performs exactly one read, then continues where it stopped.
//!
//! ```text
//! Start -> SocketRead(Method) -> RequestMethod -> RequestTarget -> RequestVersion
//!       -> RequestHeader <-> RequestHeaderName -> RequestHeaderValue
//!       -> [RequestBody] -> Process -> Start | Close -> Stop
//! ```
//!
//! [scanners]: crate::parser
use std::io::{self, Read, Write};

use crate::common::ParseResult;
use crate::config::Config;
use crate::headers::{HeaderMap, StandardHeader};
use crate::http::{Method, Status, Version};
use crate::io::{Fill, LineBuffer, LineError, Span};
use crate::log::{debug, error, warning};
use crate::parser::{
    BadRequestReason, HeaderLine, Reject, Target, parse_header_line, parse_header_name,
    parse_header_value, parse_method, parse_target, parse_version,
};
use crate::request::{Request, parse_content_length};
use crate::response::Response;
use crate::service::Service;

mod state;

pub use state::{Parse, State};

/// Outcome of a rejected exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeResult {
    /// Status answered to the client.
    pub status: Status,
    /// Why the exchange was rejected.
    pub cause: Reject,
}

impl ExchangeResult {
    #[inline]
    pub const fn new(cause: Reject) -> Self {
        Self {
            status: cause.status(),
            cause,
        }
    }

    /// Returns the bad request reason, if any.
    #[inline]
    pub const fn reason(&self) -> Option<BadRequestReason> {
        self.cause.reason()
    }
}

impl std::fmt::Display for ExchangeResult {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} ({})", self.status, self.cause)
    }
}

// ===== Exchange =====

/// HTTP/1.1 connection state machine.
///
/// One exchange serves every request of a connection, the buffer is reused between keep-alive
/// requests.
pub struct Exchange<IO, S> {
    io: IO,
    buffer: LineBuffer,
    service: S,
    config: Config,

    // request
    method: Option<Method>,
    target: Option<Target>,
    version: Option<Version>,
    headers: HeaderMap,
    content_length: usize,
    body: Option<Span>,

    result: Option<ExchangeResult>,
    error: Option<io::Error>,
    requests: usize,
}

impl<IO, S> Exchange<IO, S>
where
    IO: Read + Write,
    S: Service,
{
    /// Create exchange over `io`.
    ///
    /// The buffer is allocated with the sizes from `config`.
    pub fn new(io: IO, service: S, config: &Config) -> Self {
        Self {
            io,
            buffer: LineBuffer::from_config(config),
            service,
            config: config.clone(),
            method: None,
            target: None,
            version: None,
            headers: HeaderMap::new(),
            content_length: 0,
            body: None,
            result: None,
            error: None,
            requests: 0,
        }
    }

    /// Run the exchange until the connection is closed.
    ///
    /// Rejections are answered through [`Service::reject`], see [`result`] and [`error`] for
    /// how the exchange ended.
    ///
    /// [`result`]: Exchange::result
    /// [`error`]: Exchange::error
    pub fn run(&mut self) {
        let mut state = State::Start;
        while state != State::Stop {
            state = self.step(state);
        }
    }

    /// Perform one transition.
    pub fn step(&mut self, state: State) -> State {
        debug!("{state:?}");
        match state {
            State::Start => self.start(),
            State::SocketRead(parse) => self.socket_read(parse),
            State::RequestMethod => self.request_method(),
            State::RequestTarget => self.request_target(),
            State::RequestVersion => self.request_version(),
            State::RequestHeader => self.request_header(),
            State::RequestHeaderName => self.request_header_name(),
            State::RequestHeaderValue(name) => self.request_header_value(name),
            State::RequestBody => self.request_body(),
            State::Process => self.process(),
            State::Close => self.close(),
            State::Stop => State::Stop,
        }
    }

    // ===== Accessors =====

    /// Returns the rejection of the exchange, if any.
    #[inline]
    pub fn result(&self) -> Option<&ExchangeResult> {
        self.result.as_ref()
    }

    /// Returns the transport or service error that closed the connection, if any.
    #[inline]
    pub fn error(&self) -> Option<&io::Error> {
        self.error.as_ref()
    }

    /// Take the error that closed the connection, if any.
    #[inline]
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    /// Number of requests handed to the service.
    #[inline]
    pub fn requests(&self) -> usize {
        self.requests
    }

    #[inline]
    pub fn buffer(&self) -> &LineBuffer {
        &self.buffer
    }

    /// Method of the current request, once scanned.
    #[inline]
    pub fn method(&self) -> Option<Method> {
        self.method
    }

    /// Path of the current request, once scanned.
    pub fn target(&self) -> Option<&[u8]> {
        self.target.map(|target| self.buffer.slice(target.path))
    }

    /// Query of the current request, once scanned.
    pub fn query(&self) -> Option<&[u8]> {
        let query = self.target?.query?;
        Some(self.buffer.slice(query))
    }

    #[inline]
    pub fn version(&self) -> Option<Version> {
        self.version
    }

    /// Returns the first value of `header` in the current request.
    pub fn header(&self, header: StandardHeader) -> Option<&[u8]> {
        self.headers.get(header).map(|span| self.buffer.slice(span))
    }

    /// Body of the current request, once read.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.map(|span| self.buffer.slice(span))
    }

    /// Returns the underlying stream.
    #[inline]
    pub fn into_inner(self) -> IO {
        self.io
    }

    // ===== Steps =====

    fn start(&mut self) -> State {
        self.method = None;
        self.target = None;
        self.version = None;
        self.headers.clear();
        self.content_length = 0;
        self.body = None;

        if self.buffer.is_empty() {
            return State::SocketRead(Parse::Method);
        }

        // pipelined request
        self.buffer.compact();
        State::RequestMethod
    }

    fn socket_read(&mut self, parse: Parse) -> State {
        if parse == Parse::Method && self.buffer.index() > 0 {
            self.buffer.compact();
        }

        match self.buffer.fill(&mut self.io) {
            Ok(Fill::Read(read)) => {
                debug!("read {read} bytes");
                parse.resume()
            }
            Ok(Fill::Full) => parse.resume(),
            Ok(Fill::Eof) => {
                if parse == Parse::Method && self.buffer.is_empty() {
                    debug!("connection closed by peer");
                } else {
                    debug!("unexpected end of stream");
                }
                State::Close
            }
            Err(err) => {
                error!("read error: {err}");
                self.error = Some(err);
                State::Close
            }
        }
    }

    fn request_method(&mut self) -> State {
        match parse_method(&mut self.buffer) {
            ParseResult::Ok(method) => {
                self.method = Some(method);
                State::RequestTarget
            }
            ParseResult::Pending => State::SocketRead(Parse::Method),
            ParseResult::Err(reject) => self.reject(reject),
        }
    }

    fn request_target(&mut self) -> State {
        match parse_target(&mut self.buffer) {
            ParseResult::Ok(target) => {
                self.target = Some(target);
                State::RequestVersion
            }
            ParseResult::Pending => State::SocketRead(Parse::Target),
            ParseResult::Err(reject) => self.reject(reject),
        }
    }

    fn request_version(&mut self) -> State {
        match parse_version(&mut self.buffer) {
            ParseResult::Ok(version) if version.major() != 1 => {
                self.reject(Reject::VersionNotSupported)
            }
            ParseResult::Ok(version) => {
                self.version = Some(version);
                State::RequestHeader
            }
            ParseResult::Pending => State::SocketRead(Parse::Version),
            ParseResult::Err(reject) => self.reject(reject),
        }
    }

    fn request_header(&mut self) -> State {
        match parse_header_line(&mut self.buffer) {
            ParseResult::Ok(HeaderLine::Field) => State::RequestHeaderName,
            ParseResult::Ok(HeaderLine::End) => self.body_framing(),
            ParseResult::Pending => State::SocketRead(Parse::Header),
            ParseResult::Err(reject) => self.reject(reject),
        }
    }

    fn request_header_name(&mut self) -> State {
        match parse_header_name(&mut self.buffer) {
            Ok(name) => State::RequestHeaderValue(name),
            Err(reject) => self.reject(reject),
        }
    }

    fn request_header_value(&mut self, name: Option<StandardHeader>) -> State {
        let value = match parse_header_value(&mut self.buffer) {
            Ok(value) => value,
            Err(reject) => return self.reject(reject),
        };

        match name.map(|name| self.headers.insert(name, value)) {
            Some(Err(reject)) => self.reject(reject),
            _ => State::RequestHeader,
        }
    }

    /// Decide how the request body is delimited.
    ///
    /// [httpwg](https://httpwg.org/specs/rfc9112.html#message.body.length)
    fn body_framing(&mut self) -> State {
        if self.headers.contains(StandardHeader::TransferEncoding) {
            return self.reject(Reject::Unimplemented("transfer-encoding request body"));
        }

        let Some(value) = self.headers.get(StandardHeader::ContentLength) else {
            return State::Process;
        };
        let Some(len) = parse_content_length(self.buffer.slice(value)) else {
            return self.reject(BadRequestReason::InvalidContentLength.into());
        };

        match usize::try_from(len) {
            Ok(0) => State::Process,
            Ok(len) => {
                self.content_length = len;
                State::RequestBody
            }
            Err(_) => self.reject(Reject::BodyTooLarge),
        }
    }

    fn request_body(&mut self) -> State {
        match self.buffer.read(&mut self.io, self.content_length) {
            Ok(_) => {
                self.body = Some(self.buffer.take(self.content_length));
                State::Process
            }
            Err(LineError::Overflow) => self.reject(Reject::BodyTooLarge),
            Err(LineError::Eof) => {
                debug!("unexpected end of stream in request body");
                State::Close
            }
            Err(LineError::Io(err)) => {
                error!("read error: {err}");
                self.error = Some(err);
                State::Close
            }
        }
    }

    fn process(&mut self) -> State {
        let (Some(method), Some(target), Some(version)) = (self.method, self.target, self.version)
        else {
            self.error = Some(io::Error::other("request processed before it was parsed"));
            return State::Close;
        };

        let buffer = &self.buffer;
        let request = Request::new(
            method,
            version,
            buffer.slice(target.path),
            target.query.map(|query| buffer.slice(query)),
            &self.headers,
            buffer,
            self.body.map(|body| buffer.slice(body)).unwrap_or_default(),
        );
        let keep_alive = self.config.keep_alive && request.is_keep_alive();

        let mut response = Response::new(
            &mut self.io,
            version,
            method == Method::HEAD,
            keep_alive,
            self.config.chunk_size.max(1),
        );

        let result = self.service.call(&request, &mut response);
        let sent = response.is_sent();
        let keep_alive = response.is_keep_alive();
        self.requests += 1;

        match result {
            Ok(()) if sent => {}
            Ok(()) => return self.reject(Reject::ServiceIncomplete),
            Err(err) => {
                error!("service error: {err}");
                self.error = Some(err);
                return State::Close;
            }
        }

        if !keep_alive {
            return State::Close;
        }
        if self.buffer.is_empty() {
            self.buffer.reset();
        }
        State::Start
    }

    fn close(&mut self) -> State {
        if let Some(result) = &self.result {
            let version = self.version.unwrap_or_default();
            let head = self.method == Some(Method::HEAD);
            let mut response =
                Response::new(&mut self.io, version, head, false, self.config.chunk_size.max(1));

            if let Err(err) = self.service.reject(result, &mut response) {
                error!("failed to send rejection: {err}");
                self.error.get_or_insert(err);
            }
        }

        if let Err(err) = self.io.flush() {
            error!("flush error: {err}");
            self.error.get_or_insert(err);
        }

        State::Stop
    }

    /// Record the rejection, only the first one is kept.
    fn reject(&mut self, cause: Reject) -> State {
        if self.result.is_none() {
            warning!("request rejected: {cause}");
            debug!("buffer:\n{}", self.buffer.hex_dump());
            self.result = Some(ExchangeResult::new(cause));
        }
        State::Close
    }
}

impl<IO, S> std::fmt::Debug for Exchange<IO, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Exchange")
            .field("buffer", &self.buffer)
            .field("method", &self.method)
            .field("version", &self.version)
            .field("result", &self.result)
            .field("requests", &self.requests)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test;
