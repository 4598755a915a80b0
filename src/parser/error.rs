use crate::http::Status;

/// Why a request failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BadRequestReason {
    /// Unknown or malformed method.
    InvalidMethod,
    /// Request target is not in origin form or contains invalid bytes.
    InvalidTarget,
    /// Request target does not fit in the buffer.
    UriTooLong,
    /// Protocol version is not `HTTP/` DIGIT `.` DIGIT.
    InvalidProtocol,
    /// Request line is not terminated by CRLF or LF right after the version.
    InvalidRequestLineTerminator,
    /// Header name is empty, contains non token bytes or has no colon.
    InvalidHeaderName,
    /// Header value contains control bytes or is not terminated by CRLF.
    InvalidHeaderValue,
    /// A header that must appear at most once is repeated.
    DuplicateHeader,
    /// `Content-Length` is not a decimal number.
    InvalidContentLength,
}

impl BadRequestReason {
    /// Returns the response status for this reason.
    #[inline]
    pub const fn status(&self) -> Status {
        match self {
            Self::UriTooLong => Status::URI_TOO_LONG,
            _ => Status::BAD_REQUEST,
        }
    }

    const fn message(&self) -> &'static str {
        match self {
            Self::InvalidMethod => "invalid method",
            Self::InvalidTarget => "invalid request target",
            Self::UriTooLong => "request target too long",
            Self::InvalidProtocol => "invalid protocol version",
            Self::InvalidRequestLineTerminator => "invalid request line terminator",
            Self::InvalidHeaderName => "invalid header name",
            Self::InvalidHeaderValue => "invalid header value",
            Self::DuplicateHeader => "duplicate header",
            Self::InvalidContentLength => "invalid content length",
        }
    }
}

impl std::fmt::Display for BadRequestReason {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Request rejection.
///
/// Scanners return [`BadRequest`] and [`Overflow`], the remaining variants are raised by the
/// exchange.
///
/// [`BadRequest`]: Reject::BadRequest
/// [`Overflow`]: Reject::Overflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reject {
    /// Malformed request.
    BadRequest(BadRequestReason),
    /// Header section does not fit in the buffer.
    Overflow,
    /// Major version other than 1.
    VersionNotSupported,
    /// Request body does not fit in the buffer.
    BodyTooLarge,
    /// Recognized but unhandled protocol feature.
    Unimplemented(&'static str),
    /// Service returned without sending a response.
    ServiceIncomplete,
}

impl Reject {
    /// Returns the response status for this rejection.
    pub const fn status(&self) -> Status {
        match self {
            Self::BadRequest(reason) => reason.status(),
            Self::Overflow => Status::REQUEST_HEADER_FIELDS_TOO_LARGE,
            Self::VersionNotSupported => Status::HTTP_VERSION_NOT_SUPPORTED,
            Self::BodyTooLarge => Status::CONTENT_TOO_LARGE,
            Self::Unimplemented(_) => Status::NOT_IMPLEMENTED,
            Self::ServiceIncomplete => Status::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the bad request reason, if any.
    #[inline]
    pub const fn reason(&self) -> Option<BadRequestReason> {
        match self {
            Self::BadRequest(reason) => Some(*reason),
            _ => None,
        }
    }
}

impl From<BadRequestReason> for Reject {
    #[inline]
    fn from(value: BadRequestReason) -> Self {
        Self::BadRequest(value)
    }
}

impl std::error::Error for Reject {}

impl std::fmt::Display for Reject {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::BadRequest(reason) => write!(f, "bad request: {reason}"),
            Self::Overflow => f.write_str("header section too large"),
            Self::VersionNotSupported => f.write_str("http version not supported"),
            Self::BodyTooLarge => f.write_str("request body too large"),
            Self::Unimplemented(feature) => write!(f, "unimplemented: {feature}"),
            Self::ServiceIncomplete => f.write_str("service did not send a response"),
        }
    }
}
