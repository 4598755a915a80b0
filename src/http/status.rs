use std::num::NonZeroU16;

/// HTTP [Status Code][rfc].
///
/// Only the statuses the engine and common services produce are provided.
///
/// [rfc]: <https://datatracker.ietf.org/doc/html/rfc9110#name-status-codes>
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(NonZeroU16);

impl Default for Status {
    #[inline]
    fn default() -> Self {
        Self::OK
    }
}

macro_rules! status {
    (
        $(
            $(#[$doc:meta])*
            $int:literal $id:ident $msg:literal;
        )*
    ) => {
        impl Status {
            $(
                $(#[$doc])*
                pub const $id: Self = Self(NonZeroU16::new($int).unwrap());
            )*

            /// Returns status for the given code, if it is known.
            pub const fn from_u16(code: u16) -> Option<Status> {
                match code {
                    $(
                        $int => Some(Self::$id),
                    )*
                    _ => None,
                }
            }

            /// Returns status code value, e.g: `200`.
            #[inline]
            pub const fn code(&self) -> u16 {
                self.0.get()
            }

            /// Returns status code and reason phrase, e.g: `"200 OK"`.
            pub const fn as_str(&self) -> &'static str {
                match self.0.get() {
                    $(
                        $int => concat!(stringify!($int), " ", $msg),
                    )*
                    _ => "500 Internal Server Error",
                }
            }

            /// Returns reason phrase, e.g: `"OK"`.
            pub const fn reason(&self) -> &'static str {
                match self.0.get() {
                    $(
                        $int => $msg,
                    )*
                    _ => "Internal Server Error",
                }
            }
        }
    };
}

status! {
    /// `200`. The request succeeded.
    200 OK "OK";
    /// `201`. The request succeeded, and a new resource was created as a result.
    201 CREATED "Created";
    /// `204`. There is no content to send for this request, but the headers are useful.
    204 NO_CONTENT "No Content";
    /// `301`. The URL of the requested resource has been changed permanently.
    301 MOVED_PERMANENTLY "Moved Permanently";
    /// `302`. The URI of requested resource has been changed temporarily.
    302 FOUND "Found";
    /// `304`. The response has not been modified.
    304 NOT_MODIFIED "Not Modified";
    /// `400`. The server cannot or will not process the request due to something that is perceived
    /// to be a client error.
    400 BAD_REQUEST "Bad Request";
    /// `403`. The client does not have access rights to the content.
    403 FORBIDDEN "Forbidden";
    /// `404`. The server cannot find the requested resource.
    404 NOT_FOUND "Not Found";
    /// `405`. The request method is known by the server but is not supported by the target resource.
    405 METHOD_NOT_ALLOWED "Method Not Allowed";
    /// `408`. The server would like to shut down this unused connection.
    408 REQUEST_TIMEOUT "Request Timeout";
    /// `411`. The `Content-Length` header field is not defined and the server requires it.
    411 LENGTH_REQUIRED "Length Required";
    /// `413`. The request body is larger than limits defined by server.
    413 CONTENT_TOO_LARGE "Content Too Large";
    /// `414`. The URI requested by the client is longer than the server is willing to interpret.
    414 URI_TOO_LONG "URI Too Long";
    /// `431`. The server is unwilling to process the request because its header fields are too
    /// large.
    431 REQUEST_HEADER_FIELDS_TOO_LARGE "Request Header Fields Too Large";
    /// `500`. The server has encountered a situation it does not know how to handle.
    500 INTERNAL_SERVER_ERROR "Internal Server Error";
    /// `501`. The request method or framing is not supported by the server.
    501 NOT_IMPLEMENTED "Not Implemented";
    /// `503`. The server is not ready to handle the request.
    503 SERVICE_UNAVAILABLE "Service Unavailable";
    /// `505`. The HTTP version used in the request is not supported by the server.
    505 HTTP_VERSION_NOT_SUPPORTED "HTTP Version Not Supported";
}

impl Status {
    /// Returns `true` for `1xx`, `204` and `304`, the statuses that never carry content.
    ///
    /// [httpwg](https://httpwg.org/specs/rfc9112.html#message.body.length)
    #[inline]
    pub const fn is_bodyless(&self) -> bool {
        matches!(self.0.get(), 100..=199 | 204 | 304)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Debug for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_tuple("Status").field(&self.0.get()).finish()
    }
}
