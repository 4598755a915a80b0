use crate::headers::StandardHeader;

/// Exchange state.
///
/// Each variant is handled by one step function of [`Exchange`][super::Exchange], which returns
/// the next state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Clear the previous request.
    Start,
    /// Read once from the stream, then resume in the given stage.
    ///
    /// End of stream always resumes in [`Close`][State::Close].
    SocketRead(Parse),
    RequestMethod,
    RequestTarget,
    RequestVersion,
    /// Locate the next header line, or the end of the header section.
    RequestHeader,
    RequestHeaderName,
    /// Scan the value of a header line, `None` for unrecognized names whose value is skipped.
    RequestHeaderValue(Option<StandardHeader>),
    RequestBody,
    /// Hand the request to the service.
    Process,
    /// Answer a pending rejection and flush the stream.
    Close,
    /// Terminal state.
    Stop,
}

/// Parsing stage a pending read resumes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parse {
    Method,
    Target,
    Version,
    Header,
}

impl Parse {
    /// Returns the state that continues this stage.
    #[inline]
    pub const fn resume(self) -> State {
        match self {
            Parse::Method => State::RequestMethod,
            Parse::Target => State::RequestTarget,
            Parse::Version => State::RequestVersion,
            Parse::Header => State::RequestHeader,
        }
    }
}
