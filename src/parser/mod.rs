//! HTTP/1.1 request scanners.
//!
//! Scanners work on the unread bytes of a [`LineBuffer`]. When the buffered bytes are not
//! sufficient, a scanner returns [`ParseResult::Pending`] without consuming anything, the caller
//! reads more bytes and calls the scanner again. The cursor only advances on
//! [`ParseResult::Ok`].
//!
//! Once the whole line is located, [`parse_header_name`] and [`parse_header_value`] can not be
//! pending, they return a plain [`Result`].
//!
//! [`LineBuffer`]: crate::io::LineBuffer
//! [`ParseResult::Pending`]: crate::common::ParseResult::Pending
//! [`ParseResult::Ok`]: crate::common::ParseResult::Ok
mod error;
mod header;
mod reqline;

pub use error::{BadRequestReason, Reject};
pub use header::{HeaderLine, parse_header_line, parse_header_name, parse_header_value};
pub use reqline::{Target, parse_method, parse_target, parse_version};
