//! HTTP Protocol.
mod method;
mod status;
mod version;
mod date;

pub use method::{Method, UnknownMethod};
pub use version::Version;
pub use status::Status;
pub use date::{httpdate, httpdate_now, HTTPDATE_LEN};
