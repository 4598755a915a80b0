//! Connection read buffering.
mod buffer;
mod span;

pub use buffer::{Fill, HexDump, LineBuffer, LineError, power_of_two};
pub use span::Span;
