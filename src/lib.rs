//! Blocking HTTP/1.1 Server Engine
//!
//! Requests are parsed in place from a bounded, growable [`LineBuffer`], every parsed component
//! is a [`Span`] into that buffer. The [`Exchange`] state machine resumes parsing across partial
//! reads, and answers malformed requests with a precise status.
//!
//! ```no_run
//! use std::net::TcpListener;
//! use tsue_h1::service::from_fn;
//!
//! let listener = TcpListener::bind("127.0.0.1:3000")?;
//! tsue_h1::serve(listener, from_fn(|req, res| {
//!     match req.path() {
//!         b"/" => res.send(b"Hello World!"),
//!         _ => res.status(tsue_h1::http::Status::NOT_FOUND).send_empty(),
//!     }
//! }))?;
//! # Ok::<_, std::io::Error>(())
//! ```
//!
//! [`LineBuffer`]: io::LineBuffer
//! [`Span`]: io::Span
#![warn(missing_debug_implementations)]

mod log;
mod matches;

pub mod common;
pub mod config;
pub mod io;
pub mod parser;
pub mod headers;
pub mod http;

pub mod chunked;
pub mod request;
pub mod response;
pub mod service;
pub mod exchange;
pub mod server;

pub use chunked::ChunkedWriter;
pub use config::Config;
pub use exchange::{Exchange, ExchangeResult};
pub use request::Request;
pub use response::Response;
pub use server::{Server, serve, serve_connection};
pub use service::Service;
