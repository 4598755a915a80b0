use std::io;
use std::sync::Arc;

use crate::exchange::ExchangeResult;
use crate::request::Request;
use crate::response::Response;

// ===== Service =====

/// Request handler invoked once the request line, headers and body are parsed.
pub trait Service {
    /// Handle a request.
    ///
    /// The service must send the response, a service that returns without sending one is
    /// answered with `500 Internal Server Error`.
    ///
    /// # Errors
    ///
    /// An error closes the connection without further response.
    fn call(&self, request: &Request<'_>, response: &mut Response<'_>) -> io::Result<()>;

    /// Answer a request that was rejected before it reached [`call`][Service::call].
    ///
    /// The default implementation sends an empty response with the rejection status, the
    /// connection is always closed afterwards.
    fn reject(&self, result: &ExchangeResult, response: &mut Response<'_>) -> io::Result<()> {
        response.status(result.status).send_empty()
    }
}

impl<S: Service + ?Sized> Service for &S {
    #[inline]
    fn call(&self, request: &Request<'_>, response: &mut Response<'_>) -> io::Result<()> {
        S::call(self, request, response)
    }

    #[inline]
    fn reject(&self, result: &ExchangeResult, response: &mut Response<'_>) -> io::Result<()> {
        S::reject(self, result, response)
    }
}

impl<S: Service + ?Sized> Service for Arc<S> {
    #[inline]
    fn call(&self, request: &Request<'_>, response: &mut Response<'_>) -> io::Result<()> {
        S::call(self, request, response)
    }

    #[inline]
    fn reject(&self, result: &ExchangeResult, response: &mut Response<'_>) -> io::Result<()> {
        S::reject(self, result, response)
    }
}

// ===== FromFn =====

/// Create [`Service`] from a function.
///
/// ```
/// use tsue_h1::service::from_fn;
///
/// let service = from_fn(|req, res| {
///     let _ = req.path();
///     res.send(b"Hello World!")
/// });
/// # let _ = service;
/// ```
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: Fn(&Request<'_>, &mut Response<'_>) -> io::Result<()>,
{
    FromFn { f }
}

/// [`Service`] created by [`from_fn`].
#[derive(Debug, Clone)]
pub struct FromFn<F> {
    f: F,
}

impl<F> Service for FromFn<F>
where
    F: Fn(&Request<'_>, &mut Response<'_>) -> io::Result<()>,
{
    #[inline]
    fn call(&self, request: &Request<'_>, response: &mut Response<'_>) -> io::Result<()> {
        (self.f)(request, response)
    }
}
