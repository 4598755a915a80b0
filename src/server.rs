//! Blocking TCP server.
use std::io;
use std::net::{Shutdown, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread;

use crate::config::Config;
use crate::exchange::Exchange;
use crate::log::{debug, error, info};
use crate::service::Service;

/// Serve connections from `listener` with the default configuration.
///
/// # Errors
///
/// Returns error if the listener address can not be read.
#[inline]
pub fn serve<S>(listener: TcpListener, service: S) -> io::Result<()>
where
    S: Service + Send + Sync + 'static,
{
    Server::new(listener, service).serve()
}

/// Thread per connection HTTP/1.1 server.
#[derive(Debug)]
pub struct Server<S> {
    listener: TcpListener,
    service: Arc<S>,
    config: Arc<Config>,
}

impl<S> Server<S>
where
    S: Service + Send + Sync + 'static,
{
    pub fn new(listener: TcpListener, service: S) -> Self {
        Self {
            listener,
            service: Arc::new(service),
            config: Arc::new(Config::default()),
        }
    }

    /// Bind a listener to `addr`.
    ///
    /// # Errors
    ///
    /// Returns error from [`TcpListener::bind`].
    pub fn bind(addr: impl ToSocketAddrs, service: S) -> io::Result<Self> {
        Ok(Self::new(TcpListener::bind(addr)?, service))
    }

    /// Replace the configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = Arc::new(config);
        self
    }

    #[inline]
    pub fn listener(&self) -> &TcpListener {
        &self.listener
    }

    /// Accept connections forever, each one is served on its own thread.
    ///
    /// Accept errors are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::InvalidInput`] if the configuration is invalid, or error if the
    /// listener address can not be read.
    pub fn serve(self) -> io::Result<()> {
        self.config
            .validate()
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;

        let addr = self.listener.local_addr()?;
        info!("listening on {addr}");

        loop {
            let stream = match self.listener.accept() {
                Ok((stream, _peer)) => stream,
                Err(err) => {
                    error!("accept error: {err}");
                    continue;
                }
            };

            let service = Arc::clone(&self.service);
            let config = Arc::clone(&self.config);
            let spawn = thread::Builder::new()
                .name("tsue-h1-conn".into())
                .spawn(move || {
                    if let Err(err) = serve_connection(stream, service, &config) {
                        debug!("connection error: {err}");
                    }
                });

            if let Err(err) = spawn {
                error!("failed to spawn connection thread: {err}");
            }
        }
    }
}

/// Serve every request of a single connection on the current thread.
///
/// Socket timeouts are taken from `config`, the socket is shut down once the exchange stops.
///
/// # Errors
///
/// Returns the transport or service error that closed the connection.
pub fn serve_connection<S: Service>(
    stream: TcpStream,
    service: S,
    config: &Config,
) -> io::Result<()> {
    stream.set_read_timeout(config.read_timeout)?;
    stream.set_write_timeout(config.write_timeout)?;
    stream.set_nodelay(true)?;

    let mut exchange = Exchange::new(stream, service, config);
    exchange.run();

    if let Some(result) = exchange.result() {
        debug!("connection closed with {result}");
    }
    debug!("{} request(s) served", exchange.requests());

    let error = exchange.take_error();
    let stream = exchange.into_inner();

    // the peer may already be gone
    let _ = stream.shutdown(Shutdown::Both);

    match error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
