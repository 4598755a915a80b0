//! Connection configuration.
use std::time::Duration;

/// Hard ceiling of the request buffer, in bytes.
pub const HARD_MAX_BUFFER_SIZE: usize = 1 << 14;

/// Smallest accepted request buffer size, in bytes.
pub const MIN_BUFFER_SIZE: usize = 128;

/// Per connection configuration.
///
/// ```
/// use tsue_h1::Config;
///
/// let config = Config::new()
///     .buffer_size(256, 8192)
///     .chunk_size(1024)
///     .keep_alive(false);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug)]
pub struct Config {
    /// Initial request buffer size, rounded up to a power of two.
    pub initial_buffer_size: usize,
    /// Maximum request buffer size, rounded up to a power of two and capped at
    /// [`HARD_MAX_BUFFER_SIZE`].
    ///
    /// The request line and the header section must fit in this many bytes.
    pub max_buffer_size: usize,
    /// Staging capacity of chunked response bodies.
    pub chunk_size: usize,
    /// Whether connections may persist across requests.
    pub keep_alive: bool,
    /// Socket read timeout, `None` blocks indefinitely.
    pub read_timeout: Option<Duration>,
    /// Socket write timeout, `None` blocks indefinitely.
    pub write_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_buffer_size: 1024,
            max_buffer_size: 4096,
            chunk_size: 1024,
            keep_alive: true,
            read_timeout: Some(Duration::from_secs(30)),
            write_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl Config {
    /// Create configuration with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial and maximum request buffer size.
    pub fn buffer_size(mut self, initial: usize, max: usize) -> Self {
        self.initial_buffer_size = initial;
        self.max_buffer_size = max;
        self
    }

    /// Set the staging capacity of chunked response bodies.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Enable or disable persistent connections.
    pub fn keep_alive(mut self, enable: bool) -> Self {
        self.keep_alive = enable;
        self
    }

    /// Set the socket read timeout.
    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the socket write timeout.
    pub fn write_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Check configuration values.
    ///
    /// # Errors
    ///
    /// Returns error if a buffer size is below [`MIN_BUFFER_SIZE`], if the maximum buffer size is
    /// smaller than the initial one, or if the chunk size is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_buffer_size < MIN_BUFFER_SIZE {
            return Err(ConfigError::InitialTooSmall(self.initial_buffer_size));
        }
        if self.max_buffer_size < MIN_BUFFER_SIZE {
            return Err(ConfigError::MaxTooSmall(self.max_buffer_size));
        }
        if self.max_buffer_size < self.initial_buffer_size {
            return Err(ConfigError::MaxBelowInitial {
                initial: self.initial_buffer_size,
                max: self.max_buffer_size,
            });
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        Ok(())
    }
}

// ===== Error =====

/// Invalid [`Config`] value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InitialTooSmall(usize),
    MaxTooSmall(usize),
    MaxBelowInitial { initial: usize, max: usize },
    ZeroChunkSize,
}

impl std::error::Error for ConfigError {}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::InitialTooSmall(size) => {
                write!(f, "initial buffer size must be >= {MIN_BUFFER_SIZE}, got {size}")
            }
            Self::MaxTooSmall(size) => {
                write!(f, "max buffer size must be >= {MIN_BUFFER_SIZE}, got {size}")
            }
            Self::MaxBelowInitial { initial, max } => {
                write!(f, "max buffer size ({max}) must be >= initial buffer size ({initial})")
            }
            Self::ZeroChunkSize => f.write_str("chunk size must be > 0"),
        }
    }
}
