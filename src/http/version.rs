/// HTTP Version.
///
/// The request line scanner stores the major and minor digits as they appear on the wire, any
/// digit pair is representable. Deciding which versions are acceptable is up to the caller.
///
/// [httpwg](https://httpwg.org/specs/rfc9112.html#http.version)
#[derive(Copy, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct Version {
    major: u8,
    minor: u8,
}

impl Version {
    /// `HTTP/1.0`
    pub const HTTP_10: Version = Version { major: 1, minor: 0 };

    /// `HTTP/1.1`
    pub const HTTP_11: Version = Version { major: 1, minor: 1 };

    /// Create version from its major and minor digits.
    ///
    /// # Panics
    ///
    /// Panics if either digit is larger than 9.
    #[inline]
    pub const fn new(major: u8, minor: u8) -> Version {
        assert!(major < 10 && minor < 10, "version digits must be in 0..=9");
        Version { major, minor }
    }

    /// Create version from the ASCII digits of a request line.
    #[inline]
    pub(crate) const fn from_ascii_digits(major: u8, minor: u8) -> Version {
        debug_assert!(major.is_ascii_digit() && minor.is_ascii_digit());
        Version {
            major: major - b'0',
            minor: minor - b'0',
        }
    }

    #[inline]
    pub const fn major(&self) -> u8 {
        self.major
    }

    #[inline]
    pub const fn minor(&self) -> u8 {
        self.minor
    }

    /// Returns `true` if connections with this version persist unless told otherwise.
    ///
    /// [httpwg](https://httpwg.org/specs/rfc9112.html#persistent.connections)
    #[inline]
    pub const fn is_persistent_by_default(&self) -> bool {
        self.major > 1 || (self.major == 1 && self.minor >= 1)
    }

    /// Returns the wire representation, e.g: `b"HTTP/1.1"`.
    pub const fn to_bytes(&self) -> [u8; 8] {
        let mut bytes = *b"HTTP/0.0";
        bytes[5] = b'0' + self.major;
        bytes[7] = b'0' + self.minor;
        bytes
    }
}

impl Default for Version {
    #[inline]
    fn default() -> Version {
        Version::HTTP_11
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "HTTP/{}.{}", self.major, self.minor)
    }
}

impl std::fmt::Debug for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "\"{self}\"")
    }
}
