//! Chunked transfer coding writer.
use bytes::BytesMut;
use std::io::{self, Write};

const CRLF: &[u8] = b"\r\n";

const TERMINATOR: &[u8] = b"0\r\n\r\n";

/// Longest chunk size line, 16 hex digits and CRLF.
const MAX_SIZE_LINE: usize = 18;

/// Frames outbound bytes as [chunked transfer coding][rfc].
///
/// Bytes are copied into a fixed capacity staging buffer, each time the staging buffer is full
/// it is written to the sink as one chunk.
///
/// ```
/// use tsue_h1::ChunkedWriter;
///
/// let mut sink = Vec::new();
/// let mut writer = ChunkedWriter::new(&mut sink, 4);
/// writer.write(|w| w.append(b"ABCDEFG")).unwrap();
///
/// assert_eq!(sink, b"4\r\nABCD\r\n3\r\nEFG\r\n0\r\n\r\n");
/// ```
///
/// [rfc]: <https://httpwg.org/specs/rfc9112.html#chunked.encoding>
pub struct ChunkedWriter<W> {
    sink: W,
    staging: BytesMut,
    capacity: usize,
    framed: bool,
}

impl<W: Write> ChunkedWriter<W> {
    /// Create chunked writer with staging buffer of `capacity` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(sink: W, capacity: usize) -> Self {
        assert!(capacity > 0, "chunk capacity must be > 0");
        Self {
            sink,
            // room for the in place CRLF
            staging: BytesMut::with_capacity(capacity + CRLF.len()),
            capacity,
            framed: true,
        }
    }

    /// Create writer that stages bytes the same way, but writes them without chunk framing.
    ///
    /// Used for peers that do not understand chunked coding, where the body is delimited by
    /// closing the connection.
    pub fn identity(sink: W, capacity: usize) -> Self {
        Self {
            framed: false,
            ..Self::new(sink, capacity)
        }
    }

    /// Staging buffer capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of staged bytes.
    #[inline]
    pub fn staged(&self) -> usize {
        self.staging.len()
    }

    /// Copy `bytes` into the staging buffer, writing a chunk each time it is full.
    ///
    /// # Errors
    ///
    /// Returns error from the sink.
    pub fn append(&mut self, mut bytes: &[u8]) -> io::Result<()> {
        while !bytes.is_empty() {
            let room = self.capacity - self.staging.len();
            let (head, rest) = bytes.split_at(room.min(bytes.len()));
            self.staging.extend_from_slice(head);
            bytes = rest;

            if self.staging.len() == self.capacity {
                self.flush()?;
            }
        }
        Ok(())
    }

    /// Write staged bytes as one chunk.
    ///
    /// Does nothing when no bytes are staged, a zero length chunk is only written by
    /// [`finish`][ChunkedWriter::finish].
    ///
    /// # Errors
    ///
    /// Returns error from the sink.
    pub fn flush(&mut self) -> io::Result<()> {
        if self.staging.is_empty() {
            return Ok(());
        }

        if !self.framed {
            self.sink.write_all(&self.staging)?;
            self.staging.clear();
            return Ok(());
        }

        let mut line = io::Cursor::new([0u8; MAX_SIZE_LINE]);
        write!(line, "{:x}\r\n", self.staging.len())?;
        let len = line.position() as usize;
        self.sink.write_all(&line.get_ref()[..len])?;

        if self.capacity - self.staging.len() >= CRLF.len() {
            self.staging.extend_from_slice(CRLF);
            self.sink.write_all(&self.staging)?;
        } else {
            self.sink.write_all(&self.staging)?;
            self.sink.write_all(CRLF)?;
        }

        self.staging.clear();
        Ok(())
    }

    /// Write the remaining staged bytes and the terminating zero length chunk, then flush the
    /// sink.
    ///
    /// # Errors
    ///
    /// Returns error from the sink.
    pub fn finish(&mut self) -> io::Result<()> {
        self.flush()?;
        if self.framed {
            self.sink.write_all(TERMINATOR)?;
        }
        self.sink.flush()
    }

    /// Run `producer` to append the body, then [`finish`][ChunkedWriter::finish].
    ///
    /// The terminating zero length chunk is always written.
    ///
    /// # Errors
    ///
    /// Returns error from the producer or the sink. The body is not terminated when the
    /// producer fails.
    pub fn write<F>(&mut self, producer: F) -> io::Result<()>
    where
        F: FnOnce(&mut Self) -> io::Result<()>,
    {
        producer(self)?;
        self.finish()
    }

    /// Returns the sink, discarding any staged bytes.
    #[inline]
    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl<W: Write> Write for ChunkedWriter<W> {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.append(buf)?;
        Ok(buf.len())
    }

    #[inline]
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.append(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        ChunkedWriter::flush(self)?;
        self.sink.flush()
    }
}

impl<W: Write> std::fmt::Write for ChunkedWriter<W> {
    #[inline]
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        self.append(s.as_bytes()).map_err(|_| std::fmt::Error)
    }
}

impl<W> std::fmt::Debug for ChunkedWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("ChunkedWriter")
            .field("capacity", &self.capacity)
            .field("staged", &self.staging.len())
            .field("framed", &self.framed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Write as _;

    use super::ChunkedWriter;

    /// Sink recording every write call.
    #[derive(Default)]
    struct Calls(Vec<Vec<u8>>);

    impl std::io::Write for Calls {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.push(buf.to_vec());
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_two_chunks() {
        let mut sink = Vec::new();
        let mut writer = ChunkedWriter::new(&mut sink, 4);
        writer.write(|w| w.append(b"ABCDEFG")).unwrap();
        assert_eq!(sink, b"4\r\nABCD\r\n3\r\nEFG\r\n0\r\n\r\n");
    }

    #[test]
    fn test_crlf_in_place() {
        let mut writer = ChunkedWriter::new(Calls::default(), 8);
        writer.append(b"abc").unwrap();
        writer.flush().unwrap();
        writer.append(b"0123456789").unwrap();

        let calls = writer.into_inner().0;
        assert_eq!(
            calls,
            [
                b"3\r\n".to_vec(),
                b"abc\r\n".to_vec(),
                b"8\r\n".to_vec(),
                b"01234567".to_vec(),
                b"\r\n".to_vec(),
            ]
        );
    }

    #[test]
    fn test_empty() {
        let mut sink = Vec::new();
        let mut writer = ChunkedWriter::new(&mut sink, 16);
        writer.flush().unwrap();
        assert_eq!(writer.staged(), 0);
        writer.write(|_| Ok(())).unwrap();
        assert_eq!(sink, b"0\r\n\r\n");
    }

    #[test]
    fn test_exact_capacity() {
        let mut sink = Vec::new();
        let mut writer = ChunkedWriter::new(&mut sink, 16);
        writer
            .write(|w| {
                w.append(&[b'a'; 16])?;
                w.append(&[b'b'; 17])
            })
            .unwrap();

        let mut expected = b"10\r\n".to_vec();
        expected.extend_from_slice(&[b'a'; 16]);
        expected.extend_from_slice(b"\r\n10\r\n");
        expected.extend_from_slice(&[b'b'; 16]);
        expected.extend_from_slice(b"\r\n1\r\nb\r\n0\r\n\r\n");
        assert_eq!(sink, expected);
    }

    #[test]
    fn test_write_traits() {
        let mut sink = Vec::new();
        let mut writer = ChunkedWriter::new(&mut sink, 64);
        writer
            .write(|w| {
                write!(w, "hello {}", 42).map_err(std::io::Error::other)?;
                std::io::Write::write_all(w, b"!")
            })
            .unwrap();
        assert_eq!(sink, b"9\r\nhello 42!\r\n0\r\n\r\n");
    }

    #[test]
    fn test_identity() {
        let mut sink = Vec::new();
        let mut writer = ChunkedWriter::identity(&mut sink, 4);
        writer.write(|w| w.append(b"ABCDEFG")).unwrap();
        assert_eq!(sink, b"ABCDEFG");
    }
}
