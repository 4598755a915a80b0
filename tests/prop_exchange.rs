//! Exchange and chunked writer properties.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Read, Write};

use proptest::prelude::*;
use tsue_h1::headers::StandardHeader;
use tsue_h1::service::from_fn;
use tsue_h1::{ChunkedWriter, Config, Exchange};

/// Stream that yields one chunk per read.
struct Chunks {
    reads: VecDeque<Vec<u8>>,
    written: Vec<u8>,
}

impl Read for Chunks {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(chunk) = self.reads.pop_front() else {
            return Ok(0);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            self.reads.push_front(chunk[n..].to_vec());
        }
        Ok(n)
    }
}

impl Write for Chunks {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Split `input` at every position in `points`.
fn split(input: &[u8], points: &[usize]) -> VecDeque<Vec<u8>> {
    let mut points = points.iter().map(|&at| at % input.len()).collect::<Vec<_>>();
    points.sort_unstable();
    points.dedup();

    let mut chunks = VecDeque::new();
    let mut start = 0;
    for at in points.into_iter().filter(|&at| at > 0) {
        chunks.push_back(input[start..at].to_vec());
        start = at;
    }
    chunks.push_back(input[start..].to_vec());
    chunks
}

#[derive(Debug, Default, PartialEq)]
struct Seen {
    path: Vec<u8>,
    query: Option<Vec<u8>>,
    host: Option<Vec<u8>>,
    agent: Option<Vec<u8>>,
    body: Vec<u8>,
}

/// Decode chunked coding, returning the payload and every chunk size.
fn decode_chunked(mut bytes: &[u8]) -> (Vec<u8>, Vec<usize>) {
    let mut payload = Vec::new();
    let mut sizes = Vec::new();
    loop {
        let crlf = bytes.windows(2).position(|w| w == b"\r\n").expect("size line");
        let size = std::str::from_utf8(&bytes[..crlf]).unwrap();
        let size = usize::from_str_radix(size, 16).unwrap();
        bytes = &bytes[crlf + 2..];
        if size == 0 {
            assert_eq!(bytes, b"\r\n");
            return (payload, sizes);
        }
        payload.extend_from_slice(&bytes[..size]);
        assert_eq!(&bytes[size..size + 2], b"\r\n");
        bytes = &bytes[size + 2..];
        sizes.push(size);
    }
}

proptest! {
    #[test]
    fn split_reads_parse_the_same(
        path in "/[a-z0-9/]{0,24}",
        query in proptest::option::of("[a-z0-9=&]{0,16}"),
        host in "[a-z.]{1,16}",
        agent in proptest::option::of("[ -~]{0,32}"),
        body in proptest::collection::vec(any::<u8>(), 0..64),
        points in proptest::collection::vec(any::<usize>(), 0..8),
    ) {
        let mut input = format!("POST {path}");
        if let Some(query) = &query {
            input.push('?');
            input.push_str(query);
        }
        input.push_str(&format!(" HTTP/1.1\r\nHost: {host}\r\nX-Trace: 1\r\n"));
        if let Some(agent) = &agent {
            input.push_str(&format!("User-Agent: {agent}\r\n"));
        }
        input.push_str(&format!("Content-Length: {}\r\nConnection: close\r\n\r\n", body.len()));
        let mut input = input.into_bytes();
        input.extend_from_slice(&body);

        let seen = RefCell::new(None);
        let service = from_fn(|req, res| {
            *seen.borrow_mut() = Some(Seen {
                path: req.path().to_vec(),
                query: req.query().map(<[u8]>::to_vec),
                host: req.header(StandardHeader::Host).map(<[u8]>::to_vec),
                agent: req.header(StandardHeader::UserAgent).map(<[u8]>::to_vec),
                body: req.body().to_vec(),
            });
            res.send_empty()
        });

        let io = Chunks { reads: split(&input, &points), written: Vec::new() };
        let mut exchange = Exchange::new(io, &service, &Config::default());
        exchange.run();

        prop_assert!(exchange.result().is_none(), "{:?}", exchange.result());
        prop_assert_eq!(exchange.requests(), 1);

        // the SP after the colon and one trailing SP are trimmed
        let agent = agent.map(|agent| agent.strip_suffix(' ').unwrap_or(&agent).as_bytes().to_vec());
        let expected = Seen {
            path: path.into_bytes(),
            query: query.map(String::into_bytes),
            host: Some(host.into_bytes()),
            agent,
            body,
        };
        prop_assert_eq!(seen.take(), Some(expected));
    }

    #[test]
    fn chunked_round_trip(
        payload in proptest::collection::vec(any::<u8>(), 0..2048),
        capacity in 1usize..128,
        writes in proptest::collection::vec(1usize..256, 1..16),
    ) {
        let mut sink = Vec::new();
        let mut writer = ChunkedWriter::new(&mut sink, capacity);
        writer
            .write(|w| {
                let mut rest = &payload[..];
                for &len in writes.iter().cycle() {
                    if rest.is_empty() {
                        break;
                    }
                    let (head, tail) = rest.split_at(len.min(rest.len()));
                    w.append(head)?;
                    rest = tail;
                }
                Ok(())
            })
            .unwrap();

        let (decoded, sizes) = decode_chunked(&sink);
        prop_assert_eq!(decoded, payload);
        prop_assert!(sizes.iter().all(|&size| size > 0 && size <= capacity));
    }
}
