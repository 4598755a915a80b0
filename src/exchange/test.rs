use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Read, Write};

use super::{Exchange, Parse, State};
use crate::config::Config;
use crate::headers::StandardHeader;
use crate::http::{Method, Status, Version};
use crate::parser::{BadRequestReason, Reject};
use crate::request::Request;
use crate::response::Response;
use crate::service::{Service, from_fn};

type Handler = fn(&Request, &mut Response) -> io::Result<()>;

const fn is_send<T: Send>() {}
const _: () = {
    is_send::<Exchange<std::net::TcpStream, crate::service::FromFn<Handler>>>();
};

/// Stream that yields one scripted chunk per read and records everything written.
struct Mock {
    reads: VecDeque<Vec<u8>>,
    fail: bool,
    written: Vec<u8>,
}

impl Mock {
    fn new(chunks: &[&[u8]]) -> Mock {
        Mock {
            reads: chunks.iter().map(|chunk| chunk.to_vec()).collect(),
            fail: false,
            written: Vec::new(),
        }
    }
}

impl Read for Mock {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(chunk) = self.reads.front_mut() else {
            return if self.fail {
                Err(io::ErrorKind::ConnectionReset.into())
            } else {
                Ok(0)
            };
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        chunk.drain(..n);
        if chunk.is_empty() {
            self.reads.pop_front();
        }
        Ok(n)
    }
}

impl Write for Mock {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn ok() -> impl Service {
    from_fn(|_, res| res.send(b"ok"))
}

fn run<S: Service>(chunks: &[&[u8]], service: S, config: &Config) -> Exchange<Mock, S> {
    let mut exchange = Exchange::new(Mock::new(chunks), service, config);
    exchange.run();
    exchange
}

fn output<S>(exchange: &Exchange<Mock, S>) -> String {
    String::from_utf8_lossy(&exchange.io.written).into_owned()
}

/// Step until `until` or [`State::Stop`], returning every visited state.
fn states<S: Service>(exchange: &mut Exchange<Mock, S>, until: State) -> Vec<State> {
    let mut state = State::Start;
    let mut states = vec![state];
    while state != until && state != State::Stop {
        state = exchange.step(state);
        states.push(state);
    }
    states
}

#[test]
fn test_parse_request() {
    let mut exchange = Exchange::new(
        Mock::new(&[b"GET /a?x=1 HTTP/1.1\r\nHost: h\r\n\r\n"]),
        ok(),
        &Config::default(),
    );

    assert_eq!(
        states(&mut exchange, State::Process),
        [
            State::Start,
            State::SocketRead(Parse::Method),
            State::RequestMethod,
            State::RequestTarget,
            State::RequestVersion,
            State::RequestHeader,
            State::RequestHeaderName,
            State::RequestHeaderValue(Some(StandardHeader::Host)),
            State::RequestHeader,
            State::Process,
        ]
    );

    assert_eq!(exchange.method(), Some(Method::GET));
    assert_eq!(exchange.target(), Some(&b"/a"[..]));
    assert_eq!(exchange.query(), Some(&b"x=1"[..]));
    assert_eq!(exchange.version(), Some(Version::HTTP_11));
    assert_eq!(exchange.header(StandardHeader::Host), Some(&b"h"[..]));
    assert_eq!(exchange.body(), None);
    assert!(exchange.result().is_none());

    // persistent by default, then the peer closes
    assert_eq!(exchange.step(State::Process), State::Start);
    assert_eq!(
        states(&mut exchange, State::Stop),
        [State::Start, State::SocketRead(Parse::Method), State::Close, State::Stop]
    );
    assert_eq!(exchange.requests(), 1);
    assert!(exchange.result().is_none());
    assert!(exchange.error().is_none());
}

#[test]
fn test_truncated_request() {
    let mut exchange = Exchange::new(Mock::new(&[b"GET /a HTTP/1.1\r"]), ok(), &Config::default());
    let states = states(&mut exchange, State::Stop);

    assert_eq!(
        &states[states.len() - 4..],
        [
            State::RequestVersion,
            State::SocketRead(Parse::Version),
            State::Close,
            State::Stop
        ]
    );
    assert!(exchange.result().is_none());
    assert_eq!(exchange.requests(), 0);
    assert!(exchange.io.written.is_empty());
}

#[test]
fn test_invalid_method() {
    let exchange = run(&[b"FOO / HTTP/1.1\r\n\r\n"], ok(), &Config::default());

    let result = exchange.result().unwrap();
    assert_eq!(result.reason(), Some(BadRequestReason::InvalidMethod));
    assert_eq!(result.status, Status::BAD_REQUEST);
    assert_eq!(exchange.requests(), 0);

    let output = output(&exchange);
    assert!(output.starts_with("HTTP/1.1 400 Bad Request\r\n"), "{output}");
    assert!(output.contains("\r\nContent-Length: 0\r\n"), "{output}");
    assert!(output.ends_with("\r\nConnection: close\r\n\r\n"), "{output}");
}

#[test]
fn test_uri_too_long() {
    let mut input = b"GET /".to_vec();
    input.resize(300, b'a');

    let config = Config::default().buffer_size(128, 128);
    let exchange = run(&[&input], ok(), &config);

    let result = exchange.result().unwrap();
    assert_eq!(result.reason(), Some(BadRequestReason::UriTooLong));
    assert_eq!(result.status, Status::URI_TOO_LONG);
    assert!(output(&exchange).starts_with("HTTP/1.1 414 URI Too Long\r\n"));
}

#[test]
fn test_tiny_buffer() {
    let input = b"OPTIONS / HTTP/1.1\r\nConnection: close\r\n\r\n";
    let chunks = input.chunks(1).collect::<Vec<_>>();

    let config = Config::new().buffer_size(4, 4);
    let exchange = run(&chunks, ok(), &config);

    assert!(exchange.result().is_none(), "{:?}", exchange.result());
    assert_eq!(exchange.requests(), 1);
    assert!(output(&exchange).starts_with("HTTP/1.1 200 OK\r\n"));
}

#[test]
fn test_reject() {
    macro_rules! test {
        ($input:expr => $cause:expr, $status:literal) => {
            let exchange = run(&[&$input[..]], ok(), &Config::default());
            let result = exchange.result().unwrap();
            assert_eq!(result.cause, $cause, "input: {:?}", String::from_utf8_lossy(&$input[..]));
            assert_eq!(result.status.code(), $status);
            assert!(output(&exchange).starts_with(concat!("HTTP/1.1 ", $status)));
            assert_eq!(exchange.requests(), 0);
        };
    }

    test!(b"GET / HTTP/2.0\r\n\r\n" => Reject::VersionNotSupported, 505);
    test!(b"GET / HTTP/0.9\r\n\r\n" => Reject::VersionNotSupported, 505);
    test!(b"GET / HTTP/1.1 \r\n\r\n" => Reject::BadRequest(BadRequestReason::InvalidRequestLineTerminator), 400);
    test!(b"GET / HTTP/1.1\r\nHost a\r\n\r\n" => Reject::BadRequest(BadRequestReason::InvalidHeaderName), 400);
    test!(b"GET / HTTP/1.1\r\nHost: a\n\r\n" => Reject::BadRequest(BadRequestReason::InvalidHeaderValue), 400);
    test!(
        b"GET / HTTP/1.1\r\nHost: a\r\nHost: b\r\n\r\n" => Reject::BadRequest(BadRequestReason::DuplicateHeader),
        400
    );
    test!(
        b"POST / HTTP/1.1\r\nContent-Length: 1\r\ncontent-length: 1\r\n\r\n"
            => Reject::BadRequest(BadRequestReason::DuplicateHeader),
        400
    );
    test!(
        b"POST / HTTP/1.1\r\nContent-Length: 12a\r\n\r\n" => Reject::BadRequest(BadRequestReason::InvalidContentLength),
        400
    );
    test!(
        b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n"
            => Reject::Unimplemented("transfer-encoding request body"),
        501
    );
    test!(b"POST / HTTP/1.1\r\nContent-Length: 5000\r\n\r\n" => Reject::BodyTooLarge, 413);

    let mut large = b"GET / HTTP/1.1\r\nCookie: ".to_vec();
    large.resize(5000, b'c');
    test!(large => Reject::Overflow, 431);
}

#[test]
fn test_first_error_wins() {
    let mut exchange =
        Exchange::new(Mock::new(&[b"GET / HTTP/1.1\r\nHost: a\r\nHost: b\r\n"]), ok(), &Config::default());
    assert_eq!(states(&mut exchange, State::Close).last(), Some(&State::Close));
    assert_eq!(exchange.result().unwrap().reason(), Some(BadRequestReason::DuplicateHeader));

    assert_eq!(exchange.reject(Reject::Overflow), State::Close);
    assert_eq!(exchange.result().unwrap().reason(), Some(BadRequestReason::DuplicateHeader));

    // parsed fields are kept as they were
    assert_eq!(exchange.method(), Some(Method::GET));
    assert_eq!(exchange.header(StandardHeader::Host), Some(&b"a"[..]));

    assert_eq!(exchange.step(State::Close), State::Stop);
    assert!(output(&exchange).starts_with("HTTP/1.1 400 Bad Request\r\n"));
}

#[test]
fn test_keep_alive() {
    let paths = RefCell::new(Vec::new());
    let service = from_fn(|req, res| {
        paths.borrow_mut().push(req.path().to_vec());
        res.send(req.path())
    });

    let exchange = run(
        &[
            b"GET /one HTTP/1.1\r\nHost: a\r\n\r\n",
            b"GET /two HTTP/1.1\r\nConnection: close\r\n\r\n",
            b"GET /three HTTP/1.1\r\n\r\n",
        ],
        &service,
        &Config::default(),
    );

    assert_eq!(exchange.requests(), 2);
    assert!(exchange.result().is_none());
    assert_eq!(*paths.borrow(), [b"/one".to_vec(), b"/two".to_vec()]);

    let output = output(&exchange);
    assert_eq!(output.matches("HTTP/1.1 200 OK\r\n").count(), 2);
    assert_eq!(output.matches("Connection: close\r\n").count(), 1);
    assert!(output.ends_with("Connection: close\r\n\r\n/two"), "{output}");
}

#[test]
fn test_pipelined() {
    let exchange = run(
        &[b"GET /one HTTP/1.1\r\n\r\nGET /two HTTP/1.1\r\n\r\nGET /thr"],
        from_fn(|req, res| res.send(req.path())),
        &Config::default(),
    );

    assert_eq!(exchange.requests(), 2);
    let output = output(&exchange);
    assert!(output.contains("/one"));
    assert!(output.ends_with("/two"));
}

#[test]
fn test_close() {
    // HTTP/1.0 closes by default
    let exchange = run(&[b"GET / HTTP/1.0\r\n\r\nGET / HTTP/1.0\r\n\r\n"], ok(), &Config::default());
    assert_eq!(exchange.requests(), 1);
    assert!(output(&exchange).contains("Connection: close\r\n"));

    let exchange = run(
        &[b"GET / HTTP/1.0\r\nConnection: keep-alive\r\n\r\nGET / HTTP/1.0\r\n\r\n"],
        ok(),
        &Config::default(),
    );
    assert_eq!(exchange.requests(), 2);
    assert!(output(&exchange).contains("Connection: keep-alive\r\n"));

    let config = Config::default().keep_alive(false);
    let exchange = run(&[b"GET / HTTP/1.1\r\n\r\nGET / HTTP/1.1\r\n\r\n"], ok(), &config);
    assert_eq!(exchange.requests(), 1);
}

#[test]
fn test_request_body() {
    let exchange = run(
        &[
            b"POST /submit HTTP/1.1\r\nContent-Length: 11\r\nConnection: close\r\n\r\nhel",
            b"lo ",
            b"world",
        ],
        from_fn(|req, res| {
            assert_eq!(req.method(), Method::POST);
            res.send(req.body())
        }),
        &Config::default(),
    );

    assert_eq!(exchange.requests(), 1);
    let output = output(&exchange);
    assert!(output.contains("\r\nContent-Length: 11\r\n"), "{output}");
    assert!(output.ends_with("\r\n\r\nhello world"), "{output}");

    // stream ends before the body
    let exchange = run(
        &[b"POST / HTTP/1.1\r\nContent-Length: 10\r\n\r\nshort"],
        ok(),
        &Config::default(),
    );
    assert_eq!(exchange.requests(), 0);
    assert!(exchange.result().is_none());
    assert!(exchange.io.written.is_empty());
}

#[test]
fn test_head() {
    let exchange = run(
        &[b"HEAD / HTTP/1.1\r\nConnection: close\r\n\r\n"],
        from_fn(|_, res| res.send(b"hello")),
        &Config::default(),
    );
    let output = output(&exchange);
    assert!(output.contains("\r\nContent-Length: 5\r\n"), "{output}");
    assert!(output.ends_with("\r\n\r\n"), "{output}");
}

#[test]
fn test_unknown_headers_skipped() {
    let exchange = run(
        &[b"GET / HTTP/1.1\r\nX-Custom: 1\r\nReferer: /\r\nConnection: close\r\n\r\n"],
        from_fn(|req, res| {
            assert_eq!(req.headers().count(), 1);
            res.send_empty()
        }),
        &Config::default(),
    );
    assert_eq!(exchange.requests(), 1);
    assert!(exchange.result().is_none());
}

#[test]
fn test_service_incomplete() {
    let exchange = run(&[b"GET / HTTP/1.1\r\n\r\n"], from_fn(|_, _| Ok(())), &Config::default());

    assert_eq!(exchange.requests(), 1);
    assert_eq!(exchange.result().unwrap().cause, Reject::ServiceIncomplete);
    assert!(output(&exchange).starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
}

#[test]
fn test_service_error() {
    let exchange = run(
        &[b"GET / HTTP/1.1\r\n\r\n"],
        from_fn(|_, _| Err(io::Error::other("boom"))),
        &Config::default(),
    );

    assert!(exchange.result().is_none());
    assert_eq!(exchange.error().unwrap().to_string(), "boom");
    assert!(exchange.io.written.is_empty());
}

#[test]
fn test_read_error() {
    let mut io = Mock::new(&[b"GET / HT"]);
    io.fail = true;
    let mut exchange = Exchange::new(io, ok(), &Config::default());
    exchange.run();

    assert_eq!(exchange.error().unwrap().kind(), io::ErrorKind::ConnectionReset);
    assert!(exchange.result().is_none());
}

#[test]
fn test_custom_reject() {
    struct Plain;

    impl Service for Plain {
        fn call(&self, _: &Request<'_>, res: &mut Response<'_>) -> io::Result<()> {
            res.send_empty()
        }

        fn reject(&self, result: &super::ExchangeResult, res: &mut Response<'_>) -> io::Result<()> {
            res.status(result.status)
                .header("Content-Type", "text/plain")
                .send(result.cause.to_string().as_bytes())
        }
    }

    let exchange = run(&[b"GET index HTTP/1.1\r\n\r\n"], Plain, &Config::default());
    let output = output(&exchange);
    assert!(output.contains("Content-Type: text/plain\r\n"), "{output}");
    assert!(output.ends_with("bad request: invalid request target"), "{output}");
}

#[test]
fn test_split_reads() {
    const INPUT: &[u8] = b"PATCH /items/1?force=true HTTP/1.1\r\nHost: example.com\r\n\
        Content-Type: text/plain\r\nContent-Length: 4\r\nConnection: close\r\n\r\nbody";

    for at in 1..INPUT.len() {
        let (head, tail) = INPUT.split_at(at);
        let exchange = run(
            &[head, tail],
            from_fn(|req, res| {
                assert_eq!(req.method(), Method::PATCH);
                assert_eq!(req.path(), b"/items/1");
                assert_eq!(req.query(), Some(&b"force=true"[..]));
                assert_eq!(req.header(StandardHeader::Host), Some(&b"example.com"[..]));
                assert_eq!(req.header(StandardHeader::ContentType), Some(&b"text/plain"[..]));
                res.send(req.body())
            }),
            &Config::default(),
        );
        assert_eq!(exchange.requests(), 1, "split at {at}");
        assert!(exchange.result().is_none(), "split at {at}");
        assert!(output(&exchange).ends_with("body"), "split at {at}");
    }

    // one byte per read
    let chunks = INPUT.chunks(1).collect::<Vec<_>>();
    let exchange = run(&chunks, from_fn(|req, res| res.send(req.body())), &Config::default());
    assert_eq!(exchange.requests(), 1);
}
