use std::fmt::Write as _;
use std::io;
use tsue_h1::{
    Config, Request, Response, Server,
    headers::StandardHeader,
    http::{Method, Status},
    service::from_fn,
};

fn main() -> io::Result<()> {
    env_logger::init();

    let config = Config::new().buffer_size(1024, 8192).chunk_size(512);

    Server::bind("0.0.0.0:3000", from_fn(handle))?
        .config(config)
        .serve()
}

fn handle(req: &Request, res: &mut Response) -> io::Result<()> {
    log::info!(
        "> {} {} {}",
        req.method(),
        String::from_utf8_lossy(req.path()),
        req.version()
    );

    match (req.method(), req.path()) {
        (Method::GET, b"/") => res
            .header("Content-Type", "text/plain")
            .send(b"Hello World!"),
        (Method::POST, b"/echo") => {
            let content_type = req
                .header(StandardHeader::ContentType)
                .unwrap_or(b"application/octet-stream");
            res.header("Content-Type", content_type).send(req.body())
        }
        (Method::GET, b"/query") => res.header("Content-Type", "text/plain").send_chunked(|w| {
            for (name, value) in req.query_pairs() {
                writeln!(
                    w,
                    "{} = {}",
                    String::from_utf8_lossy(name),
                    String::from_utf8_lossy(value)
                )
                .map_err(io::Error::other)?;
            }
            Ok(())
        }),
        (Method::GET, b"/headers") => res.send_chunked(|w| {
            for (name, value) in req.headers() {
                w.append(name.as_str().as_bytes())?;
                w.append(b": ")?;
                w.append(value)?;
                w.append(b"\n")?;
            }
            Ok(())
        }),
        (_, b"/" | b"/echo" | b"/query" | b"/headers") => {
            res.status(Status::METHOD_NOT_ALLOWED).send_empty()
        }
        _ => res.status(Status::NOT_FOUND).send_empty(),
    }
}
