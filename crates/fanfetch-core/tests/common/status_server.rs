//! Minimal HTTP/1.1 server for integration tests.
//!
//! Answers `GET /<prefix>/<id>` with a status chosen by a per-id function, or
//! closes the connection without replying. Each connection carries one
//! request and is closed after the response.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// What the server does for a given resource id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Status(u16),
    /// Read the request, then close the socket with no response.
    Hangup,
}

pub struct StatusServer {
    /// Base URL without trailing slash, e.g. `http://127.0.0.1:12345/photos`.
    pub base_url: String,
    hits: Arc<AtomicUsize>,
}

impl StatusServer {
    /// Requests received so far (including hung-up ones).
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Starts a server in a background thread. It runs until the process exits.
pub fn start(reply: fn(u64) -> Reply) -> StatusServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_srv = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let hits = Arc::clone(&hits_srv);
            thread::spawn(move || handle(stream, reply, &hits));
        }
    });
    StatusServer {
        base_url: format!("http://127.0.0.1:{}/photos", port),
        hits,
    }
}

/// A URL on a port nothing listens on.
pub fn refused_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/photos", port)
}

fn handle(mut stream: TcpStream, reply: fn(u64) -> Reply, hits: &AtomicUsize) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let mut len = 0;
    while len < buf.len() {
        match stream.read(&mut buf[len..]) {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                len += n;
                if buf[..len].windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
        }
    }
    let request = match std::str::from_utf8(&buf[..len]) {
        Ok(s) => s,
        Err(_) => return,
    };
    hits.fetch_add(1, Ordering::SeqCst);

    let id = parse_id(request);
    let code = match id.map(reply) {
        Some(Reply::Status(code)) => code,
        Some(Reply::Hangup) => return,
        None => 400,
    };
    let body = format!("{{\"id\": {}}}", id.unwrap_or(0));
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        code,
        reason(code),
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

/// Id from a request line like `GET /photos/17 HTTP/1.1`.
fn parse_id(request: &str) -> Option<u64> {
    let line = request.lines().next()?;
    let mut parts = line.split_whitespace();
    if !parts.next()?.eq_ignore_ascii_case("GET") {
        return None;
    }
    parts.next()?.rsplit('/').next()?.parse().ok()
}

fn reason(code: u16) -> &'static str {
    match code {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}
