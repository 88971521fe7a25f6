//! Minimal HTTP/1.1 server for executor tests.
//!
//! Serves a single static body over GET. In range mode, `Range: bytes=X-`
//! requests get `206 Partial Content` with the tail of the body; in plain
//! mode the Range header is ignored and the full body comes back as 200.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

#[derive(Clone, Copy)]
enum Mode {
    Range,
    Plain,
    Error(u32),
}

/// Range-capable server. Returns the base URL, e.g. "http://127.0.0.1:12345/".
pub fn start(body: Vec<u8>) -> String {
    start_mode(body, Mode::Range)
}

/// Server that ignores Range requests and always sends the full body.
pub fn start_plain(body: Vec<u8>) -> String {
    start_mode(body, Mode::Plain)
}

/// Server that answers every request with the given HTTP status and an
/// empty body.
pub fn start_error(status: u32) -> String {
    start_mode(Vec::new(), Mode::Error(status))
}

fn start_mode(body: Vec<u8>, mode: Mode) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            thread::spawn(move || handle(stream, &body, mode));
        }
    });
    format!("http://127.0.0.1:{}/", port)
}

fn handle(mut stream: TcpStream, body: &[u8], mode: Mode) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };

    if let Mode::Error(status) = mode {
        let response = format!("HTTP/1.1 {} Error\r\nContent-Length: 0\r\n\r\n", status);
        let _ = stream.write_all(response.as_bytes());
        return;
    }

    let total = body.len() as u64;
    let range_start = match mode {
        Mode::Range => parse_range_start(request).filter(|s| *s < total),
        _ => None,
    };

    let (status, slice) = match range_start {
        Some(start) => ("206 Partial Content", &body[start as usize..]),
        None => ("200 OK", body),
    };
    let content_range = match range_start {
        Some(start) => format!(
            "Content-Range: bytes {}-{}/{}\r\n",
            start,
            total.saturating_sub(1),
            total
        ),
        None => String::new(),
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\n{}Accept-Ranges: bytes\r\n\r\n",
        status,
        slice.len(),
        content_range
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(slice);
}

/// Start offset of a `Range: bytes=X-` header, if present.
fn parse_range_start(request: &str) -> Option<u64> {
    for line in request.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("range") {
                let value = value.trim().to_ascii_lowercase();
                let spec = value.strip_prefix("bytes=")?;
                let (start, _) = spec.split_once('-')?;
                return start.trim().parse::<u64>().ok();
            }
        }
    }
    None
}
