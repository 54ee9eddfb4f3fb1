//! Minimal HTTP/1.1 file server for integration tests.
//!
//! Serves a fixed path -> body table on 127.0.0.1. GET on a known path answers
//! 200 with the body; anything else is 404. Every response closes the connection,
//! so a body without `Content-Length` is delimited by EOF.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct FileServerOptions {
    /// If false, omit `Accept-Ranges: bytes`.
    pub advertise_ranges: bool,
    /// If false, omit `Content-Length` and end the body by closing the connection.
    pub send_length: bool,
}

impl Default for FileServerOptions {
    fn default() -> Self {
        Self {
            advertise_ranges: true,
            send_length: true,
        }
    }
}

/// Starts a server in a background thread serving `files` (paths like `/dir/a.txt`).
/// Returns the base URL without a trailing slash (e.g. "http://127.0.0.1:12345").
/// The server runs until the process exits.
pub fn start(files: &[(&str, &[u8])]) -> String {
    start_with_options(files, FileServerOptions::default())
}

/// Like `start` but allows dropping the byte headers.
pub fn start_with_options(files: &[(&str, &[u8])], opts: FileServerOptions) -> String {
    let table: HashMap<String, Vec<u8>> = files
        .iter()
        .map(|(path, body)| (path.to_string(), body.to_vec()))
        .collect();
    let table = Arc::new(table);
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let table = Arc::clone(&table);
            thread::spawn(move || handle(stream, &table, opts));
        }
    });
    format!("http://127.0.0.1:{}", port)
}

fn handle(mut stream: TcpStream, table: &HashMap<String, Vec<u8>>, opts: FileServerOptions) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));

    let mut request = Vec::new();
    let mut buf = [0u8; 4096];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }
    let request = String::from_utf8_lossy(&request);
    let mut first = request.lines().next().unwrap_or("").split_whitespace();
    let method = first.next().unwrap_or("");
    let path = first.next().unwrap_or("");

    let body = match table.get(path) {
        Some(body) if method.eq_ignore_ascii_case("GET") => body,
        _ => {
            let _ = stream.write_all(
                b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            );
            return;
        }
    };

    let mut head = String::from("HTTP/1.1 200 OK\r\nConnection: close\r\n");
    if opts.send_length {
        head.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    if opts.advertise_ranges {
        head.push_str("Accept-Ranges: bytes\r\n");
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.flush();
    let _ = stream.shutdown(Shutdown::Write);
}
