//! Minimal HTTP/1.1 server for integration tests: a mutable table of routes
//! serving landing pages, data files, redirects and error statuses.
//!
//! Every response carries `Connection: close`. GET requests with
//! `Range: bytes=X-Y` are answered with 206 and the requested slice.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Debug, Clone)]
pub struct Route {
    pub status: u16,
    pub content_type: Option<String>,
    pub location: Option<String>,
    pub body: Vec<u8>,
    /// If false, HEAD returns 405 (simulates servers that block HEAD).
    pub head_allowed: bool,
}

impl Route {
    pub fn html(body: &str) -> Self {
        Self::file("text/html; charset=utf-8", body.as_bytes())
    }

    pub fn file(content_type: &str, body: &[u8]) -> Self {
        Self {
            status: 200,
            content_type: Some(content_type.to_string()),
            location: None,
            body: body.to_vec(),
            head_allowed: true,
        }
    }

    /// 200 without a Content-Type header.
    pub fn untyped(body: &[u8]) -> Self {
        Self {
            content_type: None,
            ..Self::file("", body)
        }
    }

    pub fn redirect(location: &str) -> Self {
        Self {
            status: 302,
            content_type: None,
            location: Some(location.to_string()),
            body: Vec::new(),
            head_allowed: true,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            ..Self::html("<html><body>error</body></html>")
        }
    }

    pub fn without_head(mut self) -> Self {
        self.head_allowed = false;
        self
    }
}

#[derive(Clone)]
pub struct LandingServer {
    base: String,
    routes: Arc<Mutex<HashMap<String, Route>>>,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl LandingServer {
    /// Base URL without trailing slash, e.g. "http://127.0.0.1:12345".
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn route(&self, path: &str, route: Route) {
        self.routes.lock().unwrap().insert(path.to_string(), route);
    }

    /// (method, path) of every request received so far.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|(m, p)| m == method && p == path)
            .count()
    }
}

/// Starts a server in a background thread. Runs until the process exits.
pub fn start() -> LandingServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let server = LandingServer {
        base: format!("http://127.0.0.1:{}", port),
        routes: Arc::new(Mutex::new(HashMap::new())),
        requests: Arc::new(Mutex::new(Vec::new())),
    };
    let shared = server.clone();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let shared = shared.clone();
            thread::spawn(move || handle(stream, &shared));
        }
    });
    server
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        206 => "Partial Content",
        302 => "Found",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}

fn handle(mut stream: std::net::TcpStream, server: &LandingServer) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let (method, path, range) = parse_request(request);
    server
        .requests
        .lock()
        .unwrap()
        .push((method.to_string(), path.to_string()));

    let route = server
        .routes
        .lock()
        .unwrap()
        .get(path)
        .cloned()
        .unwrap_or_else(|| Route::status(404));
    let is_head = method.eq_ignore_ascii_case("HEAD");
    if is_head && !route.head_allowed {
        let _ = stream.write_all(
            b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        return;
    }

    let (status, body) = match range {
        Some((start, end_incl)) if !is_head && route.status == 200 && !route.body.is_empty() => {
            let start = (start as usize).min(route.body.len());
            let end_excl = (end_incl.saturating_add(1) as usize).min(route.body.len());
            (206, &route.body[start..end_excl.max(start)])
        }
        _ => (route.status, route.body.as_slice()),
    };

    let mut head = format!("HTTP/1.1 {} {}\r\n", status, reason(status));
    if let Some(ct) = &route.content_type {
        head.push_str(&format!("Content-Type: {}\r\n", ct));
    }
    if let Some(location) = &route.location {
        head.push_str(&format!("Location: {}\r\n", location));
    }
    head.push_str(&format!("Content-Length: {}\r\nConnection: close\r\n\r\n", body.len()));
    let _ = stream.write_all(head.as_bytes());
    if !is_head {
        let _ = stream.write_all(body);
    }
}

/// Returns (method, path, optional (start, end_inclusive) for Range: bytes=X-Y).
fn parse_request(request: &str) -> (&str, &str, Option<(u64, u64)>) {
    let mut lines = request.lines();
    let mut first = lines.next().unwrap_or("").split_whitespace();
    let method = first.next().unwrap_or("");
    let path = first.next().unwrap_or("/");
    let mut range = None;
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("range") {
                let value = value.trim();
                if let Some(part) = value.strip_prefix("bytes=") {
                    if let Some((a, b)) = part.split_once('-') {
                        let start = a.trim().parse::<u64>().unwrap_or(0);
                        let end = b.trim().parse::<u64>().unwrap_or(u64::MAX);
                        range = Some((start, end));
                    }
                }
            }
        }
    }
    (method, path, range)
}
