// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Minimal HTTP/1.1 server on 127.0.0.1 for exercising the real clients.
//!
//! Every connection carries exactly one request and is closed after the
//! reply, so the recorded request count equals the number of attempts the
//! client made.

use std::{
    io::{Read, Write},
    net::{TcpListener, TcpStream},
    sync::{Arc, Mutex},
    thread,
    time::Duration
};

/// Request line and headers captured by the server.
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub(crate) method: String,
    /// Path including the query string.
    pub(crate) target: String,
    headers:           Vec<(String, String)>,
    pub(crate) body:   String
}

impl RecordedRequest {
    /// Returns the first header value with the given name, ignoring case.
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Path without the query string.
    pub(crate) fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or_default()
    }
}

/// Status code and JSON or text body sent back for one request.
pub(crate) struct Reply {
    status: u16,
    body:   String
}

impl Reply {
    pub(crate) fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into()
        }
    }
}

/// Handle to a running server.
pub(crate) struct LoopbackServer {
    base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>
}

impl LoopbackServer {
    /// Binds an ephemeral port and answers every request with `handler`.
    ///
    /// The handler receives the request and the server base URL, so replies
    /// can point back at the same server.
    pub(crate) fn start<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest, &str) -> Reply + Send + 'static
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback listener");
        let address = listener.local_addr().expect("local addr");
        let base_url = format!("http://{address}");
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = Arc::clone(&requests);
        let served_url = base_url.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else {
                    continue;
                };
                let Some(request) = read_request(&mut stream) else {
                    continue;
                };
                let reply = handler(&request, &served_url);
                recorded.lock().expect("request log").push(request);
                write_reply(&mut stream, &reply);
            }
        });

        Self {
            base_url,
            requests
        }
    }

    pub(crate) fn url(&self) -> &str {
        &self.base_url
    }

    /// Requests received so far, in arrival order.
    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("request log").clone()
    }
}

fn read_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
    stream.set_read_timeout(Some(Duration::from_secs(5))).ok()?;

    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        if let Some(position) = buffer.windows(4).position(|window| window == b"\r\n\r\n") {
            break position + 4;
        }
        let read = stream.read(&mut chunk).ok()?;
        if read == 0 {
            return None;
        }
        buffer.extend_from_slice(&chunk[..read]);
    };

    let head = String::from_utf8_lossy(&buffer[..header_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_owned();
    let target = request_line.next()?.to_owned();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_owned(), value.trim().to_owned()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);
    while buffer.len() < header_end + content_length {
        let read = stream.read(&mut chunk).ok()?;
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);
    }
    let body = String::from_utf8_lossy(&buffer[header_end..]).into_owned();

    Some(RecordedRequest {
        method,
        target,
        headers,
        body
    })
}

fn write_reply(stream: &mut TcpStream, reply: &Reply) {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: \
         close\r\n\r\n{}",
        reply.status,
        reason_phrase(reply.status),
        reply.body.len(),
        reply.body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        _ => "Status"
    }
}
