//! Minimal HTTP/1.1 server that plays the AEMET OpenData API for integration tests.
//!
//! Routes match on a path substring and replay canned responses in order;
//! the last response of a route repeats. Every request is recorded with its
//! arrival time so tests can check pacing and credentials.

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Canned {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Canned {
    pub fn json(status: u16, body: &str) -> Self {
        Canned {
            status,
            headers: vec![("Content-Type".into(), "application/json".into())],
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn bytes(status: u16, body: &[u8]) -> Self {
        Canned {
            status,
            headers: vec![("Content-Type".into(), "text/plain;charset=ISO-8859-15".into())],
            body: body.to_vec(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[derive(Debug, Clone)]
pub struct Hit {
    /// Request target, including any query string.
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub at: Instant,
}

impl Hit {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct State {
    routes: Vec<(String, VecDeque<Canned>)>,
    hits: Vec<Hit>,
}

#[derive(Clone)]
pub struct AemetServer {
    base: String,
    state: Arc<Mutex<State>>,
}

impl AemetServer {
    /// Starts the server in a background thread. It runs until the process exits.
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let state = Arc::new(Mutex::new(State::default()));
        let shared = Arc::clone(&state);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let state = Arc::clone(&shared);
                thread::spawn(move || handle(stream, &state));
            }
        });
        AemetServer {
            base: format!("http://127.0.0.1:{}/", port),
            state,
        }
    }

    /// Base URL with a trailing slash, e.g. `http://127.0.0.1:12345/`.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Index endpoint to configure as `api_base`.
    pub fn api_base(&self) -> String {
        format!("{}api/valores/climatologicos/diarios/datos", self.base)
    }

    pub fn route(&self, pattern: &str, replies: Vec<Canned>) {
        self.state
            .lock()
            .unwrap()
            .routes
            .push((pattern.to_string(), replies.into()));
    }

    /// Index document pointing at `<base>sh/<token>`.
    pub fn index_ok(&self, token: &str) -> Canned {
        Canned::json(
            200,
            &format!(
                r#"{{"descripcion":"exito","estado":200,"datos":"{b}sh/{token}","metadatos":"{b}sh/meta"}}"#,
                b = self.base
            ),
        )
    }

    pub fn hits(&self, pattern: &str) -> Vec<Hit> {
        self.state
            .lock()
            .unwrap()
            .hits
            .iter()
            .filter(|h| h.target.contains(pattern))
            .cloned()
            .collect()
    }

    pub fn total_hits(&self) -> usize {
        self.state.lock().unwrap().hits.len()
    }
}

fn handle(mut stream: TcpStream, state: &Mutex<State>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let request = String::from_utf8_lossy(&buf).to_string();
    let (target, headers) = parse_request(&request);

    let reply = {
        let mut state = state.lock().unwrap();
        state.hits.push(Hit {
            target: target.clone(),
            headers,
            at: Instant::now(),
        });
        state
            .routes
            .iter_mut()
            .find(|(pattern, _)| target.contains(pattern.as_str()))
            .and_then(|(_, replies)| {
                if replies.len() > 1 {
                    replies.pop_front()
                } else {
                    replies.front().cloned()
                }
            })
    };
    let reply = reply.unwrap_or_else(|| Canned::json(404, r#"{"descripcion":"no route","estado":404}"#));

    let mut head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        reply.status,
        reason(reply.status),
        reply.body.len()
    );
    for (k, v) in &reply.headers {
        head.push_str(&format!("{}: {}\r\n", k, v));
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&reply.body);
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        401 => "Unauthorized",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Returns (request target, headers).
fn parse_request(request: &str) -> (String, Vec<(String, String)>) {
    let mut lines = request.lines();
    let target = lines
        .next()
        .and_then(|l| l.split_whitespace().nth(1))
        .unwrap_or("")
        .to_string();
    let headers = lines
        .take_while(|l| !l.trim().is_empty())
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    (target, headers)
}
