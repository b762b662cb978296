//! Shared test fixtures for gateway/session/api test modules.
//!
//! Keeps the canned HTTP server and the scripted token source in one place
//! so each test module does not rebuild its own.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::auth::{RefreshResponse, TokenGrant, TokenSource};
use crate::error::GatewayError;

/// Render a complete HTTP/1.1 response that closes the connection.
pub fn http_response(status: u16, headers: &[&str], body: &str) -> String {
    let mut text = format!("HTTP/1.1 {status} {}\r\n", reason(status));
    for header in headers {
        text.push_str(header);
        text.push_str("\r\n");
    }
    text.push_str("Content-Type: application/json\r\n");
    text.push_str(&format!("Content-Length: {}\r\n", body.len()));
    text.push_str("Connection: close\r\n\r\n");
    text.push_str(body);
    text
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    }
}

/// Serve `responses` in order, one connection each.
///
/// The join handle yields the raw text of every request received.
pub async fn serve_canned(responses: Vec<String>) -> (SocketAddr, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let mut seen = Vec::new();
        for response in responses {
            let (mut stream, _) = listener.accept().await.expect("accept");
            seen.push(read_request(&mut stream).await);
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
        seen
    });
    (addr, server)
}

/// Read one request: headers plus a `Content-Length` body.
async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf);
        let Some(head_end) = text.find("\r\n\r\n") else {
            continue;
        };
        let content_length = text[..head_end]
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buf.len() >= head_end + 4 + content_length {
            break;
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Token source that replays queued outcomes.
///
/// When built with [`ScriptedSource::gated`], each refresh blocks until the
/// test calls [`ScriptedSource::release`], which keeps a flight outstanding
/// for as long as the test needs.
pub struct ScriptedSource {
    responses: StdMutex<VecDeque<Result<RefreshResponse, GatewayError>>>,
    calls: AtomicUsize,
    endpoints: StdMutex<Vec<String>>,
    gate: Option<Semaphore>,
}

impl ScriptedSource {
    pub fn new(responses: Vec<Result<RefreshResponse, GatewayError>>) -> Self {
        Self {
            responses: StdMutex::new(responses.into()),
            calls: AtomicUsize::new(0),
            endpoints: StdMutex::new(Vec::new()),
            gate: None,
        }
    }

    pub fn gated(responses: Vec<Result<RefreshResponse, GatewayError>>) -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new(responses)
        }
    }

    /// Shorthand for a successful grant.
    pub fn grant(token: &str, expiry: u64) -> Result<RefreshResponse, GatewayError> {
        Ok(RefreshResponse::Granted(TokenGrant::new(token, Some(expiry))))
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.endpoints.lock().expect("lock").clone()
    }
}

#[async_trait]
impl TokenSource for ScriptedSource {
    async fn refresh(&self, endpoint: &str) -> Result<RefreshResponse, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.endpoints.lock().expect("lock").push(endpoint.to_string());
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate open").forget();
        }
        self.responses
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::Invalid("no scripted response queued".into())))
    }
}
