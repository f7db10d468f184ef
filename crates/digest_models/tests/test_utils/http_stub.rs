//! Minimal HTTP server that answers with scripted responses.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// A scripted HTTP response.
#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub body: String,
}

impl StubResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// A request the stub received.
#[derive(Debug, Clone)]
pub struct StubRequest {
    pub path: String,
    pub headers: String,
    pub body: String,
}

/// Serves `responses` in order, repeating the last one when they run out.
pub struct StubServer {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<StubRequest>>>,
}

impl StubServer {
    pub async fn start(responses: Vec<StubResponse>) -> Self {
        assert!(!responses.is_empty(), "stub needs at least one response");
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let server_hits = hits.clone();
        let server_requests = requests.clone();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let Some(request) = read_request(&mut socket).await else {
                    continue;
                };
                server_requests.lock().unwrap().push(request);

                let index = server_hits.fetch_add(1, Ordering::SeqCst);
                let response = responses
                    .get(index)
                    .unwrap_or_else(|| responses.last().unwrap());
                let text = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    response.status,
                    if response.status == 200 { "OK" } else { "Error" },
                    response.body.len(),
                    response.body
                );
                let _ = socket.write_all(text.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        Self {
            base_url: format!("http://{}/v1beta", addr),
            hits,
            requests,
        }
    }

    /// Number of requests answered so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<StubRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_request(socket: &mut TcpStream) -> Option<StubRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);

        let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let content_length = headers
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);

        let body_start = header_end + 4;
        if buf.len() >= body_start + content_length {
            let path = headers
                .lines()
                .next()
                .and_then(|line| line.split_whitespace().nth(1))
                .unwrap_or_default()
                .to_string();
            let body =
                String::from_utf8_lossy(&buf[body_start..body_start + content_length]).to_string();
            return Some(StubRequest {
                path,
                headers,
                body,
            });
        }
    }
}
