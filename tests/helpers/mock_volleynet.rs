//! A local HTTP server standing in for volleynet.
//!
//! Every request is recorded in arrival order and answered by a route
//! function. Each connection serves exactly one request and is then closed.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use volleynet_sync::{ClientConfig, VolleynetClient};

/// One request as the server saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub method: String,
    pub target: String,
    pub cookie: Option<String>,
    pub body: String,
}

impl Recorded {
    /// `"GET /path?query"`
    pub fn line(&self) -> String {
        format!("{} {}", self.method, self.target)
    }
}

#[derive(Debug, Clone)]
pub struct Reply {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            headers: vec![],
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: vec![],
            body: String::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

type Route = dyn Fn(&Recorded) -> Reply + Send + Sync;

pub struct MockVolleynet {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<Recorded>>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl MockVolleynet {
    pub async fn start(route: impl Fn(&Recorded) -> Reply + Send + Sync + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind TCP listener");
        let addr = listener.local_addr().expect("Failed to get local address");
        let requests: Arc<Mutex<Vec<Recorded>>> = Arc::new(Mutex::new(Vec::new()));
        let route: Arc<Route> = Arc::new(route);

        let requests_clone = Arc::clone(&requests);
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let requests = Arc::clone(&requests_clone);
                let route = Arc::clone(&route);
                tokio::spawn(async move {
                    Self::handle_connection(stream, requests, route).await;
                });
            }
        });

        Self {
            addr,
            requests,
            _handle: handle,
        }
    }

    async fn handle_connection(
        stream: TcpStream,
        requests: Arc<Mutex<Vec<Recorded>>>,
        route: Arc<Route>,
    ) {
        let mut reader = BufReader::new(stream);

        let mut request_line = String::new();
        if reader.read_line(&mut request_line).await.is_err() {
            return;
        }
        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or_default().to_string();
        let target = parts.next().unwrap_or_default().to_string();

        let mut content_length = 0;
        let mut cookie = None;
        loop {
            let mut line = String::new();
            match reader.read_line(&mut line).await {
                Ok(0) | Err(_) => return,
                Ok(_) => {}
            }
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                let value = value.trim();
                match name.to_ascii_lowercase().as_str() {
                    "content-length" => content_length = value.parse().unwrap_or(0),
                    "cookie" => cookie = Some(value.to_string()),
                    _ => {}
                }
            }
        }

        let mut body = vec![0u8; content_length];
        if reader.read_exact(&mut body).await.is_err() {
            return;
        }

        let recorded = Recorded {
            method,
            target,
            cookie,
            body: String::from_utf8_lossy(&body).into_owned(),
        };
        let reply = route(&recorded);
        requests.lock().await.push(recorded);

        let mut response = format!(
            "HTTP/1.1 {} Mock\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n",
            reply.status,
            reply.body.len()
        );
        for (name, value) in &reply.headers {
            response.push_str(&format!("{name}: {value}\r\n"));
        }
        response.push_str("\r\n");
        response.push_str(&reply.body);

        let mut stream = reader.into_inner();
        let _ = stream.write_all(response.as_bytes()).await;
        let _ = stream.flush().await;
        let _ = stream.shutdown().await;
    }

    /// A client whose read and form urls both point at this server.
    pub fn client(&self) -> VolleynetClient {
        let url = format!("http://{}", self.addr);
        let config = ClientConfig {
            post_url: url.clone(),
            get_url: url,
            ..ClientConfig::default()
        };
        let http = reqwest::Client::builder()
            .no_proxy()
            .build()
            .expect("Failed to build http client");
        VolleynetClient::with_client(http, config)
    }

    /// All requests received so far, oldest first.
    pub async fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().await.clone()
    }

    pub async fn request_lines(&self) -> Vec<String> {
        self.requests().await.iter().map(Recorded::line).collect()
    }
}
