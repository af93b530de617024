//! Shared utilities for integration testing: a programmable reader gateway and
//! a proxy bound to an ephemeral port.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Router,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use simona_proxy::{ProxyConfig, ProxyServer, Shutdown};

pub const GATEWAY_PATH: &str = "/api/v1/basic";
pub const AUTH_TOKEN: &str = "test-token";

/// One request as seen by the mock gateway.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub params: HashMap<String, String>,
    pub auth_token: Option<String>,
}

type Responder = dyn Fn(&HashMap<String, String>) -> (u16, String) + Send + Sync;
type Delay = dyn Fn(&HashMap<String, String>) -> Duration + Send + Sync;

#[derive(Clone)]
struct GatewayState {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    responder: Arc<Responder>,
    delay: Arc<Delay>,
}

/// Mock reader gateway recording every call.
pub struct MockGateway {
    pub addr: SocketAddr,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockGateway {
    pub fn url(&self) -> String {
        format!("http://{}{}", self.addr, GATEWAY_PATH)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

async fn handle(
    State(state): State<GatewayState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> (StatusCode, String) {
    let auth_token = headers
        .get("x-auth-token")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    state.calls.lock().unwrap().push(RecordedCall {
        params: params.clone(),
        auth_token,
    });

    let delay = (state.delay)(&params);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let (status, body) = (state.responder)(&params);
    (StatusCode::from_u16(status).unwrap(), body)
}

/// Start a gateway whose answers are computed from the query parameters.
pub async fn start_gateway<F>(responder: F) -> MockGateway
where
    F: Fn(&HashMap<String, String>) -> (u16, String) + Send + Sync + 'static,
{
    start_delayed_gateway(|_| Duration::ZERO, responder).await
}

/// Like [`start_gateway`], but each answer is held back for `delay(params)`.
pub async fn start_delayed_gateway<D, F>(delay: D, responder: F) -> MockGateway
where
    D: Fn(&HashMap<String, String>) -> Duration + Send + Sync + 'static,
    F: Fn(&HashMap<String, String>) -> (u16, String) + Send + Sync + 'static,
{
    let calls = Arc::new(Mutex::new(Vec::new()));
    let state = GatewayState {
        calls: Arc::clone(&calls),
        responder: Arc::new(responder),
        delay: Arc::new(delay),
    };
    let app = Router::new()
        .route(GATEWAY_PATH, get(handle))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockGateway { addr, calls }
}

/// Configuration for a proxy on an ephemeral local port.
pub fn proxy_config(gateway_url: &str) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_host = "127.0.0.1".into();
    config.listener.bind_port = 0;
    config.gateway.url = gateway_url.to_string();
    config.gateway.auth_header_value = AUTH_TOKEN.into();
    config.gateway.timeout_secs = 2;
    config.gateway.connect_timeout_secs = 1;
    config
}

/// Address that refuses connections.
pub fn closed_port_url() -> String {
    let reserved = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = reserved.local_addr().unwrap().port();
    drop(reserved);
    format!("http://127.0.0.1:{}{}", port, GATEWAY_PATH)
}

/// Start a proxy and return its address plus a handle that stops accepting.
pub async fn start_proxy(config: ProxyConfig) -> (SocketAddr, Shutdown) {
    let server = ProxyServer::new(config).unwrap();
    let listener = server.bind().await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, rx).await;
    });

    (addr, shutdown)
}

/// Line-protocol test client.
pub struct ReaderClient {
    lines: tokio::io::Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl ReaderClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, writer) = stream.into_split();
        Self {
            lines: BufReader::new(read_half).lines(),
            writer,
        }
    }

    pub async fn send(&mut self, buffer: &str) {
        self.writer.write_all(buffer.as_bytes()).await.unwrap();
    }

    /// Next reply line without its newline.
    pub async fn reply(&mut self) -> String {
        tokio::time::timeout(Duration::from_secs(5), self.lines.next_line())
            .await
            .expect("reply timed out")
            .unwrap()
            .expect("proxy closed the connection")
    }

    /// Assert nothing arrives within `wait`.
    pub async fn expect_silence(&mut self, wait: Duration) {
        if let Ok(line) = tokio::time::timeout(wait, self.lines.next_line()).await {
            panic!("unexpected reply: {:?}", line);
        }
    }

    /// Close the write side and wait for the proxy to close the connection.
    pub async fn close(mut self) -> bool {
        self.writer.shutdown().await.unwrap();
        matches!(
            tokio::time::timeout(Duration::from_secs(5), self.lines.next_line()).await,
            Ok(Ok(None))
        )
    }
}
