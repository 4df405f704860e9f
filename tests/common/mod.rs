//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderMap, Request},
    routing::{any, get},
    Json, Router,
};
use relay_proxy::config::ProxyConfig;
use relay_proxy::{Closed, ProxyServer, ServerError, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const HELLO: &str = "Hello from the test server!";

/// Serve `app` on an ephemeral port.
pub async fn start_origin(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Origin answering every GET with [`HELLO`].
pub fn hello_origin() -> Router {
    Router::new().route("/", get(|| async { HELLO }))
}

/// Origin that sleeps before answering.
pub fn slow_origin(delay: Duration) -> Router {
    Router::new().route(
        "/",
        get(move || async move {
            tokio::time::sleep(delay).await;
            "Delayed hello from the test server!"
        }),
    )
}

/// Origin that reports the headers it observed as a JSON object.
///
/// Multiple values of one header are joined with ", ".
pub fn echo_headers_origin() -> Router {
    async fn echo(headers: HeaderMap) -> Json<BTreeMap<String, String>> {
        let mut observed = BTreeMap::new();
        for name in headers.keys() {
            let values: Vec<_> = headers
                .get_all(name)
                .iter()
                .map(|v| v.to_str().unwrap_or_default().to_string())
                .collect();
            observed.insert(name.as_str().to_string(), values.join(", "));
        }
        Json(observed)
    }
    Router::new().route("/", any(echo)).route("/{*path}", any(echo))
}

/// Origin that echoes method, request-target and body.
pub fn echo_request_origin() -> Router {
    async fn echo(request: Request<Body>) -> String {
        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        format!("{} {} {}", parts.method, parts.uri, String::from_utf8_lossy(&body))
    }
    Router::new().route("/", any(echo)).route("/{*path}", any(echo))
}

/// Start a raw TCP backend that writes `response` verbatim and closes.
pub async fn start_raw_backend(response: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    addr
}

pub struct RunningProxy {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<Closed, ServerError>>,
}

impl RunningProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for `start()` to return.
    pub async fn stop(self, deadline: Duration) -> Closed {
        self.shutdown.trigger(deadline);
        self.handle.await.unwrap().unwrap()
    }
}

pub fn proxy_config(target: String, timeout_ms: u64) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.target = target;
    config.upstream.timeout_ms = timeout_ms;
    config
}

pub async fn start_proxy_with(config: ProxyConfig) -> RunningProxy {
    let server = ProxyServer::bind(&config).await.unwrap();
    let addr = server.local_addr().unwrap();
    let shutdown = server.shutdown_handle();
    let handle = tokio::spawn(server.start());
    RunningProxy { addr, shutdown, handle }
}

/// Start a proxy forwarding to the origin at `origin`.
pub async fn start_proxy(origin: SocketAddr, timeout_ms: u64) -> RunningProxy {
    start_proxy_with(proxy_config(format!("http://{}", origin), timeout_ms)).await
}

/// Client that ignores proxy environment variables and does not pool.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
