//! The forwarding handler.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → request.rs (build outbound, filter headers, rewrite Host)
//!     → client dispatch bounded by the upstream timeout
//!     → response.rs (relay status, headers, streamed body)
//! ```
//!
//! Exactly one upstream request is issued per inbound request. Nothing is
//! written to the caller before the origin's response head arrives, so every
//! failure up to that point becomes a complete error response.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, Response},
    response::IntoResponse,
};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{ConfigError, UpstreamConfig};
use crate::config::validation::validate_upstream;
use crate::error::ProxyError;
use crate::http::request::{build_outbound, Target};
use crate::http::response::relay;
use crate::observability::metrics;

/// Client used for upstream dispatch.
pub type UpstreamClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Forwards every request to one fixed origin.
///
/// Holds only read-only state, so one instance is shared by all connections.
#[derive(Debug, Clone)]
pub struct ForwardingHandler {
    target: Target,
    timeout: Duration,
    filter_response_headers: bool,
    client: UpstreamClient,
}

impl ForwardingHandler {
    /// Validate the upstream configuration and build the handler.
    pub fn new(config: &UpstreamConfig) -> Result<Self, ConfigError> {
        validate_upstream(config).map_err(ConfigError::Validation)?;
        let target = Target::parse(&config.target)
            .map_err(|e| ConfigError::Validation(vec![e]))?;

        // Explicit provider: another crate in the graph may enable a second one.
        let connector = HttpsConnectorBuilder::new()
            .with_provider_and_webpki_roots(rustls::crypto::ring::default_provider())?
            .https_or_http()
            .enable_http1()
            .build();
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            target,
            timeout: config.timeout(),
            filter_response_headers: config.filter_response_headers,
            client,
        })
    }

    /// Run one forwarding operation.
    ///
    /// The returned response's body still streams from the origin; a failure
    /// there is reported as `ProxyError::Relay` by the body itself.
    pub async fn handle(&self, inbound: Request<Body>) -> Result<Response<Body>, ProxyError> {
        let outbound = build_outbound(&self.target, inbound)?;

        tracing::debug!(url = %outbound.uri(), "Forwarding request");

        let upstream = match tokio::time::timeout(self.timeout, self.client.request(outbound)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(ProxyError::Upstream(e)),
            Err(_) => return Err(ProxyError::UpstreamTimeout(self.timeout)),
        };

        Ok(relay(upstream, self.filter_response_headers))
    }
}

/// Axum entry point: runs the forwarding operation and turns failures into
/// error responses.
pub async fn forward(
    State(handler): State<Arc<ForwardingHandler>>,
    request: Request<Body>,
) -> Response<Body> {
    let start_time = Instant::now();
    let method = request.method().clone();
    let span = tracing::info_span!(
        "forward",
        request_id = %Uuid::new_v4(),
        method = %method,
        uri = %request.uri(),
    );

    async move {
        match handler.handle(request).await {
            Ok(response) => {
                tracing::debug!(status = %response.status(), "Upstream responded");
                metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
                response
            }
            Err(e) => {
                tracing::warn!(error = %e.describe(), "Forwarding failed");
                metrics::record_error(&e);
                let response = e.into_response();
                metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
                response
            }
        }
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    async fn spawn_origin(app: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn handler_for(addr: SocketAddr, timeout_ms: u64) -> ForwardingHandler {
        ForwardingHandler::new(&UpstreamConfig {
            target: format!("http://{}", addr),
            timeout_ms,
            filter_response_headers: true,
        })
        .unwrap()
    }

    #[test]
    fn rejects_invalid_configuration() {
        let config = UpstreamConfig {
            target: String::new(),
            timeout_ms: 0,
            filter_response_headers: true,
        };
        match ForwardingHandler::new(&config) {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn builds_tls_client_for_https_target() {
        let handler = ForwardingHandler::new(&UpstreamConfig {
            target: "https://example.com:8443/api".to_string(),
            timeout_ms: 1_000,
            filter_response_headers: true,
        })
        .unwrap();
        assert_eq!(*handler.target.host(), "example.com:8443");
        assert_eq!(handler.timeout, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn forwards_method_path_and_query() {
        let origin = Router::new().route(
            "/items",
            axum::routing::post(|request: Request<Body>| async move {
                format!("{} {}", request.method(), request.uri())
            }),
        );
        let handler = handler_for(spawn_origin(origin).await, 1_000);

        let request = Request::builder()
            .method("POST")
            .uri("/items?page=2")
            .body(Body::empty())
            .unwrap();
        let response = handler.handle(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"POST /items?page=2");
    }

    #[tokio::test]
    async fn slow_origin_times_out() {
        let origin = Router::new().route(
            "/",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                "Delayed hello from the test server!"
            }),
        );
        let handler = handler_for(spawn_origin(origin).await, 100);

        let started = Instant::now();
        let err = handler
            .handle(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, ProxyError::UpstreamTimeout(_)));
        assert!(started.elapsed() < Duration::from_millis(900));
    }

    #[tokio::test]
    async fn unreachable_origin_is_an_upstream_error() {
        // Bind then drop to get a port nothing listens on.
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let handler = handler_for(addr, 1_000);

        let err = handler
            .handle(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, ProxyError::Upstream(_)));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }
}
