//! Error types for forwarding operations and the server lifecycle.
//!
//! # Design Decisions
//! - Every forwarding failure is recovered at the handler boundary via `IntoResponse`
//! - Timeouts are distinct from other upstream failures and map to 504
//! - Relay failures happen after the response head is committed; they are only logged

use std::error::Error as StdError;
use std::fmt::Write as _;
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::config::loader::ConfigError;
use crate::net::listener::ListenerError;

/// Failure of a single forwarding operation.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The outbound request could not be built (malformed target URL).
    #[error("failed to construct upstream request: {0}")]
    Construction(#[from] axum::http::Error),

    /// The upstream round trip did not produce a response head in time.
    #[error("upstream request timed out after {0:?}")]
    UpstreamTimeout(Duration),

    /// The upstream round trip failed (connect, DNS, TLS, protocol).
    #[error("upstream request failed: {0}")]
    Upstream(#[source] hyper_util::client::legacy::Error),

    /// Streaming the response body to the caller failed part way.
    #[error("failed to relay response body: {0}")]
    Relay(#[source] axum::Error),
}

impl ProxyError {
    /// Status code presented to the caller when nothing was committed yet.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Construction(_) | ProxyError::Relay(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::Construction(_) => "construction",
            ProxyError::UpstreamTimeout(_) => "timeout",
            ProxyError::Upstream(_) => "upstream",
            ProxyError::Relay(_) => "relay",
        }
    }

    /// Error text including every source in the chain.
    ///
    /// hyper's client errors only say "client error (Connect)" at the top
    /// level, the useful part lives further down.
    pub fn describe(&self) -> String {
        let mut text = self.to_string();
        let mut source = self.source();
        // The first source is already rendered by the variant's message.
        if let Some(first) = source {
            source = first.source();
        }
        while let Some(err) = source {
            let _ = write!(text, ": {}", err);
            source = err.source();
        }
        text
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), self.describe()).into_response()
    }
}

/// Fatal errors surfaced by the server lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("failed to read local address: {0}")]
    LocalAddr(#[source] std::io::Error),
}
