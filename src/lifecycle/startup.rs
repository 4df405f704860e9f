//! Startup orchestration.
//!
//! # Responsibilities
//! - Start the metrics exporter when enabled
//! - Bind the server, then wire termination signals to it
//! - Serve until shutdown and report how it ended

use crate::config::ProxyConfig;
use crate::error::ServerError;
use crate::http::server::{Closed, ProxyServer};
use crate::lifecycle::signals::spawn_signal_handler;
use crate::observability::metrics;

/// Run the relay until a termination signal has been handled.
///
/// `config` must already be validated.
pub async fn run(config: ProxyConfig) -> Result<Closed, ServerError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = ProxyServer::bind(&config).await?;

    tracing::info!(
        address = %server.local_addr().map_err(ServerError::LocalAddr)?,
        upstream = %config.upstream.target,
        timeout_ms = config.upstream.timeout_ms,
        "Starting reverse proxy"
    );

    spawn_signal_handler(server.shutdown_handle(), config.shutdown.grace_period());
    server.start().await
}
