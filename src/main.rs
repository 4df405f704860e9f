//! Single-target reverse proxy.
//!
//! ```text
//!     Client ──▶ listener ──▶ forwarding handler ──▶ Origin (fixed target)
//!            ◀── streamed response ◀─────────────────
//! ```
//!
//! Configuration comes from built-in defaults, an optional TOML file and
//! command line flags, in increasing order of precedence.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use relay_proxy::config::loader::{read_config, ConfigError};
use relay_proxy::config::validation::validate_config;
use relay_proxy::config::ProxyConfig;
use relay_proxy::lifecycle::startup;
use relay_proxy::observability::logging::init_logging;
use relay_proxy::Closed;

#[derive(Parser, Debug)]
#[command(name = "relay-proxy", version)]
#[command(about = "Reverse proxy forwarding every request to a single origin server", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address for the reverse proxy to listen on [default: 127.0.0.1:8080]
    #[arg(long)]
    address: Option<String>,

    /// Origin server to which the proxy forwards requests [default: https://example.com]
    #[arg(long)]
    target: Option<String>,

    /// Timeout for requests to the origin server, in milliseconds [default: 10000]
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Log level when RUST_LOG is not set [default: info]
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn resolve_config(&self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => ProxyConfig::default(),
        };

        if let Some(address) = &self.address {
            config.listener.bind_address = address.clone();
        }
        if let Some(target) = &self.target {
            config.upstream.target = target.clone();
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.upstream.timeout_ms = timeout_ms;
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.observability);
    tracing::info!("relay-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    match startup::run(config).await {
        Ok(Closed::Drained) => {
            tracing::info!("Server closed");
            ExitCode::SUCCESS
        }
        Ok(Closed::Forced { aborted }) => {
            tracing::warn!(aborted, "Server closed with connections still in flight");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Error starting server");
            ExitCode::FAILURE
        }
    }
}
