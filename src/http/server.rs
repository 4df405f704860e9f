//! HTTP server setup and lifecycle.
//!
//! # Responsibilities
//! - Create the Axum Router with the forwarding handler as its only handler
//! - Accept connections on the bounded listener
//! - Serve HTTP/1.1 on each connection in its own task
//! - Graceful shutdown: stop accepting, drain until the deadline, abort the rest

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{body::Body, routing::any, Router};
use hyper::{body::Incoming, server::conn::http1, service::service_fn, Request};
use hyper_util::{
    rt::{TokioIo, TokioTimer},
    server::graceful::GracefulShutdown,
};
use tokio::task::JoinSet;
use tower::ServiceExt;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::error::ServerError;
use crate::http::forward::{forward, ForwardingHandler};
use crate::lifecycle::Shutdown;
use crate::net::connection::ConnectionTracker;
use crate::net::listener::Listener;

/// How [`ProxyServer::start`] finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Closed {
    /// Every in-flight connection finished within the deadline.
    Drained,
    /// The deadline elapsed; the remaining connections were aborted.
    Forced { aborted: u64 },
}

/// Reverse proxy server bound to a listening address.
pub struct ProxyServer {
    listener: Listener,
    router: Router,
    shutdown: Shutdown,
    connections: ConnectionTracker,
}

impl ProxyServer {
    /// Build the forwarding handler and bind the listener.
    pub async fn bind(config: &ProxyConfig) -> Result<Self, ServerError> {
        let handler = Arc::new(ForwardingHandler::new(&config.upstream)?);
        let listener = Listener::bind(&config.listener).await?;

        Ok(Self {
            listener,
            router: Self::build_router(handler),
            shutdown: Shutdown::new(),
            connections: ConnectionTracker::new(),
        })
    }

    fn build_router(handler: Arc<ForwardingHandler>) -> Router {
        Router::new()
            .route("/{*path}", any(forward))
            .route("/", any(forward))
            .with_state(handler)
            .layer(TraceLayer::new_for_http())
    }

    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }

    /// Handle used to stop the server; `trigger(deadline)` on it is the
    /// shutdown operation.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Serve until shutdown is triggered.
    ///
    /// Returns `Ok(Closed)` when shutdown completed; errors are fatal
    /// listener problems.
    pub async fn start(self) -> Result<Closed, ServerError> {
        let ProxyServer {
            listener,
            router,
            shutdown,
            connections: tracker,
        } = self;

        let mut signal = shutdown.subscribe();
        let graceful = GracefulShutdown::new();
        let mut tasks = JoinSet::new();
        let mut http = http1::Builder::new();
        http.timer(TokioTimer::new());

        tracing::info!(address = ?listener.local_addr().ok(), "HTTP server starting");

        let deadline = loop {
            tokio::select! {
                deadline = signal.recv() => break deadline,
                accepted = listener.accept() => {
                    let (stream, peer_addr, permit) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) if e.is_transient() => {
                            tracing::warn!(error = %e, "Accept failed");
                            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                            continue;
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Listener failed, stopping server");
                            return Err(e.into());
                        }
                    };

                    let guard = tracker.track();
                    let router = router.clone();
                    let service = service_fn(move |request: Request<Incoming>| {
                        router.clone().oneshot(request.map(Body::new))
                    });
                    let connection = graceful.watch(http.serve_connection(TokioIo::new(stream), service));

                    tasks.spawn(async move {
                        if let Err(e) = connection.await {
                            tracing::debug!(
                                connection_id = %guard.id(),
                                peer_addr = %peer_addr,
                                error = %e,
                                "Connection error"
                            );
                        }
                        drop(permit);
                        drop(guard);
                    });
                }
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        };

        // Stop accepting before draining.
        drop(listener);
        tracing::info!(
            in_flight = tracker.active_count(),
            deadline = ?deadline,
            "Draining connections"
        );

        let closed = match tokio::time::timeout(deadline, graceful.shutdown()).await {
            Ok(()) => Closed::Drained,
            Err(_) => {
                let aborted = tracker.active_count();
                tracing::warn!(aborted, "Shutdown deadline elapsed, closing remaining connections");
                Closed::Forced { aborted }
            }
        };
        tasks.shutdown().await;

        tracing::info!(outcome = ?closed, "HTTP server stopped");
        Ok(closed)
    }
}
