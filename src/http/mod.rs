//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (accept loop, hyper connection, Axum router)
//!     → forward.rs (one forwarding operation per request)
//!         → request.rs (outbound request, headers.rs filter, Host rewrite)
//!         → upstream client (bounded by the configured timeout)
//!         → response.rs (status, headers, streamed body)
//!     → Send to client
//! ```

pub mod forward;
pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use forward::ForwardingHandler;
pub use headers::{copy_headers, is_hop_by_hop, HOP_BY_HOP_HEADERS};
pub use request::Target;
pub use server::{Closed, ProxyServer};
