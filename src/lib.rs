//! Single-target HTTP reverse proxy library.
//!
//! Every inbound request is relayed to one fixed origin: hop-by-hop headers
//! are stripped, Host is rewritten to the origin's, the upstream call is
//! bounded by a timeout and the origin's response is streamed back.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use error::{ProxyError, ServerError};
pub use http::{Closed, ForwardingHandler, ProxyServer};
pub use lifecycle::Shutdown;
