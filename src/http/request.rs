//! Outbound request construction.
//!
//! # Responsibilities
//! - Hold the fixed origin base URL (`Target`)
//! - Build the outbound request from the inbound one
//! - Strip hop-by-hop headers and present the origin's own Host
//!
//! # Design Decisions
//! - The inbound request-target is appended to the target verbatim
//! - The inbound body is moved into the outbound request, never buffered
//! - The caller's Host header is always replaced

use axum::{
    body::Body,
    http::{header::HOST, HeaderValue, Request, Uri},
};

use crate::config::validation::{check_target, ValidationError};
use crate::error::ProxyError;
use crate::http::headers::copy_headers;

/// The origin base URL every request is forwarded to.
#[derive(Debug, Clone)]
pub struct Target {
    base: String,
    host: HeaderValue,
}

impl Target {
    /// Validate and parse a target base URL.
    pub fn parse(target: &str) -> Result<Self, ValidationError> {
        let url = check_target(target)?;

        // check_target guarantees a host; the port is only present when it
        // differs from the scheme default.
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(ValidationError::EmptyTarget),
        };
        let host = HeaderValue::from_str(&host).map_err(|e| ValidationError::InvalidTarget {
            value: target.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            base: target.to_string(),
            host,
        })
    }

    /// The base URL as configured.
    pub fn as_str(&self) -> &str {
        &self.base
    }

    /// Host header value presented to the origin.
    pub fn host(&self) -> &HeaderValue {
        &self.host
    }

    /// Concatenate the base URL and an inbound request-target.
    pub fn join(&self, request_target: &Uri) -> Result<Uri, axum::http::Error> {
        let joined = format!("{}{}", self.base, request_target);
        Ok(Uri::try_from(joined)?)
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.base)
    }
}

/// Turn an inbound request into the request sent to the origin.
///
/// Headers are filtered first, then Host is overwritten, so a Host copied
/// from the caller never survives.
pub fn build_outbound(target: &Target, inbound: Request<Body>) -> Result<Request<Body>, ProxyError> {
    let (parts, body) = inbound.into_parts();
    let uri = target.join(&parts.uri)?;

    let mut outbound = Request::builder()
        .method(parts.method)
        .uri(uri)
        .body(body)?;

    let headers = outbound.headers_mut();
    copy_headers(&parts.headers, headers);
    headers.insert(HOST, target.host().clone());

    Ok(outbound)
}
