//! Response relay.
//!
//! # Responsibilities
//! - Copy the origin's status and headers onto the caller's response
//! - Stream the origin's body through without buffering
//! - Surface mid-stream failures as `ProxyError::Relay`
//!
//! # Design Decisions
//! - Hop-by-hop stripping on the way back is configurable (on by default)
//! - The origin body is owned by the relayed body; dropping it closes the
//!   upstream stream on every exit path

use axum::{
    body::{Body, Bytes, HttpBody},
    http::Response,
    BoxError,
};
use futures_util::TryStreamExt;

use crate::error::ProxyError;
use crate::http::headers::copy_headers;

/// Convert an origin response into the response written to the caller.
pub fn relay<B>(upstream: Response<B>, filter_hop_by_hop: bool) -> Response<Body>
where
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    let (parts, body) = upstream.into_parts();

    let body = Body::new(body).into_data_stream().map_err(|err| {
        let err = ProxyError::Relay(err);
        tracing::warn!(error = %err, "Response body relay aborted");
        crate::observability::metrics::record_error(&err);
        err
    });

    let mut response = Response::new(Body::from_stream(body));
    if filter_hop_by_hop {
        copy_headers(&parts.headers, response.headers_mut());
    } else {
        *response.headers_mut() = parts.headers;
    }
    *response.status_mut() = parts.status;

    response
}
