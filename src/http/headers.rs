//! Hop-by-hop header filtering.
//!
//! # Responsibilities
//! - Classify header names as hop-by-hop or end-to-end
//! - Copy only end-to-end headers between header maps
//!
//! # Design Decisions
//! - The hop-by-hop set is a fixed constant, compared case-insensitively
//! - Every value of a multi-valued header is kept, in original order
//! - The source map is never modified

use axum::http::HeaderMap;

/// Headers that only make sense for a single connection leg.
pub const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

/// Check if a header is a hop-by-hop header that must not be forwarded.
pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP_HEADERS
        .iter()
        .any(|h| name.eq_ignore_ascii_case(h))
}

/// Append every end-to-end header of `src` to `dst`.
///
/// Values of hop-by-hop headers are dropped silently.
pub fn copy_headers(src: &HeaderMap, dst: &mut HeaderMap) {
    for name in src.keys() {
        if is_hop_by_hop(name.as_str()) {
            continue;
        }
        for value in src.get_all(name) {
            dst.append(name.clone(), value.clone());
        }
    }
}
