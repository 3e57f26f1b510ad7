//! Outbound request rewriting.
//!
//! # Responsibilities
//! - Retarget the request URI to the upstream scheme and authority
//! - Send the *original* inbound Host upstream, so virtual hosting keyed on
//!   the client-visible name keeps working
//! - Strip the client's Accept-Encoding so response bodies arrive in a form
//!   the rewriter can tokenize
//! - Strip hop-by-hop headers, including everything the Connection header
//!   nominates
//! - Record the original client in X-Forwarded-For/-Host/-Proto
//!
//! # Design Decisions
//! - Pure header/URI surgery on the request in place; this step cannot fail
//! - X-Forwarded-For appends to an inbound chain rather than replacing it

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{Request, Uri};

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Hop-by-hop headers never forwarded upstream (RFC 9110 §7.6.1).
static HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Rewrite an inbound request in place so it targets the configured
/// upstream. Anything that cannot be represented as a header value is left
/// out rather than failing the request.
pub fn rewrite_for_upstream(
    req: &mut Request<Body>,
    scheme: &Scheme,
    authority: &Authority,
    client: SocketAddr,
) {
    let original_host = original_host(req);

    retarget_uri(req, scheme, authority);

    let headers = req.headers_mut();
    strip_hop_by_hop(headers);
    headers.remove(header::ACCEPT_ENCODING);

    if let Some(host) = original_host {
        headers.insert(header::HOST, host.clone());
        headers.insert(X_FORWARDED_HOST, host);
    }

    let forwarded_for = match headers.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(chain) => format!("{chain}, {}", client.ip()),
        None => client.ip().to_string(),
    };
    if let Ok(value) = HeaderValue::from_str(&forwarded_for) {
        headers.insert(X_FORWARDED_FOR, value);
    }
    headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("http"));
}

/// The host the client addressed: the Host header for HTTP/1.1, the URI
/// authority for HTTP/2.
fn original_host(req: &Request<Body>) -> Option<HeaderValue> {
    if let Some(host) = req.headers().get(header::HOST) {
        return Some(host.clone());
    }
    req.uri()
        .authority()
        .and_then(|a| HeaderValue::from_str(a.as_str()).ok())
}

/// Replace scheme and authority, keeping the inbound path and query.
fn retarget_uri(req: &mut Request<Body>, scheme: &Scheme, authority: &Authority) {
    let mut parts = req.uri().clone().into_parts();
    parts.scheme = Some(scheme.clone());
    parts.authority = Some(authority.clone());
    if parts.path_and_query.is_none() {
        parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    if let Ok(uri) = Uri::from_parts(parts) {
        *req.uri_mut() = uri;
    }
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    // Headers the Connection header nominates are hop-by-hop too.
    let nominated: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| name.trim().parse::<HeaderName>().ok())
        .collect();
    for name in nominated {
        headers.remove(name);
    }
    for name in &HOP_BY_HOP {
        headers.remove(name);
    }
}
