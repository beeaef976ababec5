use std::net::{IpAddr, SocketAddr};

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tracing::debug;

pub const TRUE_CLIENT_IP: &str = "true-client-ip";
pub const X_REAL_IP: &str = "x-real-ip";
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_REQUEST_ID: &str = "x-request-id";

/// Address of the originating client, as resolved by `client_ip_middleware`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub IpAddr);

// Middleware resolving the client address from proxy headers, falling back to
// the socket peer when the server was started with connect info.
pub async fn client_ip_middleware(mut request: Request<Body>, next: Next) -> Response {
    if let Some(ip) = resolve_client_ip(&request) {
        request.extensions_mut().insert(ClientIp(ip));
    }

    next.run(request).await
}

pub fn resolve_client_ip<B>(request: &Request<B>) -> Option<IpAddr> {
    let headers = request.headers();

    header_ip(headers, TRUE_CLIENT_IP)
        .or_else(|| header_ip(headers, X_REAL_IP))
        .or_else(|| forwarded_for_ip(headers))
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
}

fn header_ip(headers: &HeaderMap, name: &str) -> Option<IpAddr> {
    let value = headers.get(name)?.to_str().ok()?;
    match value.trim().parse() {
        Ok(ip) => Some(ip),
        Err(_) => {
            debug!("Ignoring unparseable {} header: {}", name, value);
            None
        }
    }
}

// Only the left-most entry is the client; the rest are proxies.
fn forwarded_for_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let value = headers.get(X_FORWARDED_FOR)?.to_str().ok()?;
    value.split(',').next()?.trim().parse().ok()
}

/// Request id assigned by the request-id layer, if any.
pub fn request_id<B>(request: &Request<B>) -> Option<&str> {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
}
