pub mod auth;
pub mod invitation;
pub mod metrics;
pub mod password_reset;
pub mod sessions;

use axum::http::{header, HeaderMap};
use std::net::SocketAddr;

use crate::services::ClientContext;

/// Peer address and user agent of the caller, as stored on session rows.
pub(crate) fn client_context(addr: &SocketAddr, headers: &HeaderMap) -> ClientContext {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    ClientContext::new(addr.ip().to_string(), user_agent)
}
