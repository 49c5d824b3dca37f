//! Raw `Cookie` header parsing for the WebSocket handshake path.
//!
//! The HTTP path uses the structured cookie jar from the web framework; the
//! handshake only has the raw header, so the split into key/value pairs is
//! done by hand here.

/// Cookie carrying the signed session token.
pub const SESSION_COOKIE: &str = "Ecommerce";

/// Non-authoritative role hint read by the frontend routing layer. Never
/// consulted for authorization decisions; the decoded claim is the sole
/// source of truth.
pub const ROLE_COOKIE: &str = "role";

/// Extract the session token from a raw `Cookie` header value.
///
/// Returns `None` when the header holds no pair named [`SESSION_COOKIE`].
pub fn token_from_cookie_header(header: &str) -> Option<&str> {
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then_some(value)
    })
}
