//! Session authentication shared by the HTTP middleware and the WebSocket
//! handshake.
//!
//! Both transports consume the same verification primitive
//! ([`TokenVerifier::verify`]); they differ only in how the raw token is
//! extracted (structured cookie accessor vs. manual header parse) and in how
//! a rejection is surfaced (response status vs. refused upgrade). The
//! primitive itself is pure: no I/O, no shared mutable state, same claim out
//! for the same token in.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod claims;
pub mod cookie;
pub mod error;
pub mod verifier;

pub use {
    claims::{Identity, SessionClaims},
    cookie::{ROLE_COOKIE, SESSION_COOKIE, token_from_cookie_header},
    error::AuthError,
    verifier::TokenVerifier,
};

/// Role required by the admin gate.
pub const ADMIN_ROLE: &str = "admin";

/// Pure predicate over an already-decoded claim. Layered after
/// authentication on privileged HTTP routes; never consults the `role`
/// cookie, which is a routing hint only.
pub fn require_role(identity: &Identity, expected: &str) -> Result<(), AuthError> {
    match identity.role.as_deref() {
        Some(role) if role == expected => Ok(()),
        _ => Err(AuthError::Forbidden),
    }
}
