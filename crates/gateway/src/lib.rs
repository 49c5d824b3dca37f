//! Gateway: storefront HTTP + WebSocket server.
//!
//! Lifecycle:
//! 1. Load + validate config
//! 2. Build the token verifier and connect the store
//! 3. Start the HTTP server (health, auth, products)
//! 4. Attach the cookie-gated WebSocket upgrade handler
//!
//! The session-authentication contract lives in `storefront-auth`; this
//! crate only adapts it to the two transports (request middleware and the
//! handshake gate in `ws.rs`).

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod account;
pub mod error;
pub mod middleware;
pub mod products;
pub mod server;
pub mod state;
pub mod ws;
