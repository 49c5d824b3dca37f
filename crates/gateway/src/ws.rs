//! Handshake adapter for the session authenticator, plus the presence loop.
//!
//! Unlike the HTTP path, the handshake only sees the raw `Cookie` header, so
//! extraction is a manual parse; and unlike the HTTP path, verification
//! failures are deliberately conflated into one generic rejection. Missing
//! header and missing key keep their distinct messages.

use std::sync::Arc;

use {
    axum::{
        Json,
        extract::{
            State, WebSocketUpgrade,
            ws::{Message, WebSocket},
        },
        http::{HeaderMap, StatusCode, header},
        response::{IntoResponse, Response},
    },
    tracing::{info, warn},
    uuid::Uuid,
};

use storefront_auth::{Identity, TokenVerifier, token_from_cookie_header};

use crate::state::GatewayState;

// ── Handshake gate ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeError {
    NoCookies,
    NoToken,
    Authentication,
}

impl HandshakeError {
    pub fn message(self) -> &'static str {
        match self {
            Self::NoCookies => "No cookies found",
            Self::NoToken => "No token found",
            Self::Authentication => "Authentication error",
        }
    }
}

/// Decide whether a handshake carries a valid session credential.
///
/// Pure over the header map and the verifier; the connection is refused
/// before the upgrade when this fails, so no `connect` handling ever runs
/// for an unauthenticated socket.
pub fn authorize_handshake(
    headers: &HeaderMap,
    verifier: &TokenVerifier,
) -> Result<Identity, HandshakeError> {
    let cookies = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .ok_or(HandshakeError::NoCookies)?;
    let token = token_from_cookie_header(cookies).ok_or(HandshakeError::NoToken)?;
    verifier
        .verify(token)
        .map_err(|_| HandshakeError::Authentication)
}

pub async fn ws_upgrade_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<Arc<GatewayState>>,
) -> Response {
    match authorize_handshake(&headers, &state.verifier) {
        Ok(identity) => ws
            .on_upgrade(move |socket| handle_connection(socket, state, identity))
            .into_response(),
        Err(err) => {
            warn!(reason = err.message(), "websocket handshake refused");
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "message": err.message() })),
            )
                .into_response()
        },
    }
}

// ── Connection lifecycle ─────────────────────────────────────────────────────

async fn handle_connection(mut socket: WebSocket, state: Arc<GatewayState>, identity: Identity) {
    let conn_id = Uuid::new_v4().to_string();
    state.register_presence(&conn_id, identity.clone()).await;
    info!(user = %identity.id, conn_id = %conn_id, "user connected");

    // Presence channel only: drain frames until the peer goes away.
    while let Some(msg) = socket.recv().await {
        match msg {
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {},
        }
    }

    // The registered entry still carries the handshake identity.
    if let Some(entry) = state.remove_presence(&conn_id).await {
        info!(user = %entry.identity.id, conn_id = %conn_id, "user disconnected");
    }
}
