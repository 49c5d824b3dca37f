//! HTTP adapter for the session authenticator.
//!
//! `authenticate` halts the pipeline before any handler runs when the
//! session cookie is missing or fails verification; on success the decoded
//! [`Identity`] rides the request as an extension. `require_admin` layers the
//! role gate on top for privileged routes.

use std::sync::Arc;

use {
    axum::{
        Extension,
        extract::{Request, State},
        middleware::Next,
        response::Response,
    },
    axum_extra::extract::CookieJar,
};

use storefront_auth::{ADMIN_ROLE, AuthError, Identity, SESSION_COOKIE, require_role};

use crate::{error::ApiError, state::GatewayState};

/// Cookie-based authentication for HTTP routes.
pub async fn authenticate(
    State(state): State<Arc<GatewayState>>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value())
        .ok_or(AuthError::Unauthenticated)?;
    let identity = state.verifier.verify(token)?;
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Role gate over the already-decoded claim. Must be layered inside
/// `authenticate`; the `role` cookie is never consulted here.
pub async fn require_admin(
    Extension(identity): Extension<Identity>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    require_role(&identity, ADMIN_ROLE)?;
    Ok(next.run(req).await)
}
