//! `/auth` router: registration, login, profile, and address book.
//!
//! Login and registration issue the session token and set the `Ecommerce`
//! cookie (HttpOnly) plus the non-authoritative `role` hint cookie consumed
//! by the frontend routing layer. Logout is just cookie clearing; there is
//! no server-side revocation list.

use std::sync::Arc;

use {
    argon2::{
        Argon2,
        password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
    },
    axum::{
        Json, Router,
        extract::{Extension, Path, State},
        middleware::from_fn_with_state,
        response::IntoResponse,
        routing::{get, patch, post, put},
    },
    axum_extra::extract::cookie::{Cookie, CookieJar, SameSite},
    serde::Deserialize,
    tracing::info,
};

use {
    storefront_auth::{Identity, ROLE_COOKIE, SESSION_COOKIE},
    storefront_store::{NewAddress, NewUser, ProfilePatch, User},
};

use crate::{error::ApiError, middleware::authenticate, state::GatewayState};

pub fn router(state: Arc<GatewayState>) -> Router<Arc<GatewayState>> {
    let protected = Router::new()
        .route("/myProfile", get(my_profile))
        .route("/updateProfile", patch(update_profile))
        .route("/addAddress", post(add_address))
        .route("/address/{id}", put(update_address).delete(remove_address))
        .route_layer(from_fn_with_state(state, authenticate));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", get(logout))
        .route("/forgotPassword", post(forgot_password))
        .route("/create-password/{email}", post(create_password))
        .merge(protected)
}

// ── Request bodies ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: String,
    pub address: Option<NewAddress>,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailBody {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordBody {
    pub password: String,
}

// ── Credential hashing ───────────────────────────────────────────────────────

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|_| ApiError::Internal)
}

fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

// ── Session cookies ──────────────────────────────────────────────────────────

fn session_cookies(jar: CookieJar, token: String, role: &str) -> CookieJar {
    jar.add(
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    )
    .add(Cookie::build((ROLE_COOKIE, role.to_owned())).path("/"))
}

fn clear_session_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
        .remove(Cookie::build(ROLE_COOKIE).path("/"))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn register(
    State(state): State<Arc<GatewayState>>,
    jar: CookieJar,
    Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError> {
    if body.email.is_empty() || body.password.is_empty() {
        return Err(ApiError::BadRequest("email and password are required".into()));
    }

    let user = state
        .store
        .create_user(NewUser {
            first_name: body.first_name,
            last_name: body.last_name,
            email: body.email,
            password_hash: hash_password(&body.password)?,
            phone: body.phone,
            role: "user".into(),
            address: body.address,
        })
        .await?;

    let token = state.verifier.issue(&user.id, Some(&user.role))?;
    info!(user = %user.id, "user registered");
    Ok((session_cookies(jar, token, &user.role), Json(user)))
}

async fn login(
    State(state): State<Arc<GatewayState>>,
    jar: CookieJar,
    Json(body): Json<LoginBody>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .store
        .user_by_email(&body.email)
        .await?
        .ok_or(ApiError::BadCredentials)?;
    if !verify_password(&body.password, &user.password_hash) {
        return Err(ApiError::BadCredentials);
    }

    let token = state.verifier.issue(&user.id, Some(&user.role))?;
    info!(user = %user.id, "user logged in");
    Ok((session_cookies(jar, token, &user.role), Json(user)))
}

async fn logout(jar: CookieJar) -> impl IntoResponse {
    (
        clear_session_cookies(jar),
        Json(serde_json::json!({ "message": "Logged out.." })),
    )
}

async fn my_profile(
    State(state): State<Arc<GatewayState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .store
        .user_by_id(&identity.id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(user))
}

async fn update_profile(
    State(state): State<Arc<GatewayState>>,
    Extension(identity): Extension<Identity>,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.store.update_profile(&identity.id, patch).await?))
}

async fn add_address(
    State(state): State<Arc<GatewayState>>,
    Extension(identity): Extension<Identity>,
    Json(address): Json<NewAddress>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.store.add_address(&identity.id, address).await?))
}

async fn update_address(
    State(state): State<Arc<GatewayState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Json(address): Json<NewAddress>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(
        state.store.update_address(&identity.id, &id, address).await?,
    ))
}

async fn remove_address(
    State(state): State<Arc<GatewayState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.store.remove_address(&identity.id, &id).await?))
}

async fn forgot_password(Json(body): Json<EmailBody>) -> impl IntoResponse {
    // Mail delivery is out of scope; answer generically either way so the
    // endpoint does not leak which emails exist.
    info!(email = %body.email, "password reset requested");
    Json(serde_json::json!({
        "message": "If the account exists, a reset link has been sent.."
    }))
}

async fn create_password(
    State(state): State<Arc<GatewayState>>,
    Path(email): Path<String>,
    Json(body): Json<PasswordBody>,
) -> Result<impl IntoResponse, ApiError> {
    if body.password.is_empty() {
        return Err(ApiError::BadRequest("password is required".into()));
    }
    state
        .store
        .set_password(&email, &hash_password(&body.password)?)
        .await?;
    info!(email = %email, "password updated");
    Ok(Json(serde_json::json!({ "message": "Password updated.." })))
}
