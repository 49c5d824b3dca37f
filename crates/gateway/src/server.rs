use std::{net::SocketAddr, sync::Arc};

use {
    axum::{
        Json, Router,
        extract::State,
        http::HeaderValue,
        response::IntoResponse,
        routing::get,
    },
    tower_http::{
        cors::{AllowHeaders, AllowMethods, CorsLayer},
        trace::TraceLayer,
    },
    tracing::info,
};

use {storefront_auth::TokenVerifier, storefront_config::StorefrontConfig, storefront_store::Store};

use crate::{account, products, state::GatewayState, ws};

/// Build the gateway router (shared between production startup and tests).
pub fn build_app(state: Arc<GatewayState>, cors_origin: &str) -> anyhow::Result<Router> {
    let origin: HeaderValue = cors_origin
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid cors origin: {cors_origin}"))?;

    // Credentialed CORS: the session cookie must survive cross-origin calls
    // from the frontend, so no wildcards here.
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    Ok(Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws::ws_upgrade_handler))
        .nest("/auth", account::router(Arc::clone(&state)))
        .nest("/products", products::router(Arc::clone(&state)))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Start the storefront HTTP + WebSocket server.
pub async fn start_gateway(config: StorefrontConfig) -> anyhow::Result<()> {
    let verifier = TokenVerifier::with_ttl(
        &config.auth.secret,
        chrono::Duration::hours(config.auth.token_ttl_hours),
    );
    let store = Store::connect(&config.database.url).await?;
    let state = GatewayState::new(verifier, store);

    let app = build_app(Arc::clone(&state), &config.gateway.cors_origin)?;

    let addr: SocketAddr = format!("{}:{}", config.gateway.bind, config.gateway.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(version = %state.version, %addr, "storefront gateway listening");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn health_handler(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": state.version,
        "connections": state.presence_count().await,
    }))
}

#[cfg(test)]
mod tests {
    use {
        axum::body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        tower::ServiceExt,
    };

    use super::*;

    const ORIGIN: &str = "http://localhost:3000";

    async fn test_app() -> (Arc<GatewayState>, Router) {
        let state = GatewayState::new(
            TokenVerifier::new("test-secret"),
            Store::in_memory().await.unwrap(),
        );
        let app = build_app(Arc::clone(&state), ORIGIN).unwrap();
        (state, app)
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, Vec<String>, serde_json::Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            req = req.header(header::COOKIE, cookie);
        }
        let req = match body {
            Some(v) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(v.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let cookies = resp
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok().map(str::to_owned))
            .collect();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, cookies, json)
    }

    fn register_body(email: &str) -> serde_json::Value {
        serde_json::json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": email,
            "password": "hunter2",
            "phone": "555-0100",
            "address": { "house": "12 Main St", "zip": "12345", "city": "Springfield" }
        })
    }

    /// Pull the session cookie pair out of Set-Cookie headers.
    fn session_cookie(cookies: &[String]) -> String {
        cookies
            .iter()
            .find(|c| c.starts_with("Ecommerce="))
            .and_then(|c| c.split(';').next())
            .map(str::to_owned)
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (_, app) = test_app().await;
        let (status, _, body) = call(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["connections"], 0);
    }

    #[tokio::test]
    async fn register_sets_cookies_and_returns_user() {
        let (_, app) = test_app().await;
        let (status, cookies, body) =
            call(&app, "POST", "/auth/register", None, Some(register_body("ada@example.com"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "ada@example.com");
        assert!(body.get("password_hash").is_none());
        assert!(cookies.iter().any(|c| c.starts_with("Ecommerce=")));
        assert!(cookies.iter().any(|c| c.starts_with("role=user")));
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let (_, app) = test_app().await;
        call(&app, "POST", "/auth/register", None, Some(register_body("ada@example.com"))).await;
        let (status, _, _) =
            call(&app, "POST", "/auth/register", None, Some(register_body("ada@example.com"))).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn login_round_trip_and_profile() {
        let (_, app) = test_app().await;
        call(&app, "POST", "/auth/register", None, Some(register_body("ada@example.com"))).await;

        let (status, cookies, _) = call(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(serde_json::json!({ "email": "ada@example.com", "password": "hunter2" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let cookie = session_cookie(&cookies);
        let (status, _, profile) =
            call(&app, "GET", "/auth/myProfile", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["email"], "ada@example.com");
        assert_eq!(profile["addresses"][0]["city"], "Springfield");
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let (_, app) = test_app().await;
        call(&app, "POST", "/auth/register", None, Some(register_body("ada@example.com"))).await;
        let (status, _, _) = call(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(serde_json::json!({ "email": "ada@example.com", "password": "wrong" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn profile_without_cookie_is_unauthorized() {
        let (_, app) = test_app().await;
        let (status, _, body) = call(&app, "GET", "/auth/myProfile", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Unauthorized..");
    }

    #[tokio::test]
    async fn tampered_cookie_is_unauthorized() {
        let (_, app) = test_app().await;
        let forged = TokenVerifier::new("other-secret").issue("u-1", None).unwrap();
        let cookie = format!("Ecommerce={forged}");
        let (status, _, body) = call(&app, "GET", "/auth/myProfile", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid or expired token..");
    }

    #[tokio::test]
    async fn product_create_requires_admin_role() {
        let (state, app) = test_app().await;
        let product = serde_json::json!({ "title": "Red Mug", "price": 9.5 });

        let (status, _, _) = call(&app, "POST", "/products/create", None, Some(product.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let user_token = state.verifier.issue("u-1", Some("user")).unwrap();
        let cookie = format!("Ecommerce={user_token}");
        let (status, _, _) =
            call(&app, "POST", "/products/create", Some(&cookie), Some(product.clone())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let admin_token = state.verifier.issue("a-1", Some("admin")).unwrap();
        let cookie = format!("Ecommerce={admin_token}");
        let (status, _, created) =
            call(&app, "POST", "/products/create", Some(&cookie), Some(product)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["title"], "Red Mug");
    }

    #[tokio::test]
    async fn product_listing_is_public_and_filtered() {
        let (state, app) = test_app().await;
        let admin_token = state.verifier.issue("a-1", Some("admin")).unwrap();
        let cookie = format!("Ecommerce={admin_token}");
        for (title, price, category) in
            [("Red Mug", 9.5, "kitchen"), ("Desk Lamp", 35.0, "office")]
        {
            call(
                &app,
                "POST",
                "/products/create",
                Some(&cookie),
                Some(serde_json::json!({ "title": title, "price": price, "category": category })),
            )
            .await;
        }

        let (status, _, page) =
            call(&app, "GET", "/products/all?filter=kitchen&title=Mug", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["total"], 1);
        assert_eq!(page["items"][0]["title"], "Red Mug");
    }

    #[tokio::test]
    async fn address_book_lifecycle() {
        let (_, app) = test_app().await;
        let (_, cookies, _) =
            call(&app, "POST", "/auth/register", None, Some(register_body("ada@example.com"))).await;
        let cookie = session_cookie(&cookies);

        let (status, _, user) = call(
            &app,
            "POST",
            "/auth/addAddress",
            Some(&cookie),
            Some(serde_json::json!({
                "label": "work",
                "house": "1 Office Park",
                "city": "Springfield",
                "zip": "12346",
                "isDefault": true
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let addresses = user["addresses"].as_array().unwrap();
        assert_eq!(addresses.len(), 2);
        assert_eq!(
            addresses.iter().filter(|a| a["is_default"] == true).count(),
            1
        );

        let work_id = addresses
            .iter()
            .find(|a| a["label"] == "work")
            .and_then(|a| a["id"].as_str())
            .unwrap()
            .to_owned();

        let (status, _, user) = call(
            &app,
            "PUT",
            &format!("/auth/address/{work_id}"),
            Some(&cookie),
            Some(serde_json::json!({
                "label": "work",
                "house": "2 Office Park",
                "city": "Springfield",
                "zip": "12346",
                "isDefault": true
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let updated = user["addresses"]
            .as_array()
            .unwrap()
            .iter()
            .find(|a| a["label"] == "work")
            .unwrap()
            .clone();
        assert_eq!(updated["house"], "2 Office Park");
        assert_eq!(
            user["addresses"]
                .as_array()
                .unwrap()
                .iter()
                .filter(|a| a["is_default"] == true)
                .count(),
            1
        );

        let (status, _, user) = call(
            &app,
            "DELETE",
            &format!("/auth/address/{work_id}"),
            Some(&cookie),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user["addresses"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn logout_clears_the_session_cookies() {
        let (_, app) = test_app().await;
        let (status, cookies, _) = call(&app, "GET", "/auth/logout", None, None).await;
        assert_eq!(status, StatusCode::OK);
        // Removal cookies carry an empty value and an expiry in the past.
        assert!(cookies.iter().any(|c| c.starts_with("Ecommerce=;")));
        assert!(cookies.iter().any(|c| c.starts_with("role=;")));
    }
}
