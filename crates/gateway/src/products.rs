//! `/products` router. Listing and deletion are public; creation sits
//! behind authentication plus the admin role gate.

use std::sync::Arc;

use {
    axum::{
        Json, Router,
        extract::{Path, Query, State},
        http::StatusCode,
        middleware::{from_fn, from_fn_with_state},
        response::IntoResponse,
        routing::{delete, get, post},
    },
    tracing::info,
};

use storefront_store::{NewProduct, Product, ProductPage, ProductQuery};

use crate::{
    error::ApiError,
    middleware::{authenticate, require_admin},
    state::GatewayState,
};

pub fn router(state: Arc<GatewayState>) -> Router<Arc<GatewayState>> {
    let admin = Router::new()
        .route("/create", post(create_product))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state, authenticate));

    Router::new()
        .route("/all", get(list_products))
        .route("/delete/{id}", delete(delete_product))
        .merge(admin)
}

fn validate_new_product(body: &NewProduct) -> Result<(), ApiError> {
    if body.title.is_empty() {
        return Err(ApiError::BadRequest("title is required".into()));
    }
    if !body.price.is_finite() || body.price < 0.0 {
        return Err(ApiError::BadRequest("price must not be negative".into()));
    }
    Ok(())
}

async fn create_product(
    State(state): State<Arc<GatewayState>>,
    Json(body): Json<NewProduct>,
) -> Result<impl IntoResponse, ApiError> {
    validate_new_product(&body)?;
    let product = state.store.create_product(body).await?;
    info!(product = %product.id, title = %product.title, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

async fn list_products(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ProductPage>, ApiError> {
    Ok(Json(state.store.list_products(query).await?))
}

async fn delete_product(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .store
        .product_by_id(&id)
        .await?
        .ok_or(ApiError::NotFound)?;
    state.store.delete_product(&id).await?;
    info!(product = %id, "product deleted");
    Ok(Json(product))
}
