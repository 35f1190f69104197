//! Catalog routes. Listing is public; changes need a bearer token.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use tracing::instrument;

use emporium_core::ProductId;

use super::{ApiJson, ApiPath, MessageResponse};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{Product, ProductInput};
use crate::services::CatalogService;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProductCreated {
    pub message: &'static str,
    pub product: Product,
}

fn catalog(state: &AppState) -> CatalogService<'_> {
    CatalogService::new(state.store(), state.config().catalog_admin_only)
}

/// `GET /api/products`
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(catalog(&state).list().await?))
}

/// `POST /api/products`
#[instrument(skip(state, input))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<(StatusCode, Json<ProductCreated>)> {
    let product = catalog(&state).create(user, &input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ProductCreated {
            message: "Product added successfully",
            product,
        }),
    ))
}

/// `DELETE /api/products/{id}`
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<MessageResponse>> {
    catalog(&state).delete(user, id).await?;
    Ok(Json(MessageResponse::new("Product deleted successfully")))
}
