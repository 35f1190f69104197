//! Cart routes for the signed-in user.

use axum::{Json, extract::State};
use tracing::instrument;

use emporium_core::ProductId;

use super::{ApiJson, ApiPath};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::Cart;
use crate::services::CartService;
use crate::services::cart::CartLineInput;
use crate::state::AppState;

/// `GET /api/cart`
#[instrument(skip(state))]
pub async fn get_cart(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Cart>> {
    Ok(Json(CartService::new(state.store()).get(user).await?))
}

/// `POST /api/cart/add`
#[instrument(skip(state, input))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(input): ApiJson<CartLineInput>,
) -> Result<Json<Cart>> {
    Ok(Json(CartService::new(state.store()).add(user, &input).await?))
}

/// `PUT /api/cart/update`
#[instrument(skip(state, input))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(input): ApiJson<CartLineInput>,
) -> Result<Json<Cart>> {
    Ok(Json(
        CartService::new(state.store()).update(user, &input).await?,
    ))
}

/// `DELETE /api/cart/remove/{productId}`
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(product): ApiPath<ProductId>,
) -> Result<Json<Cart>> {
    Ok(Json(
        CartService::new(state.store()).remove(user, product).await?,
    ))
}
