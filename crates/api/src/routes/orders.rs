//! Order routes for the signed-in user.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use emporium_core::OrderId;

use super::{ApiJson, ApiPath};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::Order;
use crate::services::checkout::CheckoutInput;
use crate::services::{CheckoutService, OrderService};
use crate::state::AppState;

/// `GET /api/orders`
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(OrderService::new(state.store()).list(user).await?))
}

/// `POST /api/orders/create`
#[instrument(skip(state, input))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(input): ApiJson<CheckoutInput>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = CheckoutService::new(state.store())
        .place_order(user, &input)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// `GET /api/orders/{orderId}`
#[instrument(skip(state))]
pub async fn get_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<Order>> {
    Ok(Json(OrderService::new(state.store()).get(user, id).await?))
}
