//! Cart API Handlers
//!
//! Every operation is scoped to the calling user's cart; the caller
//! identity comes in through the [`CurrentUser`] extractor and is
//! passed explicitly into the repository.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{CartItemAdd, CartItemQuantityUpdate, CartView};
use crate::db::repository::{CartRepository, parse_record_id_for};
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text};
use crate::utils::AppResult;

fn repo(state: &ServerState) -> CartRepository {
    CartRepository::new(state.get_db())
}

fn caller_id(user: &CurrentUser) -> AppResult<surrealdb::RecordId> {
    Ok(parse_record_id_for("user", &user.id)?)
}

/// GET /api/cart - the caller's cart with lines and totals
pub async fn get_cart(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<CartView>> {
    let user = caller_id(&current_user)?;
    let view = repo(&state).view(&user).await?;
    Ok(Json(view))
}

/// POST /api/cart/items - add a product (or increment its line)
pub async fn add_item(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(req): Json<CartItemAdd>,
) -> AppResult<Json<CartView>> {
    validate_optional_text(&req.customization_notes, "customization_notes", MAX_NOTE_LEN)?;

    let user = caller_id(&current_user)?;
    let view = repo(&state).add_item(&user, req).await?;
    Ok(Json(view))
}

/// PUT /api/cart/items/:item_id - change a line's quantity
pub async fn update_item_quantity(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(item_id): Path<String>,
    Json(req): Json<CartItemQuantityUpdate>,
) -> AppResult<Json<CartView>> {
    let user = caller_id(&current_user)?;
    let view = repo(&state)
        .update_item_quantity(&user, &item_id, req.quantity)
        .await?;
    Ok(Json(view))
}

/// DELETE /api/cart/items/:item_id
pub async fn remove_item(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(item_id): Path<String>,
) -> AppResult<Json<CartView>> {
    let user = caller_id(&current_user)?;
    let view = repo(&state).remove_item(&user, &item_id).await?;
    Ok(Json(view))
}

/// DELETE /api/cart - drop every line
pub async fn clear(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<CartView>> {
    let user = caller_id(&current_user)?;
    let view = repo(&state).clear(&user).await?;
    Ok(Json(view))
}

#[derive(Debug, Serialize)]
pub struct CartTotalResponse {
    pub total: f64,
}

/// GET /api/cart/total - Σ price_at_add × quantity
pub async fn total(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<CartTotalResponse>> {
    let user = caller_id(&current_user)?;
    let total = repo(&state).total(&user).await?;
    Ok(Json(CartTotalResponse { total }))
}

#[derive(Debug, Serialize)]
pub struct CartCountResponse {
    pub count: i32,
}

/// GET /api/cart/count - total quantity across lines
pub async fn count(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<CartCountResponse>> {
    let user = caller_id(&current_user)?;
    let view = repo(&state).view(&user).await?;
    Ok(Json(CartCountResponse {
        count: view.items_count,
    }))
}

/// POST /api/cart/merge/:cart_id - fold another cart into the caller's
pub async fn merge(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(cart_id): Path<String>,
) -> AppResult<Json<CartView>> {
    let user = caller_id(&current_user)?;
    let view = repo(&state).merge(&user, &cart_id).await?;
    Ok(Json(view))
}
