//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use shared::PaginatedResponse;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{
    AssignOrderRequest, Order, OrderCreateRequest, OrderStatus, OrderStatusUpdate, OrderView,
    PaymentFailureRequest, PaymentSuccessRequest,
};
use crate::db::repository::{OrderRepository, parse_record_id_for};
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

fn repo(state: &ServerState) -> OrderRepository {
    OrderRepository::new(state.get_db())
}

fn caller_id(user: &CurrentUser) -> AppResult<surrealdb::RecordId> {
    Ok(parse_record_id_for("user", &user.id)?)
}

/// POST /api/orders - convert the caller's cart into an order
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(req): Json<OrderCreateRequest>,
) -> AppResult<Json<OrderView>> {
    let user = caller_id(&current_user)?;
    let view = repo(&state)
        .create_from_cart(&user, req, state.config.shipping_charge)
        .await?;
    Ok(Json(view))
}

/// GET /api/orders/:order_id - order with line items
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(order_id): Path<String>,
) -> AppResult<Json<OrderView>> {
    let view = repo(&state).view(&order_id).await?;
    Ok(Json(view))
}

/// GET /api/orders/number/:order_number
pub async fn get_by_number(
    State(state): State<ServerState>,
    Path(order_number): Path<String>,
) -> AppResult<Json<Order>> {
    let order = repo(&state)
        .find_by_order_number(&order_number)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {}", order_number)))?;
    Ok(Json(order))
}

/// GET /api/orders/my-orders - caller's orders, newest first
pub async fn my_orders(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Order>>> {
    let user = caller_id(&current_user)?;
    let orders = repo(&state).find_by_user(&user).await?;
    Ok(Json(orders))
}

/// GET /api/orders/my-orders/paginated?page=&size=
pub async fn my_orders_paginated(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Query(params): Query<PageParams>,
) -> AppResult<Json<PaginatedResponse<Order>>> {
    let user = caller_id(&current_user)?;
    let page = params.page.unwrap_or(1).max(1);
    let size = params.size.unwrap_or(20).clamp(1, 100);

    let (orders, total) = repo(&state).find_by_user_page(&user, page, size).await?;
    Ok(Json(PaginatedResponse::new(orders, page, size, total)))
}

/// GET /api/orders/all - every order (admin)
pub async fn list_all(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Order>>> {
    current_user.ensure_admin()?;
    let orders = repo(&state).find_all().await?;
    Ok(Json(orders))
}

/// GET /api/orders/all/paginated?page=&size= (admin)
pub async fn list_all_paginated(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Query(params): Query<PageParams>,
) -> AppResult<Json<PaginatedResponse<Order>>> {
    current_user.ensure_admin()?;
    let page = params.page.unwrap_or(1).max(1);
    let size = params.size.unwrap_or(20).clamp(1, 100);

    let (orders, total) = repo(&state).find_all_page(page, size).await?;
    Ok(Json(PaginatedResponse::new(orders, page, size, total)))
}

/// GET /api/orders/status/:status (admin)
pub async fn list_by_status(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(status): Path<OrderStatus>,
) -> AppResult<Json<Vec<Order>>> {
    current_user.ensure_admin()?;
    let orders = repo(&state).find_by_status(status).await?;
    Ok(Json(orders))
}

/// PATCH /api/orders/:order_id/status (admin)
pub async fn update_status(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(order_id): Path<String>,
    Json(req): Json<OrderStatusUpdate>,
) -> AppResult<Json<Order>> {
    current_user.ensure_admin()?;
    let order = repo(&state).update_status(&order_id, req.status).await?;
    Ok(Json(order))
}

/// POST /api/orders/:order_id/cancel - owner-only, pre-shipment
pub async fn cancel(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(order_id): Path<String>,
) -> AppResult<Json<Order>> {
    let user = caller_id(&current_user)?;
    let order = repo(&state).cancel(&order_id, &user).await?;
    Ok(Json(order))
}

/// POST /api/orders/payment/success - gateway callback
pub async fn payment_success(
    State(state): State<ServerState>,
    Json(req): Json<PaymentSuccessRequest>,
) -> AppResult<Json<Order>> {
    let order = repo(&state)
        .payment_success(&req.payment_id, &req.transaction_id)
        .await?;
    Ok(Json(order))
}

/// POST /api/orders/payment/failure - gateway callback; restores stock
pub async fn payment_failure(
    State(state): State<ServerState>,
    Json(req): Json<PaymentFailureRequest>,
) -> AppResult<Json<Order>> {
    if let Some(reason) = &req.error_message {
        tracing::warn!(payment_id = %req.payment_id, reason = %reason, "Payment failure reported");
    }
    let order = repo(&state).payment_failure(&req.payment_id).await?;
    Ok(Json(order))
}

/// POST /api/orders/:order_id/assign/shg (admin)
pub async fn assign_to_shg(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(order_id): Path<String>,
    Json(req): Json<AssignOrderRequest>,
) -> AppResult<Json<Order>> {
    current_user.ensure_admin()?;
    let order = repo(&state).assign_to_shg(&order_id, &req.user_id).await?;
    Ok(Json(order))
}

/// POST /api/orders/:order_id/assign/delivery (admin)
pub async fn assign_to_delivery(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(order_id): Path<String>,
    Json(req): Json<AssignOrderRequest>,
) -> AppResult<Json<Order>> {
    current_user.ensure_admin()?;
    let order = repo(&state)
        .assign_to_delivery(&order_id, &req.user_id)
        .await?;
    Ok(Json(order))
}

/// GET /api/orders/shg/my-orders - orders assigned to the calling Didi
pub async fn shg_orders(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Order>>> {
    current_user.ensure_role(shared::Role::ShgDidi)?;
    let user = caller_id(&current_user)?;
    let orders = repo(&state).find_assigned_to_shg(&user).await?;
    Ok(Json(orders))
}

/// GET /api/orders/delivery/my-orders - orders assigned to the calling agent
pub async fn delivery_orders(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Order>>> {
    current_user.ensure_role(shared::Role::DeliveryBoy)?;
    let user = caller_id(&current_user)?;
    let orders = repo(&state).find_assigned_to_delivery(&user).await?;
    Ok(Json(orders))
}
