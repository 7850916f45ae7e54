//! Orders API module

mod handler;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", order_routes())
}

fn order_routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create))
        .route("/my-orders", get(handler::my_orders))
        .route("/my-orders/paginated", get(handler::my_orders_paginated))
        .route("/all", get(handler::list_all))
        .route("/all/paginated", get(handler::list_all_paginated))
        .route("/number/{order_number}", get(handler::get_by_number))
        .route("/status/{status}", get(handler::list_by_status))
        .route("/payment/success", post(handler::payment_success))
        .route("/payment/failure", post(handler::payment_failure))
        .route("/shg/my-orders", get(handler::shg_orders))
        .route("/delivery/my-orders", get(handler::delivery_orders))
        .route("/{order_id}", get(handler::get_by_id))
        .route("/{order_id}/status", patch(handler::update_status))
        .route("/{order_id}/cancel", post(handler::cancel))
        .route("/{order_id}/assign/shg", post(handler::assign_to_shg))
        .route(
            "/{order_id}/assign/delivery",
            post(handler::assign_to_delivery),
        )
}
