use crate::{cart::compose_cart, error::AppError, state::AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use galley_order::{OrderMeta, PlacedOrder, Selection, WorkItem};
use galley_shared::OrderType;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub customer_name: String,
    pub order_type: OrderType,
    pub table_number: Option<String>,
    pub selections: Vec<Selection>,
}

#[derive(Debug, Serialize)]
pub struct OrderProgress {
    pub order_id: Uuid,
    pub complete: bool,
    pub work_items: Vec<WorkItem>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/orders", post(place_order))
        .route("/v1/orders/{order_id}/work-items", get(order_work_items))
}

async fn place_order(
    State(state): State<AppState>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<PlacedOrder>), AppError> {
    if req.customer_name.trim().is_empty() {
        return Err(AppError::ValidationError("Customer name is required".to_string()));
    }

    let cart = compose_cart(&state.engine, &req.selections)?;
    let meta = OrderMeta::new(req.customer_name.trim(), req.order_type, req.table_number.as_deref());
    let placed = state.orders.place_order(meta, cart.into_lines())?;

    state.metrics.orders_placed.inc();
    Ok((StatusCode::CREATED, Json(placed)))
}

async fn order_work_items(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderProgress>, AppError> {
    let work_items = state.tracker.order_work_items(order_id)?;
    let complete = state.tracker.is_complete(order_id)?;
    Ok(Json(OrderProgress {
        order_id,
        complete,
        work_items,
    }))
}
