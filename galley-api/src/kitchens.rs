use crate::{error::AppError, state::AppState};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use galley_order::KitchenOrderView;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct KitchensResponse {
    pub kitchens: Vec<String>,
    /// Kitchen a display opens on when none was chosen
    pub default: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdatedCount {
    pub updated: usize,
}

#[derive(Debug, Deserialize)]
pub struct BulkPickupRequest {
    pub order_ids: Vec<Uuid>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/kitchens", get(list_kitchens))
        .route("/v1/kitchens/{kitchen}/orders", get(kitchen_orders))
        .route("/v1/kitchens/{kitchen}/lines/{line_id}/prepared", post(mark_line_prepared))
        .route("/v1/kitchens/{kitchen}/bulk-pickup", post(bulk_pickup))
}

async fn list_kitchens(State(state): State<AppState>) -> Json<KitchensResponse> {
    let kitchens = state.tracker.kitchens();
    let default = kitchens.first().cloned();
    Json(KitchensResponse { kitchens, default })
}

async fn kitchen_orders(
    State(state): State<AppState>,
    Path(kitchen): Path<String>,
) -> Json<Vec<KitchenOrderView>> {
    Json(state.tracker.kitchen_view(&kitchen))
}

async fn mark_line_prepared(
    State(state): State<AppState>,
    Path((kitchen, line_id)): Path<(String, Uuid)>,
) -> Result<Json<UpdatedCount>, AppError> {
    let updated = state.tracker.mark_line_prepared(line_id, &kitchen)?;
    state
        .metrics
        .transitions
        .with_label_values(&["Prepared"])
        .inc_by(updated as u64);
    Ok(Json(UpdatedCount { updated }))
}

async fn bulk_pickup(
    State(state): State<AppState>,
    Path(kitchen): Path<String>,
    Json(req): Json<BulkPickupRequest>,
) -> Json<UpdatedCount> {
    let updated = state.tracker.bulk_pick_up(&req.order_ids, &kitchen);
    state
        .metrics
        .transitions
        .with_label_values(&["PickedUp"])
        .inc_by(updated as u64);
    state.metrics.pickups.with_label_values(&[kitchen.as_str()]).inc_by(updated as u64);
    Json(UpdatedCount { updated })
}
