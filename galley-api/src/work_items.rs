use crate::{error::AppError, state::AppState};
use axum::{extract::State, routing::post, Json, Router};
use galley_order::{FulfillmentError, WorkItem};
use galley_shared::{FulfillmentStatus, PickupRecord, WorkItemId};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    /// Storage key, `{cart_line_id}:{kind}:{component}`
    pub work_item: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/work-items/preparing", post(mark_preparing))
        .route("/v1/work-items/prepared", post(mark_prepared))
        .route("/v1/work-items/picked-up", post(mark_picked_up))
}

fn parse_id(req: &TransitionRequest) -> Result<WorkItemId, AppError> {
    Ok(req.work_item.parse::<WorkItemId>()?)
}

/// Count the outcome of a transition attempt
fn observe<T>(state: &AppState, status: FulfillmentStatus, result: &Result<T, FulfillmentError>) {
    match result {
        Ok(_) => state.metrics.transitions.with_label_values(&[status.to_string().as_str()]).inc(),
        Err(FulfillmentError::InvalidTransition { .. }) => state.metrics.rejected_transitions.inc(),
        Err(_) => {}
    }
}

async fn mark_preparing(
    State(state): State<AppState>,
    Json(req): Json<TransitionRequest>,
) -> Result<Json<WorkItem>, AppError> {
    let id = parse_id(&req)?;
    let result = state.tracker.mark_preparing(&id);
    observe(&state, FulfillmentStatus::Preparing, &result);
    Ok(Json(result?))
}

async fn mark_prepared(
    State(state): State<AppState>,
    Json(req): Json<TransitionRequest>,
) -> Result<Json<WorkItem>, AppError> {
    let id = parse_id(&req)?;
    let result = state.tracker.mark_prepared(&id);
    observe(&state, FulfillmentStatus::Prepared, &result);
    Ok(Json(result?))
}

async fn mark_picked_up(
    State(state): State<AppState>,
    Json(req): Json<TransitionRequest>,
) -> Result<Json<PickupRecord>, AppError> {
    let id = parse_id(&req)?;
    let kitchen = state.tracker.work_item(&id).map(|item| item.kitchen);
    let result = state.tracker.mark_picked_up(&id);
    observe(&state, FulfillmentStatus::PickedUp, &result);

    let record = result?;
    if let Some(kitchen) = kitchen {
        state.metrics.pickups.with_label_values(&[kitchen.as_str()]).inc();
    }
    Ok(Json(record))
}
