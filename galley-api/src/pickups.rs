use crate::state::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use galley_shared::PickupRecord;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Window {
    /// The ledger's rolling window
    #[default]
    #[serde(alias = "last_hour")]
    Recent,
    All,
}

#[derive(Debug, Deserialize)]
pub struct PickupParams {
    #[serde(default)]
    pub window: Window,
    pub kitchen: Option<String>,
    /// Substring of `YYYY-MM-DD HH:MM:SS`; matches are listed first
    pub date: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/pickups", get(list_pickups))
}

async fn list_pickups(
    State(state): State<AppState>,
    Query(params): Query<PickupParams>,
) -> Json<Vec<PickupRecord>> {
    let kitchen = params.kitchen.as_deref().filter(|k| !k.is_empty());
    let date = params.date.as_deref().filter(|d| !d.is_empty());

    let records = match params.window {
        Window::Recent => state.ledger.recent(Utc::now(), kitchen, date),
        Window::All => state.ledger.all_time(kitchen, date),
    };
    Json(records)
}
