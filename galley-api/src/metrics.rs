use crate::{error::AppError, state::AppState};
use axum::{extract::State, http::header, response::IntoResponse, routing::get, Router};
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Counters scraped from `GET /metrics`
pub struct Metrics {
    registry: Registry,
    pub orders_placed: IntCounter,
    pub transitions: IntCounterVec,
    pub rejected_transitions: IntCounter,
    pub pickups: IntCounterVec,
    pub pending_sync: IntGauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("galley".to_string()), None)?;

        let orders_placed = IntCounter::new("orders_placed_total", "Orders submitted to the kitchens")?;
        let transitions = IntCounterVec::new(
            Opts::new("work_item_transitions_total", "Accepted work item transitions"),
            &["status"],
        )?;
        let rejected_transitions = IntCounter::new(
            "rejected_transitions_total",
            "Transitions refused because the work item was in the wrong state",
        )?;
        let pickups = IntCounterVec::new(Opts::new("pickups_total", "Pickup records by kitchen"), &["kitchen"])?;
        let pending_sync = IntGauge::new("pending_sync", "Events waiting for the persistence sink")?;

        registry.register(Box::new(orders_placed.clone()))?;
        registry.register(Box::new(transitions.clone()))?;
        registry.register(Box::new(rejected_transitions.clone()))?;
        registry.register(Box::new(pickups.clone()))?;
        registry.register(Box::new(pending_sync.clone()))?;

        Ok(Self {
            registry,
            orders_placed,
            transitions,
            rejected_transitions,
            pickups,
            pending_sync,
        })
    }

    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/metrics", get(scrape))
}

async fn scrape(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    state.metrics.pending_sync.set(state.tracker.pending_sync() as i64);
    let body = state.metrics.render()?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}
