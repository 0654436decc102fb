use axum::{http::Method, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod cart;
pub mod error;
pub mod kitchens;
pub mod metrics;
pub mod orders;
pub mod pickups;
pub mod state;
pub mod work_items;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // the till and kitchen displays are served from other origins
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .route("/health", get(health))
        .merge(cart::routes())
        .merge(orders::routes())
        .merge(kitchens::routes())
        .merge(work_items::routes())
        .merge(pickups::routes())
        .merge(metrics::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
