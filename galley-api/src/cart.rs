use crate::{error::AppError, state::AppState};
use axum::{extract::State, routing::post, Json, Router};
use galley_catalog::PricingContext;
use galley_order::{Cart, CartLine, CompositionEngine, LineBreakdown, OrderTotals, PricingAggregator, Selection};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub selections: Vec<Selection>,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub lines: Vec<CartLine>,
    pub breakdowns: Vec<LineBreakdown>,
    pub totals: OrderTotals,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/cart/quote", post(quote))
}

/// Compose selections into priced lines, merging repeats of the same item and size
pub(crate) fn compose_cart(engine: &CompositionEngine, selections: &[Selection]) -> Result<Cart, AppError> {
    let context = PricingContext::default();
    let mut cart = Cart::new();
    for selection in selections {
        cart.add(engine, selection, &context)?;
    }
    Ok(cart)
}

async fn quote(
    State(state): State<AppState>,
    Json(req): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>, AppError> {
    let cart = compose_cart(&state.engine, &req.selections)?;
    let totals = state.orders.aggregator().totals(cart.lines()).presented();
    let breakdowns = cart.lines().iter().map(PricingAggregator::breakdown).collect();

    Ok(Json(QuoteResponse {
        lines: cart.into_lines(),
        breakdowns,
        totals,
    }))
}
