use crate::metrics::Metrics;
use galley_catalog::{Catalog, PricingConfig, PricingEngine};
use galley_core::{Money, TransitionSink};
use galley_order::{CompositionEngine, FulfillmentTracker, OrderManager, PickupLedger, PricingAggregator};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<CompositionEngine>,
    pub orders: Arc<OrderManager>,
    pub tracker: Arc<FulfillmentTracker>,
    pub ledger: Arc<PickupLedger>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        pricing: PricingConfig,
        vat_rate: Money,
        ledger: Arc<PickupLedger>,
        sink: Option<Arc<dyn TransitionSink>>,
    ) -> Result<Self, prometheus::Error> {
        let engine = Arc::new(CompositionEngine::new(catalog, PricingEngine::new(pricing)));

        let tracker = FulfillmentTracker::new(Arc::clone(&ledger));
        let tracker = Arc::new(match sink {
            Some(sink) => tracker.with_sink(sink),
            None => tracker,
        });
        let orders = Arc::new(OrderManager::new(
            Arc::clone(&tracker),
            PricingAggregator::new(vat_rate),
        ));

        Ok(Self {
            engine,
            orders,
            tracker,
            ledger,
            metrics: Arc::new(Metrics::new()?),
        })
    }
}
