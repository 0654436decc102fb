use crate::fulfillment::{FulfillmentError, FulfillmentTracker};
use crate::models::{CartLine, OrderMeta, WorkItem};
use crate::routing::{KitchenRouter, RoutingInconsistency};
use crate::totals::{OrderTotals, PricingAggregator};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Result of submitting an order to the kitchens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub order_id: Uuid,
    pub work_items: Vec<WorkItem>,
    /// Components that could not be routed and are not tracked
    pub skipped: Vec<RoutingInconsistency>,
    pub totals: OrderTotals,
}

/// Order intake: validates finalized lines, routes them and seeds the tracker
pub struct OrderManager {
    tracker: Arc<FulfillmentTracker>,
    aggregator: PricingAggregator,
}

impl OrderManager {
    pub fn new(tracker: Arc<FulfillmentTracker>, aggregator: PricingAggregator) -> Self {
        Self { tracker, aggregator }
    }

    pub fn tracker(&self) -> &Arc<FulfillmentTracker> {
        &self.tracker
    }

    pub fn aggregator(&self) -> &PricingAggregator {
        &self.aggregator
    }

    pub fn place_order(&self, meta: OrderMeta, lines: Vec<CartLine>) -> Result<PlacedOrder, OrderError> {
        if lines.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        if let Some(line) = lines.iter().find(|l| !PricingAggregator::is_consistent(l)) {
            return Err(OrderError::PriceMismatch(line.id));
        }

        let order_id = Uuid::new_v4();
        let (work_items, skipped) = KitchenRouter::route_all(&lines);
        let totals = self.aggregator.totals(&lines).presented();

        tracing::info!(
            %order_id,
            customer = %meta.customer_name,
            table = %meta.table,
            lines = lines.len(),
            work_items = work_items.len(),
            "Order placed"
        );
        self.tracker.seed(order_id, meta, lines, work_items.clone())?;

        Ok(PlacedOrder {
            order_id,
            work_items,
            skipped,
            totals,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order has no lines")]
    EmptyOrder,

    #[error("Cart line {0} has stale prices")]
    PriceMismatch(Uuid),

    #[error(transparent)]
    Fulfillment(#[from] FulfillmentError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::PickupLedger;
    use crate::test_support::burger_line;
    use galley_core::Money;
    use galley_shared::{FulfillmentStatus, OrderType};

    fn manager() -> OrderManager {
        let tracker = Arc::new(FulfillmentTracker::new(Arc::new(PickupLedger::new())));
        OrderManager::new(tracker, PricingAggregator::default())
    }

    #[test]
    fn test_place_order_seeds_pending_work() {
        let manager = manager();
        let meta = OrderMeta::new("Asha", OrderType::DineIn, Some("4"));

        let placed = manager.place_order(meta, vec![burger_line()]).unwrap();
        assert_eq!(placed.work_items.len(), 3);
        assert!(placed.skipped.is_empty());
        assert_eq!(placed.totals.subtotal, Money::from(540));
        assert_eq!(placed.totals.grand_total, Money::from(594));

        let tracked = manager.tracker().order_work_items(placed.order_id).unwrap();
        assert_eq!(tracked, placed.work_items);
        assert!(tracked.iter().all(|w| w.status == FulfillmentStatus::Pending));
    }

    #[test]
    fn test_rejects_empty_and_tampered_orders() {
        let manager = manager();
        let meta = OrderMeta::new("Asha", OrderType::TakeAway, None);

        assert!(matches!(
            manager.place_order(meta.clone(), vec![]),
            Err(OrderError::EmptyOrder)
        ));

        let mut line = burger_line();
        line.total_price = Money::from(1);
        assert!(matches!(
            manager.place_order(meta, vec![line]),
            Err(OrderError::PriceMismatch(_))
        ));
    }

    #[test]
    fn test_resubmitting_lines_is_rejected() {
        let manager = manager();
        let line = burger_line();
        let meta = OrderMeta::new("Asha", OrderType::Delivery, None);

        manager.place_order(meta.clone(), vec![line.clone()]).unwrap();
        assert!(matches!(
            manager.place_order(meta, vec![line]),
            Err(OrderError::Fulfillment(FulfillmentError::DuplicateLine(_)))
        ));
    }
}
