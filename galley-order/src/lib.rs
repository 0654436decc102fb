pub mod models;
pub mod composition;
pub mod changes;
pub mod totals;
pub mod routing;
pub mod fulfillment;
pub mod ledger;
pub mod manager;

pub use models::{CartLine, ComponentLine, CustomVariantLine, KitchenOrderView, OrderMeta, WorkItem};
pub use composition::{Cart, ComponentSelection, CompositionEngine, CompositionError, Selection};
pub use changes::{ChangeError, ChangeHandler};
pub use totals::{BreakdownRow, LineBreakdown, OrderTotals, PricingAggregator, RowKind};
pub use routing::{KitchenRouter, RoutingInconsistency};
pub use fulfillment::{FulfillmentError, FulfillmentTracker};
pub use ledger::{PickupLedger, PickupQuery, PickupSnapshot};
pub use manager::{OrderError, OrderManager, PlacedOrder};

#[cfg(test)]
mod test_support;
