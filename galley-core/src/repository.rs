use async_trait::async_trait;
use galley_shared::{FulfillmentStatus, PickupRecord, PickupRecordedEvent, WorkItemId, WorkItemTransitionedEvent};
use crate::CoreResult;

/// Key-based store for work item status.
///
/// Writes may be delivered more than once; implementations must treat a repeated
/// write of the same key and status as a no-op.
#[async_trait]
pub trait WorkItemStore: Send + Sync {
    async fn put_status(
        &self,
        id: &WorkItemId,
        status: FulfillmentStatus,
    ) -> CoreResult<()>;
}

/// Append-only store for pickup records, keyed by record id
#[async_trait]
pub trait PickupStore: Send + Sync {
    /// Returns `false` when a record with the same id already exists
    async fn put_pickup(
        &self,
        record: &PickupRecord,
    ) -> CoreResult<bool>;

    async fn list_pickups(&self) -> CoreResult<Vec<PickupRecord>>;
}

/// Receives state changes from the fulfillment tracker.
///
/// Called synchronously from inside a transition, after the in-memory state has
/// changed, so implementations must only enqueue and never block on I/O.
pub trait TransitionSink: Send + Sync {
    fn status_changed(&self, event: &WorkItemTransitionedEvent) -> CoreResult<()>;

    fn pickup_recorded(&self, record: &PickupRecord, event: &PickupRecordedEvent) -> CoreResult<()>;

    /// Hand writes that were accepted earlier but later failed downstream back to the
    /// sink's queue. Returns how many were requeued.
    fn redeliver(&self) -> usize {
        0
    }

    /// Accepted writes that have not reached the store yet and need `redeliver`
    fn backlog(&self) -> usize {
        0
    }
}
