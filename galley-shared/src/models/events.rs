use crate::models::kitchen::{FulfillmentStatus, WorkItemId};
use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct WorkItemTransitionedEvent {
    pub work_item: WorkItemId,
    pub order_id: Uuid,
    pub kitchen: String,
    pub from: FulfillmentStatus,
    pub to: FulfillmentStatus,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct PickupRecordedEvent {
    pub record_id: String,
    pub order_id: Uuid,
    pub kitchen: String,
    pub timestamp: i64,
}
