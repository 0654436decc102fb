pub mod models;
pub mod pii;

pub use models::events::{PickupRecordedEvent, WorkItemTransitionedEvent};
pub use models::kitchen::{ComponentKind, FulfillmentStatus, OrderType, TableRef, WorkItemId, WorkItemIdError};
pub use models::pickup::{ComponentCount, PickupItemSummary, PickupRecord};
pub use pii::Masked;
