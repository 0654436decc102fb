use crate::models::kitchen::{ComponentKind, OrderType, TableRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComponentCount {
    pub name: String,
    pub quantity: u32,
}

/// What the pass handed over for one work item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PickupItemSummary {
    pub name: String,
    pub kind: ComponentKind,
    pub quantity: u32,
    pub category: String,
    pub kitchen: String,
    /// Prepared addons of the same line and kitchen, handed over with a main item.
    /// They have no record of their own.
    #[serde(default)]
    pub addons: Vec<ComponentCount>,
    #[serde(default)]
    pub combos: Vec<ComponentCount>,
}

/// Immutable record of a completed pickup.
///
/// The id is the storage key of the picked-up work item, so a retried write of the
/// same pickup lands on the same key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PickupRecord {
    pub id: String,
    pub order_id: Uuid,
    pub customer_name: String,
    pub order_type: OrderType,
    pub table: TableRef,
    pub items: Vec<PickupItemSummary>,
    pub picked_up_at: DateTime<Utc>,
}

impl PickupRecord {
    /// Timestamp as shown to operators, e.g. `2024-06-09 10:00:00` (UTC)
    pub fn timestamp_text(&self) -> String {
        self.picked_up_at.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Literal substring match against the timestamp text (e.g. "06-09")
    pub fn matches_date(&self, needle: &str) -> bool {
        self.timestamp_text().contains(needle)
    }

    pub fn involves_kitchen(&self, kitchen: &str) -> bool {
        self.items.iter().any(|item| item.kitchen == kitchen)
    }
}
