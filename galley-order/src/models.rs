use chrono::{DateTime, Utc};
use galley_catalog::Size;
use galley_core::money::times;
use galley_core::Money;
use galley_shared::{ComponentKind, FulfillmentStatus, Masked, OrderType, TableRef, WorkItemId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A selected custom variant option on the main item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomVariantLine {
    pub heading: String,
    pub unit_price: Money,
    pub quantity: u32,
}

impl CustomVariantLine {
    pub fn total(&self) -> Money {
        times(self.unit_price, self.quantity)
    }
}

/// An addon or combo attached to a cart line, with its resolved unit price parts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentLine {
    pub quantity: u32,
    pub size: Option<Size>,
    pub spicy: bool,
    /// Selected variant options and their prices
    pub custom_variants: BTreeMap<String, Money>,
    pub kitchen: Option<String>,
    pub size_price: Money,
    pub spicy_price: Money,
    pub custom_variants_price: Money,
}

impl ComponentLine {
    pub fn unit_price(&self) -> Money {
        self.size_price + self.spicy_price + self.custom_variants_price
    }

    pub fn total(&self) -> Money {
        times(self.unit_price(), self.quantity)
    }
}

/// A fully priced cart line.
///
/// Every cached amount is a pure function of the other fields; lines are only ever
/// built or rebuilt by `CompositionEngine`, never patched field by field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartLine {
    pub id: Uuid,
    pub menu_item_id: Uuid,
    pub item_name: String,
    pub category: String,
    pub kitchen: Option<String>,
    pub quantity: u32,
    pub size: Option<Size>,
    pub ice: bool,
    pub spicy: bool,
    pub custom_variants: BTreeMap<String, CustomVariantLine>,
    pub addons: BTreeMap<String, ComponentLine>,
    pub combos: BTreeMap<String, ComponentLine>,

    pub base_price: Money,
    pub ice_price: Money,
    pub spicy_price: Money,
    pub custom_variants_total: Money,
    pub addons_total: Money,
    pub combos_total: Money,
    pub total_price: Money,

    pub priced_at: DateTime<Utc>,
}

impl CartLine {
    /// Per-unit price of the main item including its own modifiers
    pub fn unit_price(&self) -> Money {
        self.base_price + self.ice_price + self.spicy_price + self.custom_variants_total
    }
}

/// One unit of kitchen work: the main item, one addon or one combo of a cart line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkItem {
    pub id: WorkItemId,
    pub kitchen: String,
    pub quantity: u32,
    pub status: FulfillmentStatus,
}

impl WorkItem {
    pub fn new(id: WorkItemId, kitchen: impl Into<String>, quantity: u32) -> Self {
        Self {
            id,
            kitchen: kitchen.into(),
            quantity,
            status: FulfillmentStatus::Pending,
        }
    }

    pub fn name(&self) -> &str {
        &self.id.component
    }

    pub fn kind(&self) -> ComponentKind {
        self.id.kind
    }
}

/// Who the order is for and where it goes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderMeta {
    pub customer_name: Masked<String>,
    pub order_type: OrderType,
    pub table: TableRef,
    pub placed_at: DateTime<Utc>,
}

impl OrderMeta {
    pub fn new(customer_name: impl Into<String>, order_type: OrderType, table_number: Option<&str>) -> Self {
        Self {
            customer_name: Masked(customer_name.into()),
            order_type,
            table: TableRef::for_order(order_type, table_number),
            placed_at: Utc::now(),
        }
    }
}

/// An open order as one kitchen sees it: only the work items routed there
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KitchenOrderView {
    pub order_id: Uuid,
    pub meta: OrderMeta,
    pub work_items: Vec<WorkItem>,
}
