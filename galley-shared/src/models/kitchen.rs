use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Which part of a cart line a work item prepares
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentKind {
    Main,
    Addon,
    Combo,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Main => "main",
            ComponentKind::Addon => "addon",
            ComponentKind::Combo => "combo",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentKind {
    type Err = WorkItemIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" => Ok(ComponentKind::Main),
            "addon" => Ok(ComponentKind::Addon),
            "combo" => Ok(ComponentKind::Combo),
            other => Err(WorkItemIdError::UnknownKind(other.to_string())),
        }
    }
}

/// Preparation status of a single work item at its kitchen.
///
/// Statuses only ever move forward: `Pending → (Preparing) → Prepared → PickedUp`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum FulfillmentStatus {
    #[default]
    Pending,
    Preparing,
    Prepared,
    PickedUp,
}

impl FulfillmentStatus {
    /// Position in the lifecycle, used to check monotonicity
    pub fn rank(&self) -> u8 {
        match self {
            FulfillmentStatus::Pending => 0,
            FulfillmentStatus::Preparing => 1,
            FulfillmentStatus::Prepared => 2,
            FulfillmentStatus::PickedUp => 3,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FulfillmentStatus::PickedUp)
    }

    /// Whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: FulfillmentStatus) -> bool {
        use FulfillmentStatus::*;
        matches!(
            (self, next),
            (Pending, Preparing) | (Pending, Prepared) | (Preparing, Prepared) | (Prepared, PickedUp)
        )
    }
}

impl fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FulfillmentStatus::Pending => "Pending",
            FulfillmentStatus::Preparing => "Preparing",
            FulfillmentStatus::Prepared => "Prepared",
            FulfillmentStatus::PickedUp => "PickedUp",
        };
        f.write_str(s)
    }
}

/// Identity of a work item: unique within its cart line, and globally unique because
/// cart line ids are.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkItemId {
    pub cart_line_id: Uuid,
    pub kind: ComponentKind,
    pub component: String,
}

impl WorkItemId {
    pub fn new(cart_line_id: Uuid, kind: ComponentKind, component: impl Into<String>) -> Self {
        Self {
            cart_line_id,
            kind,
            component: component.into(),
        }
    }

    /// Key used by the external store and as the pickup record id
    pub fn storage_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for WorkItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.cart_line_id, self.kind, self.component)
    }
}

impl FromStr for WorkItemId {
    type Err = WorkItemIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // component names may themselves contain ':'
        let mut parts = s.splitn(3, ':');
        let line = parts.next().ok_or_else(|| WorkItemIdError::Malformed(s.to_string()))?;
        let kind = parts.next().ok_or_else(|| WorkItemIdError::Malformed(s.to_string()))?;
        let component = parts.next().ok_or_else(|| WorkItemIdError::Malformed(s.to_string()))?;

        let cart_line_id = Uuid::parse_str(line).map_err(|_| WorkItemIdError::Malformed(s.to_string()))?;
        Ok(Self {
            cart_line_id,
            kind: kind.parse()?,
            component: component.to_string(),
        })
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WorkItemIdError {
    #[error("Malformed work item id: {0}")]
    Malformed(String),

    #[error("Unknown component kind: {0}")]
    UnknownKind(String),
}

/// How the order leaves the restaurant
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderType {
    #[serde(rename = "Dine In")]
    DineIn,
    #[serde(rename = "Take Away")]
    TakeAway,
    #[serde(rename = "Delivery")]
    Delivery,
}

/// Where a finished order goes. Only dine-in orders have a table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "number", rename_all = "snake_case")]
pub enum TableRef {
    Table(String),
    TakeAway,
    Delivery,
}

impl TableRef {
    /// Derive the table reference from the order type, ignoring a table number
    /// on anything that is not dine-in.
    pub fn for_order(order_type: OrderType, table_number: Option<&str>) -> Self {
        match (order_type, table_number) {
            (OrderType::DineIn, Some(number)) if !number.trim().is_empty() => TableRef::Table(number.trim().to_string()),
            (OrderType::DineIn, _) => TableRef::Table("N/A".to_string()),
            (OrderType::TakeAway, _) => TableRef::TakeAway,
            (OrderType::Delivery, _) => TableRef::Delivery,
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableRef::Table(number) => write!(f, "Table {}", number),
            TableRef::TakeAway => f.write_str("Take Away"),
            TableRef::Delivery => f.write_str("Delivery"),
        }
    }
}
