use chrono::{DateTime, Utc};
use galley_core::Money;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Portion sizes offered by sized items
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Size {
    #[serde(rename = "S")]
    Small,
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "L")]
    Large,
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Size::Small => "S",
            Size::Medium => "M",
            Size::Large => "L",
        };
        f.write_str(s)
    }
}

/// Size pricing. A missing price falls back to the base price shifted by the
/// configured size step (see `PricingEngine`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SizeVariant {
    pub enabled: bool,
    pub small_price: Option<Money>,
    pub medium_price: Option<Money>,
    pub large_price: Option<Money>,
}

impl SizeVariant {
    pub fn explicit_price(&self, size: Size) -> Option<Money> {
        match size {
            Size::Small => self.small_price,
            Size::Medium => self.medium_price,
            Size::Large => self.large_price,
        }
    }
}

/// An on/off modifier with a surcharge (ice, spicy)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ToggleOption {
    pub enabled: bool,
    pub price: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariantOption {
    pub name: String,
    #[serde(default)]
    pub price: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomVariantGroup {
    pub heading: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub options: Vec<VariantOption>,
}

fn enabled_by_default() -> bool {
    true
}

/// Time-limited replacement price for a menu item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Offer {
    pub price: Money,
    pub ends_at: DateTime<Utc>,
}

impl Offer {
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.ends_at > at
    }
}

/// An addon or combo: a nested menu item that only exists attached to a cart line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Component {
    pub name: String,
    #[serde(default)]
    pub base_price: Money,
    #[serde(default)]
    pub kitchen: Option<String>,
    #[serde(default)]
    pub size: SizeVariant,
    #[serde(default)]
    pub spicy: ToggleOption,
    #[serde(default)]
    pub custom_variants: Vec<CustomVariantGroup>,
}

impl Component {
    pub fn kitchen_name(&self) -> Option<&str> {
        non_blank(self.kitchen.as_deref())
    }

    pub fn find_variant(&self, option: &str) -> Option<(&CustomVariantGroup, &VariantOption)> {
        find_enabled_variant(&self.custom_variants, option)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MenuItem {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    #[serde(default = "uncategorized")]
    pub category: String,
    #[serde(default)]
    pub base_price: Money,
    #[serde(default)]
    pub kitchen: Option<String>,
    #[serde(default)]
    pub size: SizeVariant,
    #[serde(default)]
    pub ice: ToggleOption,
    #[serde(default)]
    pub spicy: ToggleOption,
    #[serde(default)]
    pub custom_variants: Vec<CustomVariantGroup>,
    #[serde(default)]
    pub addons: Vec<Component>,
    #[serde(default)]
    pub combos: Vec<Component>,
    #[serde(default)]
    pub offer: Option<Offer>,
}

fn uncategorized() -> String {
    "uncategorized".to_string()
}

impl MenuItem {
    pub fn kitchen_name(&self) -> Option<&str> {
        non_blank(self.kitchen.as_deref())
    }

    pub fn addon(&self, name: &str) -> Option<&Component> {
        self.addons.iter().find(|a| a.name == name)
    }

    pub fn combo(&self, name: &str) -> Option<&Component> {
        self.combos.iter().find(|c| c.name == name)
    }

    /// Look up an option among the item's enabled custom variant groups
    pub fn find_variant(&self, option: &str) -> Option<(&CustomVariantGroup, &VariantOption)> {
        find_enabled_variant(&self.custom_variants, option)
    }
}

fn find_enabled_variant<'a>(
    groups: &'a [CustomVariantGroup],
    option: &str,
) -> Option<(&'a CustomVariantGroup, &'a VariantOption)> {
    groups
        .iter()
        .filter(|g| g.enabled)
        .find_map(|g| g.options.iter().find(|o| o.name == option).map(|o| (g, o)))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|k| !k.is_empty())
}

/// Read-only menu lookup.
///
/// Backed by a cache of the external catalog service; a miss means the caller
/// referenced something that does not exist.
pub trait Catalog: Send + Sync {
    fn menu_item(&self, name: &str) -> Option<Arc<MenuItem>>;

    fn addon(&self, item: &str, addon: &str) -> Option<Component> {
        self.menu_item(item).and_then(|m| m.addon(addon).cloned())
    }

    fn combo(&self, item: &str, combo: &str) -> Option<Component> {
        self.menu_item(item).and_then(|m| m.combo(combo).cloned())
    }
}

/// Catalog-related errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Invalid menu definition: {0}")]
    Invalid(String),

    #[error("Failed to load menu: {0}")]
    Load(String),
}
