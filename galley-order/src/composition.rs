use crate::models::{CartLine, ComponentLine, CustomVariantLine};
use crate::totals::PricingAggregator;
use galley_catalog::{Catalog, CustomVariantGroup, MenuItem, PricingContext, PricingEngine, Size, ToggleOption};
use galley_core::Money;
use galley_shared::ComponentKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use uuid::Uuid;

/// Addon or combo choices attached to a selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComponentSelection {
    #[serde(default = "one")]
    pub quantity: u32,
    #[serde(default)]
    pub size: Option<Size>,
    #[serde(default)]
    pub spicy: bool,
    #[serde(default)]
    pub custom_variants: BTreeSet<String>,
}

impl ComponentSelection {
    pub fn new(quantity: u32) -> Self {
        Self {
            quantity,
            size: None,
            spicy: false,
            custom_variants: BTreeSet::new(),
        }
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_spicy(mut self) -> Self {
        self.spicy = true;
        self
    }

    pub fn with_variant(mut self, option: impl Into<String>) -> Self {
        self.custom_variants.insert(option.into());
        self
    }
}

impl From<&ComponentLine> for ComponentSelection {
    fn from(line: &ComponentLine) -> Self {
        Self {
            quantity: line.quantity,
            size: line.size,
            spicy: line.spicy,
            custom_variants: line.custom_variants.keys().cloned().collect(),
        }
    }
}

/// What the till sends when an item is finalized: names only, no prices
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Selection {
    pub menu_item: String,
    #[serde(default = "one")]
    pub quantity: u32,
    #[serde(default)]
    pub size: Option<Size>,
    #[serde(default)]
    pub ice: bool,
    #[serde(default)]
    pub spicy: bool,
    /// Option name to quantity
    #[serde(default)]
    pub custom_variants: BTreeMap<String, u32>,
    #[serde(default)]
    pub addons: BTreeMap<String, ComponentSelection>,
    #[serde(default)]
    pub combos: BTreeMap<String, ComponentSelection>,
}

fn one() -> u32 {
    1
}

impl Selection {
    pub fn new(menu_item: impl Into<String>) -> Self {
        Self {
            menu_item: menu_item.into(),
            quantity: 1,
            size: None,
            ice: false,
            spicy: false,
            custom_variants: BTreeMap::new(),
            addons: BTreeMap::new(),
            combos: BTreeMap::new(),
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_ice(mut self) -> Self {
        self.ice = true;
        self
    }

    pub fn with_spicy(mut self) -> Self {
        self.spicy = true;
        self
    }

    pub fn with_variant(mut self, option: impl Into<String>, quantity: u32) -> Self {
        self.custom_variants.insert(option.into(), quantity);
        self
    }

    pub fn with_addon(mut self, name: impl Into<String>, addon: ComponentSelection) -> Self {
        self.addons.insert(name.into(), addon);
        self
    }

    pub fn with_combo(mut self, name: impl Into<String>, combo: ComponentSelection) -> Self {
        self.combos.insert(name.into(), combo);
        self
    }

    pub(crate) fn components_mut(&mut self, kind: ComponentKind) -> Option<&mut BTreeMap<String, ComponentSelection>> {
        match kind {
            ComponentKind::Main => None,
            ComponentKind::Addon => Some(&mut self.addons),
            ComponentKind::Combo => Some(&mut self.combos),
        }
    }
}

impl From<&CartLine> for Selection {
    fn from(line: &CartLine) -> Self {
        Self {
            menu_item: line.item_name.clone(),
            quantity: line.quantity,
            size: line.size,
            ice: line.ice,
            spicy: line.spicy,
            custom_variants: line
                .custom_variants
                .iter()
                .map(|(name, v)| (name.clone(), v.quantity))
                .collect(),
            addons: line.addons.iter().map(|(n, c)| (n.clone(), c.into())).collect(),
            combos: line.combos.iter().map(|(n, c)| (n.clone(), c.into())).collect(),
        }
    }
}

/// Turns selections into fully priced cart lines against the catalog
#[derive(Clone)]
pub struct CompositionEngine {
    catalog: Arc<dyn Catalog>,
    pricing: PricingEngine,
}

impl CompositionEngine {
    pub fn new(catalog: Arc<dyn Catalog>, pricing: PricingEngine) -> Self {
        Self { catalog, pricing }
    }

    /// Build a new cart line with a fresh id
    pub fn compose(&self, selection: &Selection, context: &PricingContext) -> Result<CartLine, CompositionError> {
        self.build(Uuid::new_v4(), selection, context)
    }

    /// Rebuild an existing line from its own selections, keeping its id
    pub fn reprice(&self, line: &CartLine, context: &PricingContext) -> Result<CartLine, CompositionError> {
        self.build(line.id, &Selection::from(line), context)
    }

    pub(crate) fn build(
        &self,
        id: Uuid,
        selection: &Selection,
        context: &PricingContext,
    ) -> Result<CartLine, CompositionError> {
        if selection.quantity < 1 {
            return Err(CompositionError::InvalidQuantity {
                target: selection.menu_item.clone(),
                quantity: selection.quantity,
            });
        }

        let item = self
            .catalog
            .menu_item(&selection.menu_item)
            .ok_or_else(|| CompositionError::unknown("menu item", &selection.menu_item))?;

        let size = resolve_size(&item.name, item.size.enabled, selection.size)?;
        let ice_price = toggle_price(&item.name, "ice", &item.ice, selection.ice)?;
        let spicy_price = toggle_price(&item.name, "spicy", &item.spicy, selection.spicy)?;

        let mut custom_variants = BTreeMap::new();
        for (option, &quantity) in &selection.custom_variants {
            if quantity < 1 {
                return Err(CompositionError::InvalidQuantity {
                    target: option.clone(),
                    quantity,
                });
            }
            let (group, choice) = item
                .find_variant(option)
                .ok_or_else(|| variant_error(&item.name, &item.custom_variants, option))?;
            custom_variants.insert(
                option.clone(),
                CustomVariantLine {
                    heading: group.heading.clone(),
                    unit_price: choice.price,
                    quantity,
                },
            );
        }

        let addons = self.compose_components(&item, ComponentKind::Addon, &selection.addons)?;
        let combos = self.compose_components(&item, ComponentKind::Combo, &selection.combos)?;

        let mut line = CartLine {
            id,
            menu_item_id: item.id,
            item_name: item.name.clone(),
            category: item.category.clone(),
            kitchen: item.kitchen_name().map(str::to_string),
            quantity: selection.quantity,
            size,
            ice: selection.ice,
            spicy: selection.spicy,
            custom_variants,
            addons,
            combos,
            base_price: self.pricing.item_unit_price(&item, size, context),
            ice_price,
            spicy_price,
            custom_variants_total: Money::ZERO,
            addons_total: Money::ZERO,
            combos_total: Money::ZERO,
            total_price: Money::ZERO,
            priced_at: context.timestamp,
        };
        PricingAggregator::refresh(&mut line);
        Ok(line)
    }

    fn compose_components(
        &self,
        item: &MenuItem,
        kind: ComponentKind,
        selections: &BTreeMap<String, ComponentSelection>,
    ) -> Result<BTreeMap<String, ComponentLine>, CompositionError> {
        let mut lines = BTreeMap::new();
        for (name, selected) in selections {
            let component = match kind {
                ComponentKind::Combo => item.combo(name),
                _ => item.addon(name),
            }
            .ok_or_else(|| CompositionError::unknown(kind.as_str(), name))?;

            let size = resolve_size(&component.name, component.size.enabled, selected.size)?;
            let spicy_price = toggle_price(&component.name, "spicy", &component.spicy, selected.spicy)?;

            let mut custom_variants = BTreeMap::new();
            for option in &selected.custom_variants {
                let (_, choice) = component
                    .find_variant(option)
                    .ok_or_else(|| variant_error(&component.name, &component.custom_variants, option))?;
                custom_variants.insert(option.clone(), choice.price);
            }
            let custom_variants_price: Money = custom_variants.values().sum();

            lines.insert(
                name.clone(),
                ComponentLine {
                    // zero is allowed here: the component stays on the line but is never routed
                    quantity: selected.quantity,
                    size,
                    spicy: selected.spicy,
                    custom_variants,
                    kitchen: component.kitchen_name().map(str::to_string),
                    size_price: self.pricing.component_size_price(component, size),
                    spicy_price,
                    custom_variants_price,
                },
            );
        }
        Ok(lines)
    }
}

/// Sized items default to medium; unsized items must not carry a size
fn resolve_size(owner: &str, enabled: bool, requested: Option<Size>) -> Result<Option<Size>, CompositionError> {
    match (enabled, requested) {
        (true, requested) => Ok(Some(requested.unwrap_or(Size::Medium))),
        (false, Some(_)) => Err(CompositionError::disabled(owner, "size")),
        (false, None) => Ok(None),
    }
}

fn toggle_price(owner: &str, option: &str, toggle: &ToggleOption, selected: bool) -> Result<Money, CompositionError> {
    match (selected, toggle.enabled) {
        (false, _) => Ok(Money::ZERO),
        (true, true) => Ok(toggle.price),
        (true, false) => Err(CompositionError::disabled(owner, option)),
    }
}

fn variant_error(owner: &str, groups: &[CustomVariantGroup], option: &str) -> CompositionError {
    let exists = groups
        .iter()
        .any(|g| g.options.iter().any(|o| o.name == option));
    if exists {
        CompositionError::disabled(owner, option)
    } else {
        CompositionError::unknown("custom variant", option)
    }
}

/// Working cart of the till, before submission
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compose a selection into the cart.
    ///
    /// A selection for the same item and size as an existing line replaces that line
    /// in place and keeps its id.
    pub fn add(
        &mut self,
        engine: &CompositionEngine,
        selection: &Selection,
        context: &PricingContext,
    ) -> Result<&CartLine, CompositionError> {
        let mut line = engine.compose(selection, context)?;

        let existing = self
            .lines
            .iter()
            .position(|l| l.item_name == line.item_name && l.size == line.size);
        let index = match existing {
            Some(index) => {
                line.id = self.lines[index].id;
                self.lines[index] = line;
                index
            }
            None => {
                self.lines.push(line);
                self.lines.len() - 1
            }
        };
        Ok(&self.lines[index])
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, id: Uuid) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.id == id)
    }

    /// Swap in a re-priced version of an existing line
    pub(crate) fn replace(&mut self, line: CartLine) -> bool {
        match self.lines.iter_mut().find(|l| l.id == line.id) {
            Some(slot) => {
                *slot = line;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: Uuid) -> Option<CartLine> {
        let index = self.lines.iter().position(|l| l.id == id)?;
        Some(self.lines.remove(index))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }
}

/// Local input errors from composing a selection
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompositionError {
    #[error("Unknown {kind}: {name}")]
    UnknownReference { kind: &'static str, name: String },

    #[error("Option '{option}' is not enabled on {item}")]
    DisabledOption { item: String, option: String },

    #[error("Invalid quantity {quantity} for {target}")]
    InvalidQuantity { target: String, quantity: u32 },
}

impl CompositionError {
    fn unknown(kind: &'static str, name: &str) -> Self {
        CompositionError::UnknownReference {
            kind,
            name: name.to_string(),
        }
    }

    fn disabled(item: &str, option: &str) -> Self {
        CompositionError::DisabledOption {
            item: item.to_string(),
            option: option.to_string(),
        }
    }
}
