use crate::models::{CartLine, ComponentLine, CustomVariantLine};
use galley_core::money::{present, times};
use galley_core::Money;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Subtotal, VAT and grand total of a set of lines
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub vat: Money,
    pub grand_total: Money,
}

impl OrderTotals {
    /// Rounded copy for display
    pub fn presented(&self) -> Self {
        Self {
            subtotal: present(self.subtotal),
            vat: present(self.vat),
            grand_total: present(self.grand_total),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowKind {
    Item,
    Ice,
    Spicy,
    CustomVariant,
    Addon,
    Combo,
    Size,
}

/// One row of the till's price breakdown, already rounded
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BreakdownRow {
    pub kind: RowKind,
    pub label: String,
    pub quantity: u64,
    pub unit_price: Money,
    pub amount: Money,
    /// Per-unit parts of an addon/combo row; informational, not added to the total
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<BreakdownRow>,
}

impl BreakdownRow {
    fn new(kind: RowKind, label: impl Into<String>, quantity: impl Into<u64>, unit_price: Money) -> Self {
        let quantity = quantity.into();
        Self {
            kind,
            label: label.into(),
            quantity,
            unit_price: present(unit_price),
            amount: present(unit_price * Money::from(quantity)),
            details: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineBreakdown {
    pub cart_line_id: Uuid,
    pub item_name: String,
    pub rows: Vec<BreakdownRow>,
    pub total: Money,
}

/// Line and order arithmetic. Pure; values stay unrounded until `presented`.
#[derive(Debug, Clone)]
pub struct PricingAggregator {
    vat_rate: Money,
}

impl Default for PricingAggregator {
    fn default() -> Self {
        Self {
            vat_rate: Money::new(10, 2),
        }
    }
}

impl PricingAggregator {
    pub fn new(vat_rate: Money) -> Self {
        Self { vat_rate }
    }

    /// `(base + ice + spicy + custom variants) * quantity + addons + combos`
    pub fn line_total(line: &CartLine) -> Money {
        let unit = line.base_price
            + line.ice_price
            + line.spicy_price
            + Self::custom_variants_total(&line.custom_variants);
        times(unit, line.quantity)
            + Self::components_total(&line.addons)
            + Self::components_total(&line.combos)
    }

    pub fn custom_variants_total(variants: &BTreeMap<String, CustomVariantLine>) -> Money {
        variants.values().map(CustomVariantLine::total).sum()
    }

    /// Addon/combo totals are per component quantity, independent of the line quantity
    pub fn components_total(components: &BTreeMap<String, ComponentLine>) -> Money {
        components.values().map(ComponentLine::total).sum()
    }

    /// Recompute every cached amount on a line
    pub(crate) fn refresh(line: &mut CartLine) {
        line.custom_variants_total = Self::custom_variants_total(&line.custom_variants);
        line.addons_total = Self::components_total(&line.addons);
        line.combos_total = Self::components_total(&line.combos);
        line.total_price = Self::line_total(line);
    }

    /// Whether the cached amounts agree with the line's own selections
    pub fn is_consistent(line: &CartLine) -> bool {
        line.custom_variants_total == Self::custom_variants_total(&line.custom_variants)
            && line.addons_total == Self::components_total(&line.addons)
            && line.combos_total == Self::components_total(&line.combos)
            && line.total_price == Self::line_total(line)
    }

    pub fn order_subtotal(lines: &[CartLine]) -> Money {
        lines.iter().map(Self::line_total).sum()
    }

    pub fn vat(&self, subtotal: Money) -> Money {
        subtotal * self.vat_rate
    }

    pub fn grand_total(&self, subtotal: Money) -> Money {
        subtotal + self.vat(subtotal)
    }

    pub fn totals(&self, lines: &[CartLine]) -> OrderTotals {
        let subtotal = Self::order_subtotal(lines);
        OrderTotals {
            subtotal,
            vat: self.vat(subtotal),
            grand_total: self.grand_total(subtotal),
        }
    }

    /// Display rows for one line: main item, modifiers, each variant and component
    pub fn breakdown(line: &CartLine) -> LineBreakdown {
        let mut rows = Vec::new();

        let label = match line.size {
            Some(size) => format!("{} ({})", line.item_name, size),
            None => line.item_name.clone(),
        };
        rows.push(BreakdownRow::new(RowKind::Item, label, line.quantity, line.base_price));
        if line.ice {
            rows.push(BreakdownRow::new(RowKind::Ice, "Ice", line.quantity, line.ice_price));
        }
        if line.spicy {
            rows.push(BreakdownRow::new(RowKind::Spicy, "Spicy", line.quantity, line.spicy_price));
        }
        for (name, variant) in &line.custom_variants {
            rows.push(BreakdownRow::new(
                RowKind::CustomVariant,
                format!("{}: {}", variant.heading, name),
                // per-line variant count times line count, which can exceed u32
                u64::from(variant.quantity) * u64::from(line.quantity),
                variant.unit_price,
            ));
        }
        for (kind, components) in [(RowKind::Addon, &line.addons), (RowKind::Combo, &line.combos)] {
            for (name, component) in components.iter().filter(|(_, c)| c.quantity > 0) {
                rows.push(component_row(kind, name, component));
            }
        }

        LineBreakdown {
            cart_line_id: line.id,
            item_name: line.item_name.clone(),
            rows,
            total: present(Self::line_total(line)),
        }
    }
}

fn component_row(kind: RowKind, name: &str, component: &ComponentLine) -> BreakdownRow {
    let mut row = BreakdownRow::new(kind, name, component.quantity, component.unit_price());

    let size_label = match component.size {
        Some(size) => format!("Size {}", size),
        None => "Base".to_string(),
    };
    row.details
        .push(BreakdownRow::new(RowKind::Size, size_label, component.quantity, component.size_price));
    if component.spicy {
        row.details
            .push(BreakdownRow::new(RowKind::Spicy, "Spicy", component.quantity, component.spicy_price));
    }
    for (option, price) in &component.custom_variants {
        row.details
            .push(BreakdownRow::new(RowKind::CustomVariant, option.clone(), component.quantity, *price));
    }
    row
}
