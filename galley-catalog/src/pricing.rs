use crate::product::{Component, MenuItem, Size, SizeVariant};
use chrono::{DateTime, Utc};
use galley_core::Money;
use serde::{Deserialize, Serialize};

/// Context for unit-price resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingContext {
    /// Instant used to decide whether a timed offer is active
    pub timestamp: DateTime<Utc>,
}

impl Default for PricingContext {
    fn default() -> Self {
        Self { timestamp: Utc::now() }
    }
}

impl PricingContext {
    pub fn at(timestamp: DateTime<Utc>) -> Self {
        Self { timestamp }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Difference between adjacent sizes when the catalog omits a size price
    pub size_step: Money,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            size_step: Money::from(10),
        }
    }
}

/// Resolves catalog unit prices (size, offer, modifiers) for a given instant
#[derive(Debug, Clone, Default)]
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn is_offer_active(&self, item: &MenuItem, context: &PricingContext) -> bool {
        item.offer
            .as_ref()
            .map(|o| o.is_active_at(context.timestamp))
            .unwrap_or(false)
    }

    /// Unit price of the main item for the chosen size.
    ///
    /// An active offer replaces the base price, and for sized items the offer is
    /// the medium price with S/L one step below/above it.
    pub fn item_unit_price(&self, item: &MenuItem, size: Option<Size>, context: &PricingContext) -> Money {
        if let Some(offer) = item.offer.as_ref().filter(|o| o.is_active_at(context.timestamp)) {
            return match (item.size.enabled, size) {
                (true, Some(size)) => self.step_from(offer.price, size),
                _ => offer.price,
            };
        }

        match (item.size.enabled, size) {
            (true, Some(size)) => self.size_price(&item.size, item.base_price, size),
            _ => item.base_price,
        }
    }

    /// Unit price of an addon/combo for the chosen size (base price when unsized)
    pub fn component_size_price(&self, component: &Component, size: Option<Size>) -> Money {
        match (component.size.enabled, size) {
            (true, Some(size)) => self.size_price(&component.size, component.base_price, size),
            _ => component.base_price,
        }
    }

    fn size_price(&self, variant: &SizeVariant, base: Money, size: Size) -> Money {
        variant
            .explicit_price(size)
            .unwrap_or_else(|| self.step_from(base, size))
    }

    fn step_from(&self, medium: Money, size: Size) -> Money {
        match size {
            Size::Small => medium - self.config.size_step,
            Size::Medium => medium,
            Size::Large => medium + self.config.size_step,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{Offer, ToggleOption};
    use chrono::Duration;
    use uuid::Uuid;

    fn coffee() -> MenuItem {
        MenuItem {
            id: Uuid::new_v4(),
            name: "Coffee".to_string(),
            category: "drinks".to_string(),
            base_price: Money::from(100),
            kitchen: Some("Bar".to_string()),
            size: SizeVariant {
                enabled: true,
                small_price: Some(Money::from(80)),
                medium_price: None,
                large_price: Some(Money::from(130)),
            },
            ice: ToggleOption::default(),
            spicy: ToggleOption::default(),
            custom_variants: vec![],
            addons: vec![],
            combos: vec![],
            offer: None,
        }
    }

    #[test]
    fn test_explicit_and_fallback_size_prices() {
        let engine = PricingEngine::default();
        let ctx = PricingContext::default();
        let item = coffee();

        assert_eq!(engine.item_unit_price(&item, Some(Size::Small), &ctx), Money::from(80));
        // medium has no explicit price: falls back to base
        assert_eq!(engine.item_unit_price(&item, Some(Size::Medium), &ctx), Money::from(100));
        assert_eq!(engine.item_unit_price(&item, Some(Size::Large), &ctx), Money::from(130));
    }

    #[test]
    fn test_active_offer_replaces_base_price() {
        let engine = PricingEngine::default();
        let now = Utc::now();
        let mut item = coffee();
        item.offer = Some(Offer {
            price: Money::from(60),
            ends_at: now + Duration::hours(1),
        });

        let ctx = PricingContext::at(now);
        assert!(engine.is_offer_active(&item, &ctx));
        assert_eq!(engine.item_unit_price(&item, Some(Size::Small), &ctx), Money::from(50));
        assert_eq!(engine.item_unit_price(&item, Some(Size::Large), &ctx), Money::from(70));

        // expired offer is ignored
        let later = PricingContext::at(now + Duration::hours(2));
        assert!(!engine.is_offer_active(&item, &later));
        assert_eq!(engine.item_unit_price(&item, Some(Size::Small), &later), Money::from(80));
    }

    #[test]
    fn test_unsized_component_uses_base_price() {
        let engine = PricingEngine::new(PricingConfig { size_step: Money::from(5) });
        let mut fries = Component {
            name: "Fries".to_string(),
            base_price: Money::from(20),
            kitchen: Some("Fryer".to_string()),
            size: SizeVariant::default(),
            spicy: ToggleOption::default(),
            custom_variants: vec![],
        };
        assert_eq!(engine.component_size_price(&fries, Some(Size::Large)), Money::from(20));

        fries.size.enabled = true;
        assert_eq!(engine.component_size_price(&fries, Some(Size::Large)), Money::from(25));
        assert_eq!(engine.component_size_price(&fries, None), Money::from(20));
    }
}
