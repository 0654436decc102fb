use crate::composition::{ComponentSelection, CompositionEngine, Selection};
use crate::models::CartLine;
use galley_catalog::{InMemoryCatalog, PricingContext, PricingEngine};
use std::sync::Arc;

pub(crate) const MENU: &str = r#"[
    {
        "name": "Burger",
        "category": "mains",
        "base_price": 200,
        "kitchen": "Grill",
        "spicy": { "enabled": true, "price": 20 },
        "custom_variants": [
            { "heading": "Cheese", "options": [{ "name": "Cheddar", "price": 15 }, { "name": "Swiss", "price": 25 }] },
            { "heading": "Seasonal", "enabled": false, "options": [{ "name": "Truffle", "price": 90 }] }
        ],
        "addons": [
            {
                "name": "Fries",
                "base_price": 20,
                "kitchen": "Fryer",
                "size": { "enabled": true },
                "spicy": { "enabled": true, "price": 10 },
                "custom_variants": [{ "heading": "Dip", "options": [{ "name": "Mayo", "price": 5 }] }]
            },
            { "name": "Onion Rings", "base_price": 30 },
            { "name": "Cheese Slice", "base_price": 15, "kitchen": "Grill" }
        ],
        "combos": [
            {
                "name": "Cola",
                "base_price": 40,
                "kitchen": "Bar",
                "size": { "enabled": true, "small_price": 30, "large_price": 50 },
                "custom_variants": [{ "heading": "Flavor", "options": [{ "name": "Lime", "price": 5 }] }]
            }
        ]
    },
    {
        "name": "Coffee",
        "category": "drinks",
        "base_price": 100,
        "kitchen": "Bar",
        "size": { "enabled": true, "small_price": 80, "large_price": 130 },
        "ice": { "enabled": true, "price": 10 }
    },
    { "name": "Lassi", "category": "drinks", "base_price": 80, "kitchen": "Bar" },
    { "name": "Water", "category": "drinks", "base_price": 20 }
]"#;

pub(crate) fn catalog() -> Arc<InMemoryCatalog> {
    Arc::new(InMemoryCatalog::from_json_str(MENU).expect("fixture menu"))
}

pub(crate) fn engine() -> CompositionEngine {
    CompositionEngine::new(catalog(), PricingEngine::default())
}

/// Burger x2 with spicy, Fries x3 and a Cola combo
pub(crate) fn burger_line() -> CartLine {
    let selection = Selection::new("Burger")
        .with_quantity(2)
        .with_spicy()
        .with_addon("Fries", ComponentSelection::new(3))
        .with_combo("Cola", ComponentSelection::new(1));
    engine()
        .compose(&selection, &PricingContext::default())
        .expect("burger composes")
}
