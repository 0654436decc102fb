pub mod product;
pub mod pricing;
pub mod menu;

pub use product::{
    Catalog, CatalogError, Component, CustomVariantGroup, MenuItem, Offer, Size, SizeVariant,
    ToggleOption, VariantOption,
};
pub use pricing::{PricingConfig, PricingContext, PricingEngine};
pub use menu::InMemoryCatalog;
