use crate::product::{Catalog, CatalogError, Component, MenuItem};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

/// In-memory menu cache, loaded from the catalog service's JSON export
#[derive(Debug, Default, Clone)]
pub struct InMemoryCatalog {
    items: HashMap<String, Arc<MenuItem>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<MenuItem>) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for item in items {
            catalog.insert(item)?;
        }
        Ok(catalog)
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let items: Vec<MenuItem> =
            serde_json::from_str(json).map_err(|e| CatalogError::Load(e.to_string()))?;
        Self::from_items(items)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Load(format!("{}: {}", path.display(), e)))?;
        let catalog = Self::from_json_str(&json)?;
        tracing::info!("Loaded {} menu items from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Add or replace a menu item
    pub fn insert(&mut self, item: MenuItem) -> Result<(), CatalogError> {
        validate(&item)?;
        if item.kitchen_name().is_none() {
            tracing::warn!(item = %item.name, "Menu item has no kitchen assigned");
        }
        self.items.insert(item.name.clone(), Arc::new(item));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items grouped under a category, sorted by name
    pub fn by_category(&self, category: &str) -> Vec<Arc<MenuItem>> {
        let mut items: Vec<_> = self
            .items
            .values()
            .filter(|i| i.category.eq_ignore_ascii_case(category))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        items
    }
}

impl Catalog for InMemoryCatalog {
    fn menu_item(&self, name: &str) -> Option<Arc<MenuItem>> {
        self.items.get(name).cloned()
    }
}

/// Names are used as selection keys, so they must be unique per item
fn validate(item: &MenuItem) -> Result<(), CatalogError> {
    if item.name.trim().is_empty() {
        return Err(CatalogError::Invalid("menu item without a name".to_string()));
    }
    unique_names(&item.name, "addon", &item.addons)?;
    unique_names(&item.name, "combo", &item.combos)?;

    let mut options = HashSet::new();
    for group in &item.custom_variants {
        for option in &group.options {
            if !options.insert(option.name.as_str()) {
                return Err(CatalogError::Invalid(format!(
                    "{}: duplicate custom variant option '{}'",
                    item.name, option.name
                )));
            }
        }
    }
    Ok(())
}

fn unique_names(item: &str, what: &str, components: &[Component]) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for c in components {
        if !seen.insert(c.name.as_str()) {
            return Err(CatalogError::Invalid(format!("{}: duplicate {} '{}'", item, what, c.name)));
        }
    }
    Ok(())
}
