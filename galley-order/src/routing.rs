use crate::models::{CartLine, WorkItem};
use galley_shared::{ComponentKind, WorkItemId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// A component that cannot be routed because it has no kitchen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind} '{component}' on cart line {cart_line_id} has no kitchen")]
pub struct RoutingInconsistency {
    pub cart_line_id: Uuid,
    pub kind: ComponentKind,
    pub component: String,
}

/// Fans a cart line out into one work item per component and kitchen
pub struct KitchenRouter;

impl KitchenRouter {
    /// Route a line, logging and dropping components without a kitchen
    pub fn route(line: &CartLine) -> Vec<WorkItem> {
        let (items, skipped) = Self::route_checked(line);
        report(&skipped);
        items
    }

    /// Route every line of an order
    pub fn route_all(lines: &[CartLine]) -> (Vec<WorkItem>, Vec<RoutingInconsistency>) {
        let mut items = Vec::new();
        let mut skipped = Vec::new();
        for line in lines {
            let (routed, problems) = Self::route_checked(line);
            items.extend(routed);
            skipped.extend(problems);
        }
        report(&skipped);
        (items, skipped)
    }

    /// Main item first, then addons and combos in name order. Pure.
    pub fn route_checked(line: &CartLine) -> (Vec<WorkItem>, Vec<RoutingInconsistency>) {
        let mut items = Vec::new();
        let mut skipped = Vec::new();

        let mut place = |kind: ComponentKind, name: &str, kitchen: Option<&str>, quantity: u32| {
            if quantity == 0 {
                return;
            }
            let id = WorkItemId::new(line.id, kind, name);
            match kitchen.map(str::trim).filter(|k| !k.is_empty()) {
                Some(kitchen) => items.push(WorkItem::new(id, kitchen, quantity)),
                None => skipped.push(RoutingInconsistency {
                    cart_line_id: line.id,
                    kind,
                    component: name.to_string(),
                }),
            }
        };

        place(ComponentKind::Main, &line.item_name, line.kitchen.as_deref(), line.quantity);
        for (name, addon) in &line.addons {
            place(ComponentKind::Addon, name, addon.kitchen.as_deref(), addon.quantity);
        }
        for (name, combo) in &line.combos {
            place(ComponentKind::Combo, name, combo.kitchen.as_deref(), combo.quantity);
        }

        (items, skipped)
    }

    /// Kitchens a line needs, in name order
    pub fn kitchens(line: &CartLine) -> BTreeSet<String> {
        Self::route_checked(line)
            .0
            .into_iter()
            .map(|item| item.kitchen)
            .collect()
    }
}

fn report(skipped: &[RoutingInconsistency]) {
    for problem in skipped {
        tracing::warn!(
            cart_line_id = %problem.cart_line_id,
            kind = %problem.kind,
            component = %problem.component,
            "Component has no kitchen, not routed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::{ComponentSelection, Selection};
    use crate::test_support::{burger_line, engine};
    use galley_catalog::PricingContext;
    use galley_shared::FulfillmentStatus;

    #[test]
    fn test_fan_out_to_each_kitchen() {
        let selection = Selection::new("Burger").with_addon("Fries", ComponentSelection::new(2));
        let line = engine().compose(&selection, &PricingContext::default()).unwrap();

        let items = KitchenRouter::route(&line);
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].id, WorkItemId::new(line.id, ComponentKind::Main, "Burger"));
        assert_eq!(items[0].kitchen, "Grill");
        assert_eq!(items[0].quantity, 1);

        assert_eq!(items[1].id, WorkItemId::new(line.id, ComponentKind::Addon, "Fries"));
        assert_eq!(items[1].kitchen, "Fryer");
        assert_eq!(items[1].quantity, 2);

        assert!(items.iter().all(|i| i.status == FulfillmentStatus::Pending));
    }

    #[test]
    fn test_routing_is_idempotent() {
        let line = burger_line();
        assert_eq!(KitchenRouter::route(&line), KitchenRouter::route(&line));
        assert_eq!(
            KitchenRouter::kitchens(&line).into_iter().collect::<Vec<_>>(),
            vec!["Bar", "Fryer", "Grill"]
        );
    }

    #[test]
    fn test_component_without_kitchen_is_skipped() {
        let selection = Selection::new("Burger")
            .with_addon("Onion Rings", ComponentSelection::new(1))
            .with_addon("Fries", ComponentSelection::new(1));
        let line = engine().compose(&selection, &PricingContext::default()).unwrap();

        let (items, skipped) = KitchenRouter::route_checked(&line);
        assert_eq!(items.len(), 2);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].component, "Onion Rings");
        assert_eq!(skipped[0].kind, ComponentKind::Addon);
    }

    #[test]
    fn test_main_item_without_kitchen_still_routes_components() {
        let water = engine().compose(&Selection::new("Water"), &PricingContext::default()).unwrap();
        let (items, skipped) = KitchenRouter::route_checked(&water);
        assert!(items.is_empty());
        assert_eq!(
            skipped,
            vec![RoutingInconsistency {
                cart_line_id: water.id,
                kind: ComponentKind::Main,
                component: "Water".to_string(),
            }]
        );

        let mut burger = burger_line();
        burger.kitchen = Some("  ".to_string());
        let (items, skipped) = KitchenRouter::route_checked(&burger);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].kind, ComponentKind::Main);
        let names: Vec<_> = items.iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["Fries", "Cola"]);
    }

    #[test]
    fn test_zero_quantity_component_not_routed() {
        let selection = Selection::new("Burger").with_addon("Fries", ComponentSelection::new(0));
        let line = engine().compose(&selection, &PricingContext::default()).unwrap();

        let (items, skipped) = KitchenRouter::route_checked(&line);
        assert_eq!(items.len(), 1);
        assert!(skipped.is_empty());
    }
}
