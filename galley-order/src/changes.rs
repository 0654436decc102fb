use crate::composition::{Cart, CompositionEngine, CompositionError, Selection};
use crate::models::CartLine;
use galley_catalog::PricingContext;
use galley_shared::ComponentKind;
use uuid::Uuid;

/// Edits to lines already in the working cart.
///
/// Every edit rebuilds the line from its adjusted selection, so either the whole
/// line is re-priced or the cart is left untouched.
pub struct ChangeHandler;

impl ChangeHandler {
    /// Set the line quantity (clamped to at least one)
    pub fn set_quantity(
        cart: &mut Cart,
        engine: &CompositionEngine,
        context: &PricingContext,
        line_id: Uuid,
        quantity: u32,
    ) -> Result<CartLine, ChangeError> {
        Self::edit(cart, engine, context, line_id, |selection| {
            selection.quantity = quantity.max(1);
            Ok(())
        })
    }

    pub fn set_ice(
        cart: &mut Cart,
        engine: &CompositionEngine,
        context: &PricingContext,
        line_id: Uuid,
        on: bool,
    ) -> Result<CartLine, ChangeError> {
        Self::edit(cart, engine, context, line_id, |selection| {
            selection.ice = on;
            Ok(())
        })
    }

    pub fn set_spicy(
        cart: &mut Cart,
        engine: &CompositionEngine,
        context: &PricingContext,
        line_id: Uuid,
        on: bool,
    ) -> Result<CartLine, ChangeError> {
        Self::edit(cart, engine, context, line_id, |selection| {
            selection.spicy = on;
            Ok(())
        })
    }

    /// Set a custom variant's quantity, adding the option when it is not selected yet
    pub fn set_custom_variant_quantity(
        cart: &mut Cart,
        engine: &CompositionEngine,
        context: &PricingContext,
        line_id: Uuid,
        option: &str,
        quantity: u32,
    ) -> Result<CartLine, ChangeError> {
        Self::edit(cart, engine, context, line_id, |selection| {
            selection
                .custom_variants
                .insert(option.to_string(), quantity.max(1));
            Ok(())
        })
    }

    pub fn remove_custom_variant(
        cart: &mut Cart,
        engine: &CompositionEngine,
        context: &PricingContext,
        line_id: Uuid,
        option: &str,
    ) -> Result<CartLine, ChangeError> {
        Self::edit(cart, engine, context, line_id, |selection| {
            selection
                .custom_variants
                .remove(option)
                .map(|_| ())
                .ok_or_else(|| ChangeError::NotSelected(option.to_string()))
        })
    }

    /// Set an attached addon/combo quantity (clamped to at least one)
    pub fn set_component_quantity(
        cart: &mut Cart,
        engine: &CompositionEngine,
        context: &PricingContext,
        line_id: Uuid,
        kind: ComponentKind,
        name: &str,
        quantity: u32,
    ) -> Result<CartLine, ChangeError> {
        Self::edit(cart, engine, context, line_id, |selection| {
            let component = selection
                .components_mut(kind)
                .and_then(|components| components.get_mut(name))
                .ok_or_else(|| ChangeError::NotSelected(name.to_string()))?;
            component.quantity = quantity.max(1);
            Ok(())
        })
    }

    pub fn remove_component(
        cart: &mut Cart,
        engine: &CompositionEngine,
        context: &PricingContext,
        line_id: Uuid,
        kind: ComponentKind,
        name: &str,
    ) -> Result<CartLine, ChangeError> {
        Self::edit(cart, engine, context, line_id, |selection| {
            selection
                .components_mut(kind)
                .and_then(|components| components.remove(name))
                .map(|_| ())
                .ok_or_else(|| ChangeError::NotSelected(name.to_string()))
        })
    }

    pub fn remove_line(cart: &mut Cart, line_id: Uuid) -> Result<CartLine, ChangeError> {
        cart.remove(line_id).ok_or(ChangeError::LineNotFound(line_id))
    }

    fn edit<F>(
        cart: &mut Cart,
        engine: &CompositionEngine,
        context: &PricingContext,
        line_id: Uuid,
        change: F,
    ) -> Result<CartLine, ChangeError>
    where
        F: FnOnce(&mut Selection) -> Result<(), ChangeError>,
    {
        let line = cart.line(line_id).ok_or(ChangeError::LineNotFound(line_id))?;
        let mut selection = Selection::from(line);
        change(&mut selection)?;

        let repriced = engine.build(line_id, &selection, context)?;
        cart.replace(repriced.clone());
        Ok(repriced)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChangeError {
    #[error("Cart line not found: {0}")]
    LineNotFound(Uuid),

    #[error("Not selected on this line: {0}")]
    NotSelected(String),

    #[error(transparent)]
    Composition(#[from] CompositionError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::ComponentSelection;
    use crate::test_support::engine;
    use crate::totals::PricingAggregator;
    use galley_core::Money;

    fn cart_with_burger(engine: &CompositionEngine, ctx: &PricingContext) -> (Cart, Uuid) {
        let mut cart = Cart::new();
        let selection = Selection::new("Burger")
            .with_quantity(2)
            .with_spicy()
            .with_addon("Fries", ComponentSelection::new(3));
        let id = cart.add(engine, &selection, ctx).unwrap().id;
        (cart, id)
    }

    #[test]
    fn test_quantity_edit_reprices_whole_line() {
        let engine = engine();
        let ctx = PricingContext::default();
        let (mut cart, id) = cart_with_burger(&engine, &ctx);

        let line = ChangeHandler::set_quantity(&mut cart, &engine, &ctx, id, 1).unwrap();
        assert_eq!(line.id, id);
        assert_eq!(line.total_price, Money::from(280));

        // zero clamps to one
        let line = ChangeHandler::set_quantity(&mut cart, &engine, &ctx, id, 0).unwrap();
        assert_eq!(line.quantity, 1);
        assert_eq!(cart.line(id), Some(&line));
    }

    #[test]
    fn test_totals_stay_closed_after_edit_sequence() {
        let engine = engine();
        let ctx = PricingContext::default();
        let (mut cart, id) = cart_with_burger(&engine, &ctx);

        ChangeHandler::set_spicy(&mut cart, &engine, &ctx, id, false).unwrap();
        ChangeHandler::set_custom_variant_quantity(&mut cart, &engine, &ctx, id, "Swiss", 2).unwrap();
        ChangeHandler::set_component_quantity(&mut cart, &engine, &ctx, id, ComponentKind::Addon, "Fries", 5)
            .unwrap();
        ChangeHandler::remove_custom_variant(&mut cart, &engine, &ctx, id, "Swiss").unwrap();
        let line = ChangeHandler::set_quantity(&mut cart, &engine, &ctx, id, 4).unwrap();

        assert!(PricingAggregator::is_consistent(&line));
        // 200 * 4 + 20 * 5
        assert_eq!(line.total_price, Money::from(900));
    }

    #[test]
    fn test_failed_edit_leaves_line_untouched() {
        let engine = engine();
        let ctx = PricingContext::default();
        let (mut cart, id) = cart_with_burger(&engine, &ctx);
        let before = cart.line(id).cloned();

        let err = ChangeHandler::set_ice(&mut cart, &engine, &ctx, id, true).unwrap_err();
        assert!(matches!(err, ChangeError::Composition(CompositionError::DisabledOption { .. })));

        let err = ChangeHandler::remove_component(&mut cart, &engine, &ctx, id, ComponentKind::Combo, "Cola")
            .unwrap_err();
        assert!(matches!(err, ChangeError::NotSelected(_)));

        assert_eq!(cart.line(id).cloned(), before);
    }

    #[test]
    fn test_remove_component_and_line() {
        let engine = engine();
        let ctx = PricingContext::default();
        let (mut cart, id) = cart_with_burger(&engine, &ctx);

        let line =
            ChangeHandler::remove_component(&mut cart, &engine, &ctx, id, ComponentKind::Addon, "Fries").unwrap();
        assert!(line.addons.is_empty());
        assert_eq!(line.addons_total, Money::ZERO);

        ChangeHandler::remove_line(&mut cart, id).unwrap();
        assert!(cart.is_empty());
        assert!(matches!(
            ChangeHandler::remove_line(&mut cart, id),
            Err(ChangeError::LineNotFound(_))
        ));
    }
}
