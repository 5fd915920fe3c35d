//! In-memory cart state.
//!
//! The cart holds the variants a user intends to eat, before asking the
//! service for a recommendation or saving them to history. Entries merge by
//! `variant_id`; quantities never drop below one (setting zero removes the
//! entry instead).

use std::sync::Arc;

use crate::menu::FoodVariant;

// ============================================================================
// Cart Entry
// ============================================================================

/// One cart line: a variant plus the food it belongs to and a quantity.
#[derive(Debug, Clone)]
pub struct CartEntry {
    pub variant: FoodVariant,
    pub food_name: Arc<str>,
    pub quantity: u32,
}

impl CartEntry {
    /// Price of this line (unit price times quantity).
    pub fn line_price(&self) -> i64 {
        self.variant.price * i64::from(self.quantity)
    }
}

// ============================================================================
// Cart
// ============================================================================

/// Nutrition totals across the cart, quantity-weighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NutritionTotals {
    pub calories: i64,
    pub protein: i64,
    pub fat: i64,
    pub carbohydrates: i64,
}

/// The user's in-progress selection of food variants.
#[derive(Debug, Default)]
pub struct Cart {
    entries: Vec<CartEntry>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Add a variant. An existing entry for the same `variant_id` absorbs
    /// the quantity instead of duplicating the line.
    pub fn add(&mut self, variant: FoodVariant, food_name: Arc<str>) {
        self.add_quantity(variant, food_name, 1);
    }

    /// Add a variant with an explicit quantity (merging as in [`Cart::add`]).
    pub fn add_quantity(&mut self, variant: FoodVariant, food_name: Arc<str>, quantity: u32) {
        if quantity == 0 {
            return;
        }
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|e| e.variant.variant_id == variant.variant_id)
        {
            existing.quantity = existing.quantity.saturating_add(quantity);
            return;
        }
        self.entries.push(CartEntry {
            variant,
            food_name,
            quantity,
        });
    }

    /// Remove the entry for a variant, if present.
    pub fn remove(&mut self, variant_id: i64) {
        self.entries.retain(|e| e.variant.variant_id != variant_id);
    }

    /// Set an entry's quantity. Zero removes the entry.
    pub fn set_quantity(&mut self, variant_id: i64, quantity: u32) {
        if quantity == 0 {
            self.remove(variant_id);
            return;
        }
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.variant.variant_id == variant_id)
        {
            entry.quantity = quantity;
        }
    }

    /// Bump an entry's quantity by a signed delta; dropping to zero removes it.
    pub fn adjust_quantity(&mut self, variant_id: i64, delta: i32) {
        let Some(entry) = self
            .entries
            .iter()
            .find(|e| e.variant.variant_id == variant_id)
        else {
            return;
        };
        let new_quantity = i64::from(entry.quantity) + i64::from(delta);
        self.set_quantity(variant_id, new_quantity.clamp(0, u32::MAX as i64) as u32);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Grand total in the service's currency unit.
    pub fn total_price(&self) -> i64 {
        self.entries.iter().map(CartEntry::line_price).sum()
    }

    /// Quantity-weighted nutrition sums for the cart pane.
    pub fn nutrition_totals(&self) -> NutritionTotals {
        let mut totals = NutritionTotals::default();
        for entry in &self.entries {
            let q = i64::from(entry.quantity);
            totals.calories += entry.variant.calories * q;
            totals.protein += entry.variant.protein * q;
            totals.fat += entry.variant.fat * q;
            totals.carbohydrates += entry.variant.carbohydrates * q;
        }
        totals
    }

    /// Variant ids for the recommendation query, one per entry.
    pub fn variant_ids(&self) -> Vec<i64> {
        self.entries.iter().map(|e| e.variant.variant_id).collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn variant(id: i64, price: i64) -> FoodVariant {
        FoodVariant {
            variant_id: id,
            variant_name: Arc::from("M"),
            price,
            calories: 600,
            protein: 30,
            fat: 25,
            carbohydrates: 60,
        }
    }

    fn add(cart: &mut Cart, id: i64, price: i64) {
        cart.add(variant(id, price), Arc::from("Burger"));
    }

    #[test]
    fn add_merges_same_variant() {
        let mut cart = Cart::new();
        add(&mut cart, 101, 500);
        add(&mut cart, 101, 500);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.entries()[0].quantity, 2);
        assert_eq!(cart.total_price(), 1000);
    }

    #[test]
    fn add_distinct_variants_keeps_lines() {
        let mut cart = Cart::new();
        add(&mut cart, 101, 500);
        add(&mut cart, 102, 600);
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.total_price(), 1100);
        assert_eq!(cart.variant_ids(), vec![101, 102]);
    }

    #[test]
    fn set_quantity_zero_removes() {
        let mut cart = Cart::new();
        add(&mut cart, 101, 500);
        cart.set_quantity(101, 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn adjust_below_zero_removes() {
        let mut cart = Cart::new();
        add(&mut cart, 101, 500);
        cart.adjust_quantity(101, -3);
        assert!(cart.is_empty());
    }

    #[test]
    fn adjust_unknown_variant_is_noop() {
        let mut cart = Cart::new();
        add(&mut cart, 101, 500);
        cart.adjust_quantity(999, 1);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.entries()[0].quantity, 1);
    }

    #[test]
    fn nutrition_totals_weight_by_quantity() {
        let mut cart = Cart::new();
        add(&mut cart, 101, 500);
        cart.set_quantity(101, 3);
        let totals = cart.nutrition_totals();
        assert_eq!(totals.calories, 1800);
        assert_eq!(totals.protein, 90);
        assert_eq!(totals.fat, 75);
        assert_eq!(totals.carbohydrates, 180);
    }

    #[test]
    fn clear_empties_cart() {
        let mut cart = Cart::new();
        add(&mut cart, 101, 500);
        add(&mut cart, 102, 600);
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total_price(), 0);
    }

    // Operations applied in property tests.
    #[derive(Debug, Clone)]
    enum Op {
        Add { id: i64 },
        Remove { id: i64 },
        Set { id: i64, quantity: u32 },
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0i64..8).prop_map(|id| Op::Add { id }),
            (0i64..8).prop_map(|id| Op::Remove { id }),
            (0i64..8, 0u32..5).prop_map(|(id, quantity)| Op::Set { id, quantity }),
        ]
    }

    proptest! {
        #[test]
        fn total_matches_line_sum(ops in prop::collection::vec(op_strategy(), 0..40)) {
            let mut cart = Cart::new();
            for op in ops {
                match op {
                    // Same id always carries the same price, as on a real menu
                    Op::Add { id } => add(&mut cart, id, 100 * (id + 1)),
                    Op::Remove { id } => cart.remove(id),
                    Op::Set { id, quantity } => cart.set_quantity(id, quantity),
                }
            }

            let expected: i64 = cart
                .entries()
                .iter()
                .map(|e| e.variant.price * i64::from(e.quantity))
                .sum();
            prop_assert_eq!(cart.total_price(), expected);

            // No duplicate variant ids after any sequence of operations
            let mut ids = cart.variant_ids();
            ids.sort_unstable();
            ids.dedup();
            prop_assert_eq!(ids.len(), cart.len());

            // No zero quantities survive
            prop_assert!(cart.entries().iter().all(|e| e.quantity > 0));
        }
    }
}
