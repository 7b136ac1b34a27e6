//! # Cart
//!
//! Ordered collection of line items keyed by product id.
//! Insertion order is first-added order; ids are unique and quantities
//! never drop below 1 (an entry that would reach 0 is removed instead).

use crate::item::LineItem;
use serde::{Deserialize, Serialize};

/// Result of adding an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// New entry appended
    Inserted,
    /// Existing entry's quantity increased
    Merged { quantity: u32 },
}

/// Result of a quantity change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    Updated(u32),
    Removed,
    NotFound,
}

/// A shopping cart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from stored entries, merging duplicate ids and
    /// dropping entries that break the invariants.
    pub fn from_items(items: impl IntoIterator<Item = LineItem>) -> Self {
        let mut cart = Cart::new();
        for item in items {
            if item.check().is_ok() {
                cart.add(item);
            }
        }
        cart
    }

    /// Add an item, merging into an existing entry with the same id
    pub fn add(&mut self, item: LineItem) -> AddOutcome {
        match self.items.iter_mut().find(|i| i.id == item.id) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(item.quantity);
                AddOutcome::Merged {
                    quantity: existing.quantity,
                }
            }
            None => {
                self.items.push(item);
                AddOutcome::Inserted
            }
        }
    }

    /// Remove the entry with `id`. Returns false if it was not present.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        self.items.len() != before
    }

    /// Add `delta` to an entry's quantity; at or below zero the entry is removed
    pub fn update_quantity(&mut self, id: &str, delta: i64) -> QuantityChange {
        let Some(pos) = self.position(id) else {
            return QuantityChange::NotFound;
        };

        let next = i64::from(self.items[pos].quantity).saturating_add(delta);
        if next <= 0 {
            self.items.remove(pos);
            return QuantityChange::Removed;
        }

        let quantity = u32::try_from(next).unwrap_or(u32::MAX);
        self.items[pos].quantity = quantity;
        QuantityChange::Updated(quantity)
    }

    /// Set an entry's quantity, clamped to at least 1
    pub fn set_quantity(&mut self, id: &str, quantity: u32) -> QuantityChange {
        match self.items.iter_mut().find(|i| i.id == id) {
            Some(item) => {
                item.quantity = quantity.max(1);
                QuantityChange::Updated(item.quantity)
            }
            None => QuantityChange::NotFound,
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn get(&self, id: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.id == id)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|i| i.id == id)
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Number of distinct entries
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of quantities (the badge count)
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, i| acc.saturating_add(i.quantity))
    }

    /// Sum of price * quantity
    pub fn subtotal(&self) -> f64 {
        self.items.iter().map(LineItem::total).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> LineItem {
        LineItem::new("prod-1", "Widget", 1000.0)
    }

    #[test]
    fn test_add_new_and_merge() {
        let mut cart = Cart::new();

        assert_eq!(cart.add(widget()), AddOutcome::Inserted);
        assert_eq!(cart.len(), 1);

        assert_eq!(cart.add(widget()), AddOutcome::Merged { quantity: 2 });
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.subtotal(), 2000.0);
    }

    #[test]
    fn test_merge_uses_provided_quantity() {
        let mut cart = Cart::new();
        cart.add(widget());
        cart.add(widget().with_quantity(3));
        assert_eq!(cart.get("prod-1").unwrap().quantity, 4);
    }

    #[test]
    fn test_insertion_order() {
        let mut cart = Cart::new();
        cart.add(LineItem::new("b", "B", 1.0));
        cart.add(LineItem::new("a", "A", 1.0));
        cart.add(LineItem::new("b", "B", 1.0));

        let ids: Vec<_> = cart.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut cart = Cart::new();
        cart.add(widget());

        assert!(cart.remove("prod-1"));
        assert!(!cart.remove("prod-1"));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_to_zero_removes() {
        let mut cart = Cart::new();
        cart.add(widget().with_quantity(3));

        assert_eq!(cart.update_quantity("prod-1", 2), QuantityChange::Updated(5));
        assert_eq!(cart.update_quantity("prod-1", -5), QuantityChange::Removed);
        assert!(cart.get("prod-1").is_none());
        assert_eq!(cart.update_quantity("prod-1", 1), QuantityChange::NotFound);
    }

    #[test]
    fn test_update_quantity_below_zero_removes() {
        let mut cart = Cart::new();
        cart.add(widget());
        assert_eq!(cart.update_quantity("prod-1", -10), QuantityChange::Removed);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_clamps() {
        let mut cart = Cart::new();
        cart.add(widget());
        assert_eq!(cart.set_quantity("prod-1", 0), QuantityChange::Updated(1));
        assert_eq!(cart.set_quantity("prod-1", 7), QuantityChange::Updated(7));
        assert_eq!(cart.set_quantity("nope", 7), QuantityChange::NotFound);
    }

    #[test]
    fn test_subtotal_matches_lines() {
        let mut cart = Cart::new();
        cart.add(LineItem::new("a", "A", 12.5).with_quantity(2));
        cart.add(LineItem::new("b", "B", 100.0));
        cart.update_quantity("b", 2);

        let expected: f64 = cart.items().iter().map(|i| i.price * i.quantity as f64).sum();
        assert_eq!(cart.subtotal(), expected);
        assert_eq!(cart.subtotal(), 325.0);
    }

    #[test]
    fn test_from_items_merges_and_drops() {
        let mut broken = LineItem::new("bad", "Bad", 1.0);
        broken.quantity = 0;

        let cart = Cart::from_items(vec![
            LineItem::new("p1", "A", 10.0),
            broken,
            LineItem::new("p1", "A", 10.0).with_quantity(2),
            LineItem::new("p2", "B", -1.0),
        ]);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get("p1").unwrap().quantity, 3);
    }

    #[test]
    fn test_serializes_as_array() {
        let mut cart = Cart::new();
        cart.add(widget().with_quantity(2));

        let json = serde_json::to_string(&cart).unwrap();
        assert_eq!(
            json,
            r#"[{"id":"prod-1","name":"Widget","price":1000.0,"quantity":2}]"#
        );
    }
}
