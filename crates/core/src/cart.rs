//! The line-item ledger behind the shopping cart.
//!
//! A [`CartLedger`] maps product ids to a [`LineItem`] holding the quantity
//! and the unit price captured when the product was first added. It knows
//! nothing about sessions or catalogs: the storefront loads it from the
//! session, mutates it and writes the whole value back.
//!
//! # Invariants
//!
//! - No entry has a zero quantity once an operation returns.
//! - The unit price of an entry is fixed at first insertion. Adding the same
//!   product again never refreshes it, so the checkout charges the price the
//!   customer saw when the product entered the cart.
//!
//! # Serialized form
//!
//! ```json
//! {"7": {"quantity": 2, "price": "12.50"}}
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// Errors raised by keyed ledger access.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The product has no entry in the ledger.
    #[error("product {0} is not in the cart")]
    MissingKey(ProductId),
}

/// One ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub quantity: u32,
    /// Unit price frozen at first insertion.
    pub price: Price,
}

impl LineItem {
    /// Unit price times quantity.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// Product-id keyed ledger of cart lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartLedger {
    entries: BTreeMap<ProductId, LineItem>,
}

impl CartLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` units of a product.
    ///
    /// A missing entry is created with quantity zero and `unit_price`. With
    /// `update` the quantity is replaced, otherwise it is incremented. The
    /// price of an existing entry is left untouched. An entry whose quantity
    /// ends up at zero is deleted.
    pub fn add(&mut self, product_id: ProductId, unit_price: Price, quantity: u32, update: bool) {
        let line = self.entries.entry(product_id).or_insert(LineItem {
            quantity: 0,
            price: unit_price,
        });

        line.quantity = if update {
            quantity
        } else {
            line.quantity.saturating_add(quantity)
        };

        if line.quantity == 0 {
            self.entries.remove(&product_id);
        }
    }

    /// Delete a product's entry. Returns whether an entry existed.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        self.entries.remove(&product_id).is_some()
    }

    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.entries.contains_key(&product_id)
    }

    /// Keyed access to an entry.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::MissingKey`] if the product was never added or
    /// has been removed. Check [`contains`](Self::contains) first when absence
    /// is expected.
    pub fn line(&self, product_id: ProductId) -> Result<&LineItem, LedgerError> {
        self.entries
            .get(&product_id)
            .ok_or(LedgerError::MissingKey(product_id))
    }

    /// Iterate over entries in ascending product id order.
    pub fn iter(&self) -> impl Iterator<Item = (ProductId, &LineItem)> + '_ {
        self.entries.iter().map(|(id, line)| (*id, line))
    }

    /// Ids of every product in the ledger.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.entries.keys().copied().collect()
    }

    /// Exact decimal sum of `price * quantity` over all entries.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.entries.values().map(LineItem::total_price).sum()
    }

    /// Total number of units (sum of quantities), not distinct products.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.entries.values().map(|line| u64::from(line.quantity)).sum()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const A: ProductId = ProductId::new(1);
    const B: ProductId = ProductId::new(2);

    fn price(s: &str) -> Price {
        s.parse().unwrap()
    }

    #[test]
    fn test_new_ledger_is_empty() {
        let ledger = CartLedger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.total_price(), Price::ZERO);
        assert_eq!(ledger.item_count(), 0);
    }

    #[test]
    fn test_add_is_additive() {
        let mut ledger = CartLedger::new();
        ledger.add(A, price("1.00"), 1, false);
        ledger.add(A, price("1.00"), 1, false);
        assert_eq!(ledger.line(A).unwrap().quantity, 2);

        ledger.add(A, price("1.00"), 2, false);
        assert_eq!(ledger.line(A).unwrap().quantity, 4);
    }

    #[test]
    fn test_add_with_update_replaces_quantity() {
        let mut ledger = CartLedger::new();
        ledger.add(A, price("1.00"), 5, false);
        ledger.add(A, price("1.00"), 2, true);
        assert_eq!(ledger.line(A).unwrap().quantity, 2);
    }

    #[test]
    fn test_price_frozen_at_first_insert() {
        let mut ledger = CartLedger::new();
        ledger.add(A, price("1.00"), 1, false);
        ledger.add(A, price("9.99"), 1, false);
        ledger.add(A, price("5.00"), 3, true);

        let line = ledger.line(A).unwrap();
        assert_eq!(line.price, price("1.00"));
        assert_eq!(line.quantity, 3);
    }

    #[test]
    fn test_zero_quantity_removes_entry() {
        let mut ledger = CartLedger::new();
        ledger.add(A, price("1.00"), 3, false);
        ledger.add(A, price("1.00"), 0, true);
        assert!(!ledger.contains(A));

        ledger.add(B, price("1.00"), 0, false);
        assert!(!ledger.contains(B));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_remove_round_trip_and_idempotence() {
        let mut ledger = CartLedger::new();
        assert!(!ledger.remove(A));

        ledger.add(A, price("1.00"), 1, false);
        assert!(ledger.remove(A));
        assert!(ledger.is_empty());
        assert!(!ledger.remove(A));
    }

    #[test]
    fn test_remove_other_product_keeps_entries() {
        let mut ledger = CartLedger::new();
        ledger.add(A, price("1.00"), 1, false);
        ledger.remove(B);
        assert!(!ledger.is_empty());
        assert_eq!(ledger.line(B), Err(LedgerError::MissingKey(B)));
    }

    #[test]
    fn test_total_price_exact() {
        let mut ledger = CartLedger::new();
        ledger.add(A, price("1.00"), 1, false);
        ledger.add(B, price("2.00"), 2, false);
        assert_eq!(ledger.total_price(), price("5.00"));
        assert_eq!(ledger.total_price().to_string(), "5.00");
    }

    #[test]
    fn test_item_count_sums_quantities() {
        let mut ledger = CartLedger::new();
        ledger.add(A, price("1.00"), 1, false);
        ledger.add(B, price("2.00"), 2, false);
        assert_eq!(ledger.item_count(), 3);
        assert_eq!(ledger.line_count(), 2);
    }

    #[test]
    fn test_iter_yields_each_entry_once() {
        let mut ledger = CartLedger::new();
        ledger.add(B, price("2.00"), 2, false);
        ledger.add(A, price("1.00"), 1, false);

        let ids: Vec<ProductId> = ledger.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![A, B]);
        assert_eq!(ledger.iter().count(), 2);
        assert_eq!(ledger.product_ids(), vec![A, B]);
    }

    #[test]
    fn test_serialized_form_uses_string_keys() {
        let mut ledger = CartLedger::new();
        ledger.add(ProductId::new(7), price("12.50"), 2, false);

        let value = serde_json::to_value(&ledger).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"7": {"quantity": 2, "price": "12.50"}})
        );

        let back: CartLedger = serde_json::from_value(value).unwrap();
        assert_eq!(back, ledger);
    }
}
