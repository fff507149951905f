//! Cart state container.
//!
//! Mirrors the client-side cart the checkout flow receives its order payload
//! from. The one rule that matters downstream: a non-empty cart only ever
//! holds items from a single shop. Adding an item from a different shop
//! replaces the whole cart, so the order draft handed to confirmation is
//! guaranteed single-vendor.

use crate::checkout::OrderDraft;
use crate::entities::order_records::OrderItem;
use serde::{Deserialize, Serialize};

/// A line in the cart. `price` is the per-unit price in minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub item_id: String,
    pub shop_id: String,
    pub name: String,
    pub price: i64,
    pub quantity: i64,
}

/// The cart: items plus a total that is always `Σ price·quantity`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartState {
    pub items: Vec<CartItem>,
    pub total: i64,
}

impl CartState {
    /// The shop this cart belongs to, if it is non-empty.
    pub fn shop_id(&self) -> Option<&str> {
        self.items.first().map(|item| item.shop_id.as_str())
    }

    /// Add one unit of an item.
    ///
    /// Same shop: increments the existing line or appends a new one.
    /// Different shop: drops the current cart and starts over with a
    /// single-quantity line for the new item.
    pub fn add_item(&mut self, item_id: &str, shop_id: &str, name: &str, price: i64) {
        if self.shop_id().is_some_and(|current| current != shop_id) {
            self.items.clear();
        }

        match self.items.iter_mut().find(|item| item.item_id == item_id) {
            Some(existing) => existing.quantity += 1,
            None => self.items.push(CartItem {
                item_id: item_id.to_owned(),
                shop_id: shop_id.to_owned(),
                name: name.to_owned(),
                price,
                quantity: 1,
            }),
        }
        self.recompute_total();
    }

    /// Remove a line entirely.
    pub fn remove_item(&mut self, item_id: &str) {
        self.items.retain(|item| item.item_id != item_id);
        self.recompute_total();
    }

    /// Set a line's quantity; zero removes the line.
    pub fn set_quantity(&mut self, item_id: &str, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(item_id);
            return;
        }
        if let Some(item) = self.items.iter_mut().find(|item| item.item_id == item_id) {
            item.quantity = quantity;
        }
        self.recompute_total();
    }

    /// Replace the cart wholesale (e.g. restored from client storage),
    /// recomputing the total rather than trusting a stored one.
    pub fn load(items: Vec<CartItem>) -> Self {
        let mut cart = Self { items, total: 0 };
        cart.recompute_total();
        cart
    }

    /// Freeze the cart into the order payload submitted at confirmation.
    pub fn into_order_draft(self, user_id: String, total_savings: i64) -> OrderDraft {
        let original_quantity: i64 = self.items.iter().map(|item| item.quantity).sum();
        let total_items = self.items.len() as i64;
        let items = self
            .items
            .into_iter()
            .map(|item| OrderItem {
                item_id: item.item_id,
                shop_id: item.shop_id,
                name: item.name,
                quantity: item.quantity,
                base_price: item.price,
                final_price: item.price,
                applied_offer: None,
            })
            .collect();
        OrderDraft {
            user_id,
            items,
            cart_total: self.total,
            total_items,
            original_quantity,
            total_savings,
        }
    }

    fn recompute_total(&mut self) {
        self.total = self
            .items
            .iter()
            .map(|item| item.price * item.quantity)
            .sum();
    }
}
