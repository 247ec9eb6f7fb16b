//! Session-related types.
//!
//! Types stored in the visitor's session between requests.

use funda_core::{CartCount, CaseId};
use serde::{Deserialize, Serialize};

/// Session keys.
pub mod keys {
    /// Key for the visitor's tracking session id.
    pub const TRACKING_ID: &str = "tracking_id";

    /// Key for the cart contents.
    pub const CART: &str = "cart";
}

/// One cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub case_id: CaseId,
    pub quantity: u32,
}

/// Session-stored cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Add `quantity` of a case, merging with an existing line.
    pub fn add(&mut self, case_id: CaseId, quantity: u32) {
        if quantity == 0 {
            return;
        }
        match self.lines.iter_mut().find(|line| line.case_id == case_id) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.lines.push(CartLine { case_id, quantity }),
        }
    }
}

impl CartCount for Cart {
    fn total_items(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |total, line| total.saturating_add(line.quantity))
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_add_merges_lines() {
        let id = CaseId::new(Uuid::new_v4());
        let mut cart = Cart::default();
        cart.add(id, 1);
        cart.add(id, 2);
        cart.add(CaseId::new(Uuid::new_v4()), 1);
        cart.add(CaseId::new(Uuid::new_v4()), 0);

        assert_eq!(cart.lines.len(), 2);
        assert_eq!(cart.total_items(), 4);
    }

    #[test]
    fn test_empty_cart() {
        assert_eq!(Cart::default().total_items(), 0);
    }
}
