//! # Cart Rules
//!
//! The pure part of the cart: merging adds, quantity changes, removal and
//! selection. Persistence lives in `storefront-client::cart_store`, which
//! applies these rules and then writes the result to local storage or the
//! remote cart.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  UI Action               Cart method           CartChange              │
//! │  ─────────               ───────────           ──────────              │
//! │                                                                         │
//! │  Add to cart ──────────► add_item() ─────────► Added / QuantityChanged │
//! │                                                                         │
//! │  Tap + ────────────────► increment() ────────► QuantityChanged         │
//! │                                                                         │
//! │  Tap − ────────────────► decrement() ────────► QuantityChanged         │
//! │                                                 / Removed (at qty 1)    │
//! │                                                                         │
//! │  Swipe to delete ──────► remove_item() ──────► Removed                 │
//! │                                                                         │
//! │  Pick rental dates ────► set_rental_selection()                         │
//! │                                                                         │
//! │  Go to checkout ───────► select() ───────────► (read only)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{CartItemCandidate, CartLineItem, RentalSelection};
use crate::validation::validate_present;

/// The effect of a cart mutation, so the caller knows what to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartChange {
    /// A new line was appended.
    Added(CartLineItem),
    /// An existing line now has this quantity.
    QuantityChanged { id: String, quantity: i64 },
    /// A line left the cart.
    Removed(CartLineItem),
}

/// A line that repeats the variant of an earlier line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatedLine {
    /// Id of the first line with this variant.
    pub keep_id: String,
    pub line: CartLineItem,
}

/// Splits lines into first-of-variant lines and later repeats.
///
/// Unlike [`Cart::from_items`] nothing is summed: a repeat that still exists
/// elsewhere (e.g. on the server) must only be folded into its survivor once
/// it is gone, or its quantity is counted twice. Lines with quantity < 1 and
/// repeated ids are dropped.
pub fn split_repeated_variants(
    items: Vec<CartLineItem>,
) -> (Vec<CartLineItem>, Vec<RepeatedLine>) {
    let mut kept: Vec<CartLineItem> = Vec::new();
    let mut repeats: Vec<RepeatedLine> = Vec::new();

    for item in items {
        if item.quantity < 1
            || kept.iter().any(|i| i.id == item.id)
            || repeats.iter().any(|r| r.line.id == item.id)
        {
            continue;
        }
        let first = kept.iter().find(|i| {
            i.is_same_variant(&item.product_id, &item.color, &item.size, &item.condition)
        });
        match first {
            Some(first) => repeats.push(RepeatedLine {
                keep_id: first.id.clone(),
                line: item,
            }),
            None => kept.push(item),
        }
    }
    (kept, repeats)
}

/// An ordered list of cart lines.
///
/// ## Invariants
/// - Lines are unique by `id`
/// - No two lines share `(product_id, color, size, condition)`
/// - Every line has quantity >= 1 (dropping below 1 removes the line)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartLineItem>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { items: Vec::new() }
    }

    /// Builds a cart from lines read back from storage or the API.
    ///
    /// Lines with quantity < 1 are dropped, repeated ids keep the first
    /// occurrence, and repeated variants are merged into the first line by
    /// summing quantities.
    pub fn from_items(items: Vec<CartLineItem>) -> Self {
        let mut cart = Cart::new();
        for item in items {
            if item.quantity < 1 || cart.get(&item.id).is_some() {
                continue;
            }
            let existing = cart.items.iter_mut().find(|i| {
                i.is_same_variant(&item.product_id, &item.color, &item.size, &item.condition)
            });
            match existing {
                Some(line) => line.quantity += item.quantity,
                None => cart.items.push(item),
            }
        }
        cart
    }

    /// Lines in cart order.
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<CartLineItem> {
        self.items
    }

    pub fn get(&self, id: &str) -> Option<&CartLineItem> {
        self.items.iter().find(|i| i.id == id)
    }

    fn get_mut(&mut self, id: &str) -> CoreResult<&mut CartLineItem> {
        self.items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| CoreError::ItemNotFound(id.to_string()))
    }

    /// Adds one unit of a product variant.
    ///
    /// ## Behavior
    /// - `product_id`, `color`, `size`, `condition` must all be present,
    ///   otherwise the cart is left untouched and `Validation` is returned
    /// - Variant already in cart: quantity + 1
    /// - Otherwise: a new line with quantity 1 and the id from `new_id`
    pub fn add_item(
        &mut self,
        candidate: &CartItemCandidate,
        new_id: impl FnOnce() -> String,
    ) -> CoreResult<CartChange> {
        let product_id = validate_present("productId", candidate.product_id.as_deref())?;
        let color = validate_present("color", candidate.color.as_deref())?;
        let size = validate_present("size", candidate.size.as_deref())?;
        let condition = validate_present("condition", candidate.condition.as_deref())?;

        if let Some(line) = self
            .items
            .iter_mut()
            .find(|i| i.is_same_variant(product_id, color, size, condition))
        {
            line.quantity += 1;
            return Ok(CartChange::QuantityChanged {
                id: line.id.clone(),
                quantity: line.quantity,
            });
        }

        let item = CartLineItem {
            id: new_id(),
            product_id: product_id.to_string(),
            product_name: candidate.product_name.clone(),
            image_url: candidate.image_url.clone(),
            unit_price: candidate.unit_price,
            rental_unit_price: candidate.rental_unit_price,
            quantity: 1,
            color: color.to_string(),
            size: size.to_string(),
            condition: condition.to_string(),
            rental_selection: None,
        };
        self.items.push(item.clone());
        Ok(CartChange::Added(item))
    }

    /// Adds one to a line's quantity.
    pub fn increment(&mut self, id: &str) -> CoreResult<CartChange> {
        let line = self.get_mut(id)?;
        line.quantity += 1;
        Ok(CartChange::QuantityChanged {
            id: line.id.clone(),
            quantity: line.quantity,
        })
    }

    /// Subtracts one from a line's quantity, removing it at quantity 1.
    pub fn decrement(&mut self, id: &str) -> CoreResult<CartChange> {
        if self.get_mut(id)?.quantity <= 1 {
            return self
                .remove_item(id)
                .map(CartChange::Removed)
                .ok_or_else(|| CoreError::ItemNotFound(id.to_string()));
        }

        let line = self.get_mut(id)?;
        line.quantity -= 1;
        Ok(CartChange::QuantityChanged {
            id: line.id.clone(),
            quantity: line.quantity,
        })
    }

    /// Removes a line by id, returning it if it was present.
    pub fn remove_item(&mut self, id: &str) -> Option<CartLineItem> {
        let pos = self.items.iter().position(|i| i.id == id)?;
        Some(self.items.remove(pos))
    }

    /// Removes every line whose id is listed, returning the removed lines.
    pub fn remove_items<S: AsRef<str>>(&mut self, ids: &[S]) -> Vec<CartLineItem> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|i| ids.iter().any(|id| id.as_ref() == i.id));
        self.items = kept;
        removed
    }

    /// Clears all lines, returning what was there.
    pub fn clear(&mut self) -> Vec<CartLineItem> {
        std::mem::take(&mut self.items)
    }

    /// Returns the lines matching `ids`, in cart order.
    ///
    /// Unknown ids are ignored. The cart is not modified: selected lines stay
    /// in the cart until the order is placed.
    pub fn select<S: AsRef<str>>(&self, ids: &[S]) -> Vec<CartLineItem> {
        self.items
            .iter()
            .filter(|i| ids.iter().any(|id| id.as_ref() == i.id))
            .cloned()
            .collect()
    }

    /// Attaches (or with `None`, detaches) a rental selection.
    pub fn set_rental_selection(
        &mut self,
        id: &str,
        selection: Option<RentalSelection>,
    ) -> CoreResult<()> {
        let line = self.get_mut(id)?;
        line.rental_selection = selection;
        Ok(())
    }

    /// Replaces a local id with the id the server assigned.
    pub fn reassign_id(&mut self, old_id: &str, new_id: &str) -> CoreResult<()> {
        let line = self.get_mut(old_id)?;
        line.id = new_id.to_string();
        Ok(())
    }

    /// Returns the number of lines.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the total quantity across all lines (cart badge count).
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
