//! # Domain Types
//!
//! Core domain types used throughout the storefront.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  CartLineItem   │   │ RentalSelection │   │    Session      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  start          │   │  Guest          │       │
//! │  │  product_id     │   │  end            │   │  Authenticated  │       │
//! │  │  unit_price     │   │  day_count      │   │   { token }     │       │
//! │  │  quantity       │   └─────────────────┘   └─────────────────┘       │
//! │  │  color/size/    │                                                    │
//! │  │  condition      │   ┌─────────────────┐   ┌─────────────────┐       │
//! │  └─────────────────┘   │ TransactionType │   │ DeliveryMethod  │       │
//! │                        │  Purchase       │   │  HomeDelivery   │       │
//! │                        │  Rental         │   │  StorePickup    │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Line Identity
//! A cart line is identified by `id` for mutations, but two lines may never
//! share the same `(product_id, color, size, condition)` variant.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreResult;
use crate::money::Money;
use crate::pricing;

// =============================================================================
// Transaction & Delivery
// =============================================================================

/// Whether the selected items are bought outright or rented for a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Outright purchase, priced by `unit_price`.
    Purchase,
    /// Time-bounded rental, priced by `rental_unit_price` per day.
    Rental,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Purchase => write!(f, "PURCHASE"),
            TransactionType::Rental => write!(f, "RENTAL"),
        }
    }
}

/// How the order reaches the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryMethod {
    /// Shipped to an address; the transport fee applies.
    HomeDelivery,
    /// Collected at a branch; requires a branch with stock.
    StorePickup,
}

// =============================================================================
// Rental Selection
// =============================================================================

/// A rental date range attached to a cart line.
///
/// ## Invariant
/// `end > start`, and `day_count` is the number of days between them
/// (2024-01-01 → 2024-01-04 is 3 days). Build one with
/// [`RentalSelection::new`] to get both guaranteed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RentalSelection {
    /// First rental day.
    #[ts(as = "String")]
    pub start: NaiveDate,

    /// Return day.
    #[ts(as = "String")]
    pub end: NaiveDate,

    /// Number of rental days used as the price multiplier.
    pub day_count: u32,
}

impl RentalSelection {
    /// Creates a selection, deriving `day_count` from the dates.
    pub fn new(start: NaiveDate, end: NaiveDate) -> CoreResult<Self> {
        let day_count = pricing::day_count(start, end)?;
        Ok(RentalSelection {
            start,
            end,
            day_count,
        })
    }

    /// Checks the `end > start` rule.
    ///
    /// Selections read back from storage bypass [`RentalSelection::new`], so
    /// callers re-check before pricing.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.end > self.start
    }
}

// =============================================================================
// Cart Line Item
// =============================================================================

/// A line in the cart.
///
/// This is also the element type of the persisted guest cart array, so the
/// serialized names are part of the on-device format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    /// Local id for guest lines; server-assigned id once synced.
    #[serde(alias = "cartItemId")]
    pub id: String,

    pub product_id: String,

    #[serde(default)]
    pub product_name: String,

    #[serde(default)]
    pub image_url: Option<String>,

    /// Purchase price per unit.
    #[serde(default)]
    pub unit_price: Money,

    /// Rental price per unit per day.
    #[serde(default)]
    pub rental_unit_price: Money,

    /// Always >= 1 while the line exists.
    pub quantity: i64,

    #[serde(default)]
    pub color: String,

    #[serde(default)]
    pub size: String,

    #[serde(default)]
    pub condition: String,

    /// Present only while the line is being checked out as a rental.
    #[serde(default)]
    pub rental_selection: Option<RentalSelection>,
}

impl CartLineItem {
    /// Creates a line with quantity 1, zero prices, and no variant.
    pub fn new(
        id: impl Into<String>,
        product_id: impl Into<String>,
        product_name: impl Into<String>,
    ) -> Self {
        CartLineItem {
            id: id.into(),
            product_id: product_id.into(),
            product_name: product_name.into(),
            image_url: None,
            unit_price: Money::zero(),
            rental_unit_price: Money::zero(),
            quantity: 1,
            color: String::new(),
            size: String::new(),
            condition: String::new(),
            rental_selection: None,
        }
    }

    /// Checks whether this line is the same product variant.
    pub fn is_same_variant(
        &self,
        product_id: &str,
        color: &str,
        size: &str,
        condition: &str,
    ) -> bool {
        self.product_id == product_id
            && self.color == color
            && self.size == size
            && self.condition == condition
    }

    /// Returns true when the line carries a usable rental date range.
    pub fn has_complete_rental_selection(&self) -> bool {
        self.rental_selection.is_some_and(|s| s.is_valid())
    }
}

/// What the UI hands to the cart when "add to cart" is pressed.
///
/// Variant fields are optional here because the product screen may not have
/// collected them yet; [`crate::cart::Cart::add_item`] rejects the candidate
/// until all of them are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartItemCandidate {
    pub product_id: Option<String>,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub unit_price: Money,
    #[serde(default)]
    pub rental_unit_price: Money,
    pub color: Option<String>,
    pub size: Option<String>,
    pub condition: Option<String>,
}

// =============================================================================
// Session & Credentials
// =============================================================================

/// Cart backing mode, fixed for the lifetime of a cart store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CartMode {
    /// Backed by on-device storage.
    Guest,
    /// Backed by the remote cart API.
    Authenticated,
}

/// Bearer token for the storefront API.
///
/// `Debug` never prints the token.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        AuthToken(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// Explicit credentials for one user session.
///
/// Passed into the cart store and the order composer at construction so
/// nothing deep in a call chain looks a token up on its own.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    Guest,
    Authenticated {
        token: AuthToken,
        user_id: Option<String>,
    },
}

impl Session {
    /// Builds a session from whatever the secure token store returned.
    ///
    /// A missing or blank token means guest.
    pub fn from_token(token: Option<String>, user_id: Option<String>) -> Self {
        match token {
            Some(t) if !t.trim().is_empty() => Session::Authenticated {
                token: AuthToken::new(t),
                user_id,
            },
            _ => Session::Guest,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated { .. })
    }

    pub fn token(&self) -> Option<&AuthToken> {
        match self {
            Session::Guest => None,
            Session::Authenticated { token, .. } => Some(token),
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Session::Guest => None,
            Session::Authenticated { user_id, .. } => user_id.as_deref(),
        }
    }

    pub fn cart_mode(&self) -> CartMode {
        if self.is_authenticated() {
            CartMode::Authenticated
        } else {
            CartMode::Guest
        }
    }
}

// =============================================================================
// Customer
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Contact details collected at checkout.
///
/// For authenticated users most of these come from the profile; guests type
/// them in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub user_id: Option<String>,
}

// =============================================================================
// Branches
// =============================================================================

/// A physical pickup location with its own stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    /// Products this branch cannot currently hand out.
    #[serde(default)]
    pub out_of_stock_product_ids: Vec<String>,
}

impl Branch {
    pub fn is_out_of_stock(&self, product_id: &str) -> bool {
        self.out_of_stock_product_ids.iter().any(|p| p == product_id)
    }
}

/// Branch list as returned by the branch/inventory collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchAvailability {
    pub branches: Vec<Branch>,
}

impl BranchAvailability {
    pub fn new(branches: Vec<Branch>) -> Self {
        BranchAvailability { branches }
    }

    pub fn find(&self, branch_id: &str) -> Option<&Branch> {
        self.branches.iter().find(|b| b.id == branch_id)
    }
}

// =============================================================================
// Costs & Placed Orders
// =============================================================================

/// Computed order costs. Never user-supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderCosts {
    pub sub_total: Money,
    pub transport_fee: Money,
    pub total_amount: Money,
}

/// Acknowledgement from the order-placement collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub id: String,
    pub order_code: String,
}

/// A placed order remembered on-device for a guest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct GuestOrderRecord {
    pub id: String,
    pub order_code: String,
    #[ts(as = "String")]
    pub placed_at: DateTime<Utc>,
}

impl GuestOrderRecord {
    pub fn from_placed(order: &PlacedOrder, placed_at: DateTime<Utc>) -> Self {
        GuestOrderRecord {
            id: order.id.clone(),
            order_code: order.order_code.clone(),
            placed_at,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
