//! # storefront-core: Pure Cart & Order Logic
//!
//! This crate holds the cart, pricing and order-composition rules of the
//! storefront as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Storefront Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Mobile UI (out of scope)                     │   │
//! │  │    Product ──► Cart ──► Checkout ──► Order confirmation         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               storefront-client (CartStore, API, checkout)      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ storefront-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌──────────┐  ┌─────────────────┐  │   │
//! │  │   │  money  │  │  cart   │  │ pricing  │  │      order      │  │   │
//! │  │   │  Money  │  │  Cart   │  │ line     │  │  OrderComposer  │  │   │
//! │  │   │         │  │  merge  │  │ totals   │  │  OrderPayload   │  │   │
//! │  │   └─────────┘  └─────────┘  └──────────┘  └─────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO STORAGE • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (CartLineItem, Session, Branch, etc.)
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level input rules
//! - [`cart`] - Cart merge and quantity rules
//! - [`pricing`] - Purchase and rental totals
//! - [`order`] - Checkout validation and order payload composition
//!
//! ## Example Usage
//!
//! ```rust
//! use storefront_core::money::Money;
//! use storefront_core::pricing::aggregate;
//! use storefront_core::types::{CartLineItem, TransactionType};
//!
//! let mut item = CartLineItem::new("line-1", "shirt-01", "Linen shirt");
//! item.unit_price = Money::new(100_000);
//! item.quantity = 2;
//!
//! let costs = aggregate(&[item], TransactionType::Purchase, Some(Money::new(15_000))).unwrap();
//! assert_eq!(costs.sub_total.amount(), 200_000);
//! assert_eq!(costs.total_amount.amount(), 215_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod order;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{split_repeated_variants, Cart, CartChange, RepeatedLine};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use order::{OrderComposer, OrderDraft, OrderPayload};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Storage key under which the guest cart array is persisted.
pub const GUEST_CART_KEY: &str = "cart";

/// Storage key under which guest order references are persisted.
pub const GUEST_ORDERS_KEY: &str = "guestOrders";
