//! # storefront-client: Cart Store and Checkout for the Mobile Storefront
//!
//! The I/O layer around `storefront-core`. It owns the cart state for a
//! session, talks to the storefront API, keeps guest data on the device, and
//! runs order submission.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Client Architecture                              │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                  CheckoutService (Orchestrator)                  │  │
//! │  │                                                                  │  │
//! │  │  select → branches → prepare → place → purge → record           │  │
//! │  └───────┬───────────────────────┬───────────────────────┬──────────┘  │
//! │          ▼                       ▼                       ▼             │
//! │  ┌────────────────┐  ┌──────────────────────┐  ┌────────────────────┐  │
//! │  │   CartStore    │  │   ports (traits)     │  │ LocalGuestOrders   │  │
//! │  │                │  │                      │  │                    │  │
//! │  │ GUEST: local   │  │ RemoteCart           │  │ order refs kept    │  │
//! │  │  storage       │  │ OrderPlacement       │  │ on the device      │  │
//! │  │ AUTH: remote   │  │ BranchInventory      │  │                    │  │
//! │  │  cart API      │  │ LocalStorage         │  │                    │  │
//! │  └────────────────┘  └──────────┬───────────┘  └────────────────────┘  │
//! │                                 │                                       │
//! │                  ┌──────────────┴──────────────┐                        │
//! │                  ▼                             ▼                        │
//! │         ┌────────────────┐           ┌──────────────────┐               │
//! │         │   ApiClient    │           │ FileStorage /    │               │
//! │         │   (reqwest)    │           │ MemoryStorage    │               │
//! │         └────────────────┘           └──────────────────┘               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`api`] - HTTP adapters for the cart, order and branch endpoints
//! - [`cart_store`] - Session-aware cart with guest/authenticated persistence
//! - [`checkout`] - Order submission
//! - [`config`] - Client configuration (API URL, storage, checkout defaults)
//! - [`error`] - Client error types and user-facing error mapping
//! - [`guest_orders`] - Order references for guest checkouts
//! - [`ports`] - Traits for storage and remote services
//! - [`storage`] - File and in-memory local storage
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use storefront_client::{ApiClient, CartStore, CheckoutService, ClientConfig, FileStorage};
//! use storefront_client::guest_orders::LocalGuestOrders;
//! use storefront_core::Session;
//!
//! let config = ClientConfig::load_or_default(None);
//! let api = Arc::new(ApiClient::from_config(&config)?);
//! let storage = Arc::new(FileStorage::new(config.data_dir()));
//!
//! let cart = Arc::new(CartStore::new(Session::Guest, storage.clone(), api.clone()));
//! cart.load().await;
//!
//! let checkout = CheckoutService::new(
//!     cart.clone(),
//!     api.clone(),
//!     api,
//!     Arc::new(LocalGuestOrders::new(storage)),
//! )
//! .with_default_transport_fee(config.default_transport_fee());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod api;
pub mod cart_store;
pub mod checkout;
pub mod config;
pub mod error;
pub mod guest_orders;
pub mod ports;
pub mod storage;

// =============================================================================
// Re-exports
// =============================================================================

pub use api::ApiClient;
pub use cart_store::{CartStore, LoadState};
pub use checkout::{CheckoutOutcome, CheckoutRequest, CheckoutService};
pub use config::{ApiSettings, CheckoutSettings, ClientConfig, StorageSettings};
pub use error::{ClientError, ClientResult, ErrorCode, UserError};
pub use guest_orders::LocalGuestOrders;
pub use ports::{BranchInventory, GuestOrderTracker, LocalStorage, OrderPlacement, RemoteCart};
pub use storage::{FileStorage, MemoryStorage};
