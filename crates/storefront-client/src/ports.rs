//! # Collaborator Ports
//!
//! The traits the cart store and checkout talk to. `api::ApiClient`
//! implements the remote ones over HTTP; `storage` and `guest_orders`
//! implement the local ones.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CartStore ─────────► RemoteCart        (authenticated carts)           │
//! │            └────────► LocalStorage      (guest carts)                   │
//! │                                                                         │
//! │  CheckoutService ───► OrderPlacement    (POST /orders)                  │
//! │                  ├──► BranchInventory   (pickup availability)           │
//! │                  └──► GuestOrderTracker (guest order references)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use storefront_core::order::OrderPayload;
use storefront_core::{AuthToken, BranchAvailability, CartLineItem, PlacedOrder, Session};

use crate::error::ClientResult;

/// String key/value persistence on the device.
///
/// Advisory: callers treat a missing or unreadable value as empty.
#[async_trait]
pub trait LocalStorage: Send + Sync {
    async fn get(&self, key: &str) -> ClientResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> ClientResult<()>;

    async fn remove(&self, key: &str) -> ClientResult<()>;
}

/// Body of a remote "add to cart" call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRemoteLine {
    pub product_id: String,
    pub color: String,
    pub size: String,
    pub condition: String,
    pub quantity: i64,
}

impl From<&CartLineItem> for NewRemoteLine {
    fn from(item: &CartLineItem) -> Self {
        NewRemoteLine {
            product_id: item.product_id.clone(),
            color: item.color.clone(),
            size: item.size.clone(),
            condition: item.condition.clone(),
            quantity: item.quantity,
        }
    }
}

/// The server-side cart of an authenticated user.
#[async_trait]
pub trait RemoteCart: Send + Sync {
    async fn fetch(&self, token: &AuthToken) -> ClientResult<Vec<CartLineItem>>;

    /// Creates a line and returns it with its server-assigned id.
    async fn add(&self, token: &AuthToken, line: &NewRemoteLine) -> ClientResult<CartLineItem>;

    async fn update_quantity(&self, token: &AuthToken, id: &str, quantity: i64)
        -> ClientResult<()>;

    async fn remove(&self, token: &AuthToken, id: &str) -> ClientResult<()>;
}

/// Accepts composed orders.
#[async_trait]
pub trait OrderPlacement: Send + Sync {
    /// Submits a payload. Authenticated sessions send their bearer token.
    async fn place_order(
        &self,
        session: &Session,
        payload: &OrderPayload,
    ) -> ClientResult<PlacedOrder>;
}

/// Per-branch stock for store pickup.
#[async_trait]
pub trait BranchInventory: Send + Sync {
    async fn branches(&self, product_ids: &[String]) -> ClientResult<BranchAvailability>;
}

/// Remembers orders placed without an account.
#[async_trait]
pub trait GuestOrderTracker: Send + Sync {
    async fn record(&self, order: &PlacedOrder) -> ClientResult<()>;
}

// =============================================================================
// In-Memory Fakes
// =============================================================================

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use crate::error::ClientError;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use storefront_core::Branch;

    /// Remote cart backed by a vector, recording every call.
    #[derive(Default)]
    pub struct FakeRemoteCart {
        pub lines: Mutex<Vec<CartLineItem>>,
        pub calls: Mutex<Vec<String>>,
        pub fail: AtomicBool,
        next_id: AtomicUsize,
    }

    impl FakeRemoteCart {
        pub fn with_lines(lines: Vec<CartLineItem>) -> Self {
            FakeRemoteCart {
                lines: Mutex::new(lines),
                ..Default::default()
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn call(&self, name: String) -> ClientResult<()> {
            self.calls.lock().unwrap().push(name);
            if self.fail.load(Ordering::SeqCst) {
                return Err(ClientError::RemoteCart {
                    status: None,
                    message: "connection refused".into(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl RemoteCart for FakeRemoteCart {
        async fn fetch(&self, _token: &AuthToken) -> ClientResult<Vec<CartLineItem>> {
            self.call("fetch".into())?;
            Ok(self.lines.lock().unwrap().clone())
        }

        async fn add(&self, _token: &AuthToken, line: &NewRemoteLine) -> ClientResult<CartLineItem> {
            self.call(format!("add {}", line.product_id))?;
            let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            let mut item = CartLineItem::new(format!("srv-{}", n), &line.product_id, "");
            item.color = line.color.clone();
            item.size = line.size.clone();
            item.condition = line.condition.clone();
            item.quantity = line.quantity;
            self.lines.lock().unwrap().push(item.clone());
            Ok(item)
        }

        async fn update_quantity(
            &self,
            _token: &AuthToken,
            id: &str,
            quantity: i64,
        ) -> ClientResult<()> {
            self.call(format!("update {} {}", id, quantity))?;
            if let Some(line) = self.lines.lock().unwrap().iter_mut().find(|l| l.id == id) {
                line.quantity = quantity;
            }
            Ok(())
        }

        async fn remove(&self, _token: &AuthToken, id: &str) -> ClientResult<()> {
            self.call(format!("remove {}", id))?;
            self.lines.lock().unwrap().retain(|l| l.id != id);
            Ok(())
        }
    }

    /// Order placement that records payloads.
    #[derive(Default)]
    pub struct FakeOrders {
        pub placed: Mutex<Vec<(bool, OrderPayload)>>,
        pub fail_status: Mutex<Option<Option<u16>>>,
    }

    impl FakeOrders {
        pub fn failing(status: Option<u16>) -> Self {
            FakeOrders {
                fail_status: Mutex::new(Some(status)),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl OrderPlacement for FakeOrders {
        async fn place_order(
            &self,
            session: &Session,
            payload: &OrderPayload,
        ) -> ClientResult<PlacedOrder> {
            if let Some(status) = *self.fail_status.lock().unwrap() {
                return Err(ClientError::OrderSubmission {
                    status,
                    message: "rejected".into(),
                });
            }
            let mut placed = self.placed.lock().unwrap();
            placed.push((session.is_authenticated(), payload.clone()));
            Ok(PlacedOrder {
                id: format!("order-{}", placed.len()),
                order_code: format!("OD{:04}", placed.len()),
            })
        }
    }

    /// Branch inventory returning a fixed list.
    pub struct FakeBranches(pub Vec<Branch>);

    #[async_trait]
    impl BranchInventory for FakeBranches {
        async fn branches(&self, _product_ids: &[String]) -> ClientResult<BranchAvailability> {
            Ok(BranchAvailability::new(self.0.clone()))
        }
    }

    /// Local storage whose writes always fail.
    pub struct BrokenStorage;

    #[async_trait]
    impl LocalStorage for BrokenStorage {
        async fn get(&self, _key: &str) -> ClientResult<Option<String>> {
            Err(ClientError::Storage("disk unavailable".into()))
        }

        async fn set(&self, _key: &str, _value: &str) -> ClientResult<()> {
            Err(ClientError::Storage("disk full".into()))
        }

        async fn remove(&self, _key: &str) -> ClientResult<()> {
            Err(ClientError::Storage("disk full".into()))
        }
    }
}
