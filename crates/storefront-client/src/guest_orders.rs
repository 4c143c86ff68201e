//! # Guest Order Tracker
//!
//! Guests have no order history on the server side, so the device keeps the
//! references itself: a JSON array of [`GuestOrderRecord`] under one
//! storage key.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use storefront_core::{GuestOrderRecord, PlacedOrder, GUEST_ORDERS_KEY};

use crate::error::ClientResult;
use crate::ports::{GuestOrderTracker, LocalStorage};

/// [`GuestOrderTracker`] over [`LocalStorage`].
pub struct LocalGuestOrders {
    storage: Arc<dyn LocalStorage>,
    key: String,
}

impl LocalGuestOrders {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        LocalGuestOrders {
            storage,
            key: GUEST_ORDERS_KEY.to_string(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Recorded orders, oldest first. Unreadable data reads as empty.
    pub async fn list(&self) -> ClientResult<Vec<GuestOrderRecord>> {
        let Some(raw) = self.storage.get(&self.key).await? else {
            return Ok(Vec::new());
        };

        Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "Guest order list is malformed, ignoring it");
            Vec::new()
        }))
    }
}

#[async_trait]
impl GuestOrderTracker for LocalGuestOrders {
    async fn record(&self, order: &PlacedOrder) -> ClientResult<()> {
        let mut records = self.list().await?;
        records.push(GuestOrderRecord::from_placed(order, Utc::now()));

        let json = serde_json::to_string(&records)?;
        self.storage.set(&self.key, &json).await?;

        info!(order_code = %order.order_code, total = records.len(), "Guest order recorded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn placed(n: u32) -> PlacedOrder {
        PlacedOrder {
            id: format!("o-{}", n),
            order_code: format!("OD{:04}", n),
        }
    }

    #[tokio::test]
    async fn test_record_appends() {
        let storage = Arc::new(MemoryStorage::new());
        let tracker = LocalGuestOrders::new(storage.clone());

        assert!(tracker.list().await.unwrap().is_empty());

        tracker.record(&placed(1)).await.unwrap();
        tracker.record(&placed(2)).await.unwrap();

        let records = tracker.list().await.unwrap();
        let codes: Vec<&str> = records.iter().map(|r| r.order_code.as_str()).collect();
        assert_eq!(codes, vec!["OD0001", "OD0002"]);

        let raw = storage.get(GUEST_ORDERS_KEY).await.unwrap().unwrap();
        assert!(raw.contains("\"orderCode\":\"OD0001\""));
        assert!(raw.contains("placedAt"));
    }

    #[tokio::test]
    async fn test_malformed_list_is_replaced() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set("orders", "oops").await.unwrap();
        let tracker = LocalGuestOrders::new(storage).with_key("orders");

        assert!(tracker.list().await.unwrap().is_empty());
        tracker.record(&placed(3)).await.unwrap();
        assert_eq!(tracker.list().await.unwrap().len(), 1);
    }
}
