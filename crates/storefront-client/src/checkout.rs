//! # Checkout Service
//!
//! Runs one order submission end to end.
//!
//! ## User Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Checkout Submission                              │
//! │                                                                         │
//! │  "Place order" tapped                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CartStore::select_items(ids)                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  STORE_PICKUP? ── yes ──► BranchInventory::branches(product ids)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  OrderComposer::prepare ──── validation error? ──► back to the form     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  OrderPlacement::place_order ── failure? ──► error, cart untouched      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CartStore::remove_items(submitted ids)                                 │
//! │  guest only: GuestOrderTracker::record()                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CheckoutOutcome { order, costs }                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Once the order is placed, failures to purge the cart or record the guest
//! order are logged and do not turn the outcome into an error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use storefront_core::order::{OrderComposer, OrderDraft};
use storefront_core::{
    CustomerInfo, DeliveryMethod, Money, OrderCosts, PlacedOrder, TransactionType,
};

use crate::cart_store::CartStore;
use crate::error::{ClientError, ClientResult};
use crate::ports::{BranchInventory, GuestOrderTracker, OrderPlacement};

/// What the checkout form submits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Cart line ids the customer ticked.
    pub item_ids: Vec<String>,
    pub transaction_type: TransactionType,
    pub delivery_method: DeliveryMethod,
    #[serde(default)]
    pub customer: CustomerInfo,
    #[serde(default)]
    pub branch_id: Option<String>,
    #[serde(default)]
    pub shipment_detail_id: Option<String>,
    /// Overrides the configured default for home delivery.
    #[serde(default)]
    pub transport_fee: Option<Money>,
    #[serde(default)]
    pub discount_code: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub date_of_receipt: Option<NaiveDate>,
}

impl CheckoutRequest {
    pub fn new(
        item_ids: Vec<String>,
        transaction_type: TransactionType,
        delivery_method: DeliveryMethod,
    ) -> Self {
        CheckoutRequest {
            item_ids,
            transaction_type,
            delivery_method,
            customer: CustomerInfo::default(),
            branch_id: None,
            shipment_detail_id: None,
            transport_fee: None,
            discount_code: None,
            note: None,
            date_of_receipt: None,
        }
    }
}

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutOutcome {
    pub order: PlacedOrder,
    pub costs: OrderCosts,
    pub transaction_type: TransactionType,
}

/// Clears the submitting flag when a submission ends, however it ends.
struct SubmittingGuard<'a>(&'a AtomicBool);

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Places orders for one session.
pub struct CheckoutService {
    composer: OrderComposer,
    cart: Arc<CartStore>,
    orders: Arc<dyn OrderPlacement>,
    branches: Arc<dyn BranchInventory>,
    guest_orders: Arc<dyn GuestOrderTracker>,
    default_transport_fee: Money,
    submitting: AtomicBool,
}

impl CheckoutService {
    /// Builds a service for the cart store's session.
    pub fn new(
        cart: Arc<CartStore>,
        orders: Arc<dyn OrderPlacement>,
        branches: Arc<dyn BranchInventory>,
        guest_orders: Arc<dyn GuestOrderTracker>,
    ) -> Self {
        CheckoutService {
            composer: OrderComposer::new(cart.session().clone()),
            cart,
            orders,
            branches,
            guest_orders,
            default_transport_fee: Money::zero(),
            submitting: AtomicBool::new(false),
        }
    }

    /// Fee applied to home delivery when the request carries none.
    pub fn with_default_transport_fee(mut self, fee: Money) -> Self {
        self.default_transport_fee = fee;
        self
    }

    /// True while a submission is in flight.
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::SeqCst)
    }

    /// Builds the draft for the selected lines.
    ///
    /// Store pickup carries no transport fee.
    async fn draft(&self, request: CheckoutRequest) -> OrderDraft {
        let line_items = self.cart.select_items(&request.item_ids).await;
        let transport_fee = match request.delivery_method {
            DeliveryMethod::HomeDelivery => {
                Some(request.transport_fee.unwrap_or(self.default_transport_fee))
            }
            DeliveryMethod::StorePickup => None,
        };

        OrderDraft {
            customer: request.customer,
            delivery_method: request.delivery_method,
            branch_id: request.branch_id,
            shipment_detail_id: request.shipment_detail_id,
            transaction_type: request.transaction_type,
            line_items,
            transport_fee,
            discount_code: request.discount_code,
            note: request.note,
            date_of_receipt: request.date_of_receipt,
        }
    }

    /// Validates, prices and places an order, then purges the cart.
    ///
    /// ## Errors
    /// - `SubmissionInProgress` if another submission is running
    /// - `Core(..)` for anything the customer has to fix; nothing was sent
    /// - `BranchLookup` / `OrderSubmission` for remote failures; the cart is
    ///   untouched and the same request can be submitted again
    pub async fn submit(&self, request: CheckoutRequest) -> ClientResult<CheckoutOutcome> {
        if self.submitting.swap(true, Ordering::SeqCst) {
            return Err(ClientError::SubmissionInProgress);
        }
        let _guard = SubmittingGuard(&self.submitting);

        let draft = self.draft(request).await;
        debug!(
            items = draft.line_items.len(),
            transaction_type = %draft.transaction_type,
            "Preparing order"
        );

        let branches = match draft.delivery_method {
            DeliveryMethod::StorePickup => {
                Some(self.branches.branches(&draft.product_ids()).await?)
            }
            DeliveryMethod::HomeDelivery => None,
        };

        let payload = self.composer.prepare(&draft, branches.as_ref())?;
        let costs = payload.costs();

        let order = self
            .orders
            .place_order(self.composer.session(), &payload)
            .await
            .map_err(|e| {
                warn!(error = %e, retryable = e.is_retryable(), "Order placement failed");
                e
            })?;
        info!(
            order_code = %order.order_code,
            total = costs.total_amount.amount(),
            "Order placed"
        );

        self.purge_cart(&draft).await;

        if !self.composer.session().is_authenticated() {
            if let Err(e) = self.guest_orders.record(&order).await {
                warn!(order_code = %order.order_code, error = %e, "Failed to record guest order");
            }
        }

        Ok(CheckoutOutcome {
            order,
            costs,
            transaction_type: draft.transaction_type,
        })
    }

    /// Drops the ordered lines. Lines the customer did not tick stay in the
    /// cart in both modes.
    async fn purge_cart(&self, draft: &OrderDraft) {
        if let Err(e) = self.cart.remove_items(&draft.line_item_ids()).await {
            warn!(error = %e, "Order placed but the cart could not be updated");
        }
    }
}
