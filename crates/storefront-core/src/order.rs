//! # Order Composition
//!
//! Turns the customer's checkout choices into a validated order payload.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Checkout Composition                              │
//! │                                                                         │
//! │  OrderDraft (UI input)                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate() ── rental dates, contact info / saved address, branch      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  quote() ───── pricing::aggregate → OrderCosts                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  compose() ─── OrderPayload::Purchase { saleCosts }                     │
//! │                OrderPayload::Rental   { rentalDates, rentalTotals }     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  order placement (storefront-client)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `prepare()` runs all three steps. Nothing here touches the cart: purging
//! submitted lines is the caller's job once the order is accepted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::pricing;
use crate::types::{
    BranchAvailability, CartLineItem, CustomerInfo, DeliveryMethod, OrderCosts, Session,
    TransactionType,
};
use crate::validation::{validate_phone_number, validate_required};

// =============================================================================
// Order Draft
// =============================================================================

/// Everything the customer chose on the checkout screen.
///
/// Costs are deliberately absent: only the transport fee is an input, the
/// rest is computed by [`OrderComposer::quote`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    #[serde(default)]
    pub customer: CustomerInfo,
    pub delivery_method: DeliveryMethod,
    #[serde(default)]
    pub branch_id: Option<String>,
    /// Saved-address id for authenticated home delivery.
    #[serde(default)]
    pub shipment_detail_id: Option<String>,
    pub transaction_type: TransactionType,
    pub line_items: Vec<CartLineItem>,
    #[serde(default)]
    pub transport_fee: Option<Money>,
    #[serde(default)]
    pub discount_code: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub date_of_receipt: Option<NaiveDate>,
}

impl OrderDraft {
    pub fn new(
        transaction_type: TransactionType,
        delivery_method: DeliveryMethod,
        line_items: Vec<CartLineItem>,
    ) -> Self {
        OrderDraft {
            customer: CustomerInfo::default(),
            delivery_method,
            branch_id: None,
            shipment_detail_id: None,
            transaction_type,
            line_items,
            transport_fee: None,
            discount_code: None,
            note: None,
            date_of_receipt: None,
        }
    }

    pub fn with_customer(mut self, customer: CustomerInfo) -> Self {
        self.customer = customer;
        self
    }

    pub fn with_branch(mut self, branch_id: impl Into<String>) -> Self {
        self.branch_id = Some(branch_id.into());
        self
    }

    pub fn with_shipment_detail(mut self, shipment_detail_id: impl Into<String>) -> Self {
        self.shipment_detail_id = Some(shipment_detail_id.into());
        self
    }

    pub fn with_transport_fee(mut self, fee: Money) -> Self {
        self.transport_fee = Some(fee);
        self
    }

    pub fn with_discount_code(mut self, code: impl Into<String>) -> Self {
        self.discount_code = Some(code.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_date_of_receipt(mut self, date: NaiveDate) -> Self {
        self.date_of_receipt = Some(date);
        self
    }

    /// Ids of the selected cart lines, in order.
    pub fn line_item_ids(&self) -> Vec<String> {
        self.line_items.iter().map(|i| i.id.clone()).collect()
    }

    /// Distinct product ids of the selected lines, in first-seen order.
    pub fn product_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for item in &self.line_items {
            if !ids.contains(&item.product_id) {
                ids.push(item.product_id.clone());
            }
        }
        ids
    }
}

// =============================================================================
// Order Payload
// =============================================================================

/// Fields shared by purchase and rental orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderHeader {
    pub customer_information: CustomerInfo,
    pub delivery_method: DeliveryMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<String>,
    #[serde(
        rename = "shipmentDetailID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub shipment_detail_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_receipt: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseProductInformation {
    pub product_id: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub color: String,
    pub size: String,
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalDates {
    pub date_of_receipt: NaiveDate,
    pub rental_start_date: NaiveDate,
    pub rental_end_date: NaiveDate,
    pub rental_days: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalCosts {
    /// Per unit, per day.
    pub rental_price: Money,
    /// `rental_price × quantity × rental_days`.
    pub sub_total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalProductInformation {
    pub product_id: String,
    /// Rental price per unit per day.
    pub unit_price: Money,
    pub quantity: i64,
    pub color: String,
    pub size: String,
    pub condition: String,
    pub rental_dates: RentalDates,
    pub rental_costs: RentalCosts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    #[serde(flatten)]
    pub header: OrderHeader,
    pub product_informations: Vec<PurchaseProductInformation>,
    pub sale_costs: OrderCosts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalOrder {
    #[serde(flatten)]
    pub header: OrderHeader,
    pub product_informations: Vec<RentalProductInformation>,
    pub rental_totals: OrderCosts,
}

/// The body submitted to order placement.
///
/// Serialized with a `transactionType` tag next to the header fields, so a
/// purchase never carries rental blocks and a rental never carries
/// `saleCosts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transactionType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderPayload {
    Purchase(PurchaseOrder),
    Rental(RentalOrder),
}

impl OrderPayload {
    pub fn header(&self) -> &OrderHeader {
        match self {
            OrderPayload::Purchase(order) => &order.header,
            OrderPayload::Rental(order) => &order.header,
        }
    }

    pub fn transaction_type(&self) -> TransactionType {
        match self {
            OrderPayload::Purchase(_) => TransactionType::Purchase,
            OrderPayload::Rental(_) => TransactionType::Rental,
        }
    }

    /// `saleCosts` or `rentalTotals`, whichever applies.
    pub fn costs(&self) -> OrderCosts {
        match self {
            OrderPayload::Purchase(order) => order.sale_costs,
            OrderPayload::Rental(order) => order.rental_totals,
        }
    }

    pub fn product_ids(&self) -> Vec<&str> {
        match self {
            OrderPayload::Purchase(order) => order
                .product_informations
                .iter()
                .map(|p| p.product_id.as_str())
                .collect(),
            OrderPayload::Rental(order) => order
                .product_informations
                .iter()
                .map(|p| p.product_id.as_str())
                .collect(),
        }
    }
}

// =============================================================================
// Order Composer
// =============================================================================

/// Validates drafts and builds payloads for one session.
///
/// Guest/authenticated rules come only from the session passed in here.
#[derive(Debug, Clone)]
pub struct OrderComposer {
    session: Session,
}

impl OrderComposer {
    pub fn new(session: Session) -> Self {
        OrderComposer { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Checks a draft before any pricing or network call.
    ///
    /// `branches` is only consulted for store pickup.
    ///
    /// ## Checks, in order
    /// 1. At least one line, each with quantity >= 1 and a non-negative price
    /// 2. RENTAL: every line has dates with `end > start`
    /// 3. HOME_DELIVERY: saved address (authenticated) or name, address and
    ///    phone (guest)
    /// 4. STORE_PICKUP: the branch exists and stocks every selected product
    pub fn validate(
        &self,
        draft: &OrderDraft,
        branches: Option<&BranchAvailability>,
    ) -> CoreResult<()> {
        if draft.line_items.is_empty() {
            return Err(ValidationError::required("lineItems").into());
        }
        for item in &draft.line_items {
            pricing::check_line(item, draft.transaction_type)?;
        }

        if draft.transaction_type == TransactionType::Rental {
            let item_ids: Vec<String> = draft
                .line_items
                .iter()
                .filter(|i| !i.has_complete_rental_selection())
                .map(|i| i.id.clone())
                .collect();
            if !item_ids.is_empty() {
                return Err(CoreError::IncompleteRentalSelection { item_ids });
            }
        }

        match draft.delivery_method {
            DeliveryMethod::HomeDelivery => self.validate_home_delivery(draft),
            DeliveryMethod::StorePickup => validate_pickup(draft, branches),
        }
    }

    fn validate_home_delivery(&self, draft: &OrderDraft) -> CoreResult<()> {
        if self.session.is_authenticated() {
            let has_address = draft
                .shipment_detail_id
                .as_deref()
                .is_some_and(|id| !id.trim().is_empty());
            if !has_address {
                return Err(CoreError::MissingShippingAddress);
            }
            return Ok(());
        }

        let customer = &draft.customer;
        validate_required("fullName", &customer.full_name).map_err(customer_info_error)?;
        validate_required("address", &customer.address).map_err(customer_info_error)?;
        validate_phone_number(&customer.phone_number).map_err(customer_info_error)?;
        Ok(())
    }

    /// Computes costs for the draft's lines.
    pub fn quote(&self, draft: &OrderDraft) -> CoreResult<OrderCosts> {
        pricing::aggregate(
            &draft.line_items,
            draft.transaction_type,
            draft.transport_fee,
        )
    }

    /// Builds the payload from a draft and its costs.
    ///
    /// Pure: the same inputs always give the same payload. Customer text
    /// fields are trimmed; discount code and note pass through untouched.
    pub fn compose(&self, draft: &OrderDraft, costs: OrderCosts) -> CoreResult<OrderPayload> {
        let header = self.header(draft);

        match draft.transaction_type {
            TransactionType::Purchase => {
                let product_informations = draft
                    .line_items
                    .iter()
                    .map(|item| PurchaseProductInformation {
                        product_id: item.product_id.clone(),
                        unit_price: item.unit_price,
                        quantity: item.quantity,
                        color: item.color.clone(),
                        size: item.size.clone(),
                        condition: item.condition.clone(),
                    })
                    .collect();

                Ok(OrderPayload::Purchase(PurchaseOrder {
                    header,
                    product_informations,
                    sale_costs: costs,
                }))
            }
            TransactionType::Rental => {
                let product_informations = draft
                    .line_items
                    .iter()
                    .map(|item| rental_line(item, draft.date_of_receipt))
                    .collect::<CoreResult<Vec<_>>>()?;

                Ok(OrderPayload::Rental(RentalOrder {
                    header,
                    product_informations,
                    rental_totals: costs,
                }))
            }
        }
    }

    /// Validate, quote and compose in one call.
    pub fn prepare(
        &self,
        draft: &OrderDraft,
        branches: Option<&BranchAvailability>,
    ) -> CoreResult<OrderPayload> {
        self.validate(draft, branches)?;
        let costs = self.quote(draft)?;
        self.compose(draft, costs)
    }

    fn header(&self, draft: &OrderDraft) -> OrderHeader {
        let mut customer = CustomerInfo {
            full_name: draft.customer.full_name.trim().to_string(),
            phone_number: draft.customer.phone_number.trim().to_string(),
            email: draft.customer.email.trim().to_string(),
            address: draft.customer.address.trim().to_string(),
            gender: draft.customer.gender,
            user_id: draft.customer.user_id.clone(),
        };
        match &self.session {
            Session::Guest => customer.user_id = None,
            Session::Authenticated { user_id, .. } => {
                if customer.user_id.is_none() {
                    customer.user_id = user_id.clone();
                }
            }
        }

        let (branch_id, shipment_detail_id) = match draft.delivery_method {
            DeliveryMethod::StorePickup => (draft.branch_id.clone(), None),
            DeliveryMethod::HomeDelivery => (None, draft.shipment_detail_id.clone()),
        };

        OrderHeader {
            customer_information: customer,
            delivery_method: draft.delivery_method,
            branch_id,
            shipment_detail_id,
            date_of_receipt: draft.date_of_receipt,
            discount_code: draft.discount_code.clone(),
            note: draft.note.clone(),
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn validate_pickup(draft: &OrderDraft, branches: Option<&BranchAvailability>) -> CoreResult<()> {
    let branch_id = match draft.branch_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id,
        _ => {
            return Err(CoreError::BranchUnavailable {
                branch_id: None,
                reason: "no pickup branch selected".to_string(),
            })
        }
    };

    let branch = branches
        .and_then(|b| b.find(branch_id))
        .ok_or_else(|| CoreError::BranchUnavailable {
            branch_id: Some(branch_id.to_string()),
            reason: format!("branch {} is not available for pickup", branch_id),
        })?;

    let out_of_stock: Vec<String> = draft
        .product_ids()
        .into_iter()
        .filter(|p| branch.is_out_of_stock(p))
        .collect();
    if !out_of_stock.is_empty() {
        return Err(CoreError::BranchUnavailable {
            branch_id: Some(branch_id.to_string()),
            reason: format!(
                "branch {} is out of stock for {}",
                branch_id,
                out_of_stock.join(", ")
            ),
        });
    }

    Ok(())
}

fn customer_info_error(err: ValidationError) -> CoreError {
    let reason = match &err {
        ValidationError::Required { .. } => "is required".to_string(),
        ValidationError::MustNotBeNegative { .. } => "must not be negative".to_string(),
        ValidationError::InvalidFormat { reason, .. } => reason.clone(),
    };
    CoreError::InvalidCustomerInfo {
        field: err.field().to_string(),
        reason,
    }
}

fn rental_line(
    item: &CartLineItem,
    date_of_receipt: Option<NaiveDate>,
) -> CoreResult<RentalProductInformation> {
    let selection = item
        .rental_selection
        .filter(|s| s.is_valid())
        .ok_or_else(|| CoreError::IncompleteRentalSelection {
            item_ids: vec![item.id.clone()],
        })?;
    let sub_total = pricing::line_total(item, TransactionType::Rental)?;

    Ok(RentalProductInformation {
        product_id: item.product_id.clone(),
        unit_price: item.rental_unit_price,
        quantity: item.quantity,
        color: item.color.clone(),
        size: item.size.clone(),
        condition: item.condition.clone(),
        rental_dates: RentalDates {
            date_of_receipt: date_of_receipt.unwrap_or(selection.start),
            rental_start_date: selection.start,
            rental_end_date: selection.end,
            rental_days: selection.day_count.max(1),
        },
        rental_costs: RentalCosts {
            rental_price: item.rental_unit_price,
            sub_total,
        },
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
