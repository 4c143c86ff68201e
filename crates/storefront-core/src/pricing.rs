//! # Pricing Engine
//!
//! Pure, stateless price calculations for purchase and rental checkouts.
//!
//! ## Formulas
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Line & Order Totals                              │
//! │                                                                         │
//! │  PURCHASE   line = unit_price × quantity                               │
//! │                                                                         │
//! │  RENTAL     line = rental_unit_price × quantity × max(1, day_count)    │
//! │             (requires a rental selection with end > start)             │
//! │                                                                         │
//! │  ORDER      sub_total    = Σ line                                      │
//! │             total_amount = sub_total + transport_fee (default 0)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All amounts are integers in the smallest currency unit. Negative inputs
//! and overflow are errors; nothing is clamped or wrapped.

use chrono::NaiveDate;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{CartLineItem, OrderCosts, TransactionType};
use crate::validation::validate_non_negative;

// =============================================================================
// Day Count
// =============================================================================

/// Number of rental days between `start` and `end`.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use storefront_core::pricing::day_count;
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let end = NaiveDate::from_ymd_opt(2024, 1, 4).unwrap();
/// assert_eq!(day_count(start, end).unwrap(), 3);
/// assert!(day_count(end, start).is_err());
/// assert!(day_count(start, start).is_err());
/// ```
pub fn day_count(start: NaiveDate, end: NaiveDate) -> CoreResult<u32> {
    if end <= start {
        return Err(CoreError::InvalidRentalSelection {
            reason: format!("end date {} must be after start date {}", end, start),
        });
    }

    let days = (end - start).num_days();
    u32::try_from(days).map_err(|_| CoreError::InvalidRentalSelection {
        reason: format!("rental period of {} days is too long", days),
    })
}

// =============================================================================
// Line Totals
// =============================================================================

/// Rejects lines whose numbers cannot produce a meaningful total.
pub(crate) fn check_line(item: &CartLineItem, transaction_type: TransactionType) -> CoreResult<()> {
    if item.quantity < 1 {
        return Err(CoreError::InvalidLineItem {
            item_id: item.id.clone(),
            reason: format!("quantity {} must be at least 1", item.quantity),
        });
    }

    let (label, price) = match transaction_type {
        TransactionType::Purchase => ("unit price", item.unit_price),
        TransactionType::Rental => ("rental unit price", item.rental_unit_price),
    };
    if price.is_negative() {
        return Err(CoreError::InvalidLineItem {
            item_id: item.id.clone(),
            reason: format!("{} {} must not be negative", label, price.amount()),
        });
    }

    Ok(())
}

fn overflow(item: &CartLineItem) -> CoreError {
    CoreError::InvalidLineItem {
        item_id: item.id.clone(),
        reason: "line total overflows".to_string(),
    }
}

/// Computes the total for one cart line.
///
/// ## Errors
/// - `InvalidLineItem` for quantity < 1, a negative price, or overflow
/// - `InvalidRentalSelection` for a rental line without valid dates
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use storefront_core::money::Money;
/// use storefront_core::pricing::line_total;
/// use storefront_core::types::{CartLineItem, RentalSelection, TransactionType};
///
/// let mut item = CartLineItem::new("l1", "dress-7", "Ao dai");
/// item.rental_unit_price = Money::new(50_000);
/// item.rental_selection = Some(RentalSelection::new(
///     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
/// ).unwrap());
///
/// assert_eq!(line_total(&item, TransactionType::Rental).unwrap(), Money::new(150_000));
/// ```
pub fn line_total(item: &CartLineItem, transaction_type: TransactionType) -> CoreResult<Money> {
    check_line(item, transaction_type)?;

    match transaction_type {
        TransactionType::Purchase => item
            .unit_price
            .checked_mul(item.quantity)
            .ok_or_else(|| overflow(item)),
        TransactionType::Rental => {
            let selection = item
                .rental_selection
                .filter(|s| s.is_valid())
                .ok_or_else(|| CoreError::InvalidRentalSelection {
                    reason: format!("item {} has no valid rental dates", item.id),
                })?;
            let days = i64::from(selection.day_count.max(1));

            item.rental_unit_price
                .checked_mul(item.quantity)
                .and_then(|m| m.checked_mul(days))
                .ok_or_else(|| overflow(item))
        }
    }
}

// =============================================================================
// Aggregate
// =============================================================================

/// Sums line totals and adds the transport fee.
///
/// ## User Workflow
/// ```text
/// Checkout screen: 1 item, 100000 × 2, home delivery (fee 15000)
///      │
///      ▼
/// aggregate(items, PURCHASE, Some(15000)) ← THIS FUNCTION
///      │
///      ▼
/// { subTotal: 200000, transportFee: 15000, totalAmount: 215000 }
/// ```
pub fn aggregate(
    items: &[CartLineItem],
    transaction_type: TransactionType,
    transport_fee: Option<Money>,
) -> CoreResult<OrderCosts> {
    let transport_fee = transport_fee.unwrap_or_default();
    validate_non_negative("transportFee", transport_fee)?;

    let mut sub_total = Money::zero();
    for item in items {
        let line = line_total(item, transaction_type)?;
        sub_total = sub_total.checked_add(line).ok_or_else(|| overflow(item))?;
    }

    let total_amount =
        sub_total
            .checked_add(transport_fee)
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "transportFee".to_string(),
                reason: "order total overflows".to_string(),
            })?;

    Ok(OrderCosts {
        sub_total,
        transport_fee,
        total_amount,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RentalSelection;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn purchase_item(id: &str, price: i64, quantity: i64) -> CartLineItem {
        let mut item = CartLineItem::new(id, format!("p-{}", id), "Item");
        item.unit_price = Money::new(price);
        item.quantity = quantity;
        item
    }

    fn rental_item(id: &str, price: i64, quantity: i64, days: u32) -> CartLineItem {
        let mut item = CartLineItem::new(id, format!("p-{}", id), "Item");
        item.rental_unit_price = Money::new(price);
        item.quantity = quantity;
        let start = date(2024, 3, 1);
        let end = start + chrono::Days::new(u64::from(days));
        item.rental_selection = Some(RentalSelection::new(start, end).unwrap());
        item
    }

    #[test]
    fn test_day_count() {
        assert_eq!(day_count(date(2024, 1, 1), date(2024, 1, 4)).unwrap(), 3);
        assert_eq!(day_count(date(2024, 1, 1), date(2024, 1, 2)).unwrap(), 1);
        // Leap year February
        assert_eq!(day_count(date(2024, 2, 28), date(2024, 3, 1)).unwrap(), 2);
    }

    #[test]
    fn test_day_count_rejects_non_increasing_range() {
        let err = day_count(date(2024, 1, 4), date(2024, 1, 4)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidRentalSelection { .. }));

        let err = day_count(date(2024, 1, 4), date(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidRentalSelection { .. }));
    }

    #[test]
    fn test_purchase_line_total_is_price_times_quantity() {
        for (price, qty) in [(0, 1), (1, 1), (99_000, 3), (100_000, 2), (250_000, 10)] {
            let item = purchase_item("a", price, qty);
            assert_eq!(
                line_total(&item, TransactionType::Purchase).unwrap(),
                Money::new(price * qty)
            );
        }
    }

    #[test]
    fn test_rental_line_total_is_price_times_quantity_times_days() {
        for (price, qty, days) in [(0, 1, 1), (50_000, 1, 3), (40_000, 2, 7), (1, 5, 30)] {
            let item = rental_item("a", price, qty, days);
            assert_eq!(
                line_total(&item, TransactionType::Rental).unwrap(),
                Money::new(price * qty * i64::from(days))
            );
        }
    }

    #[test]
    fn test_rental_line_total_treats_zero_day_count_as_one() {
        let mut item = rental_item("a", 50_000, 1, 3);
        if let Some(selection) = item.rental_selection.as_mut() {
            selection.day_count = 0;
        }
        assert_eq!(
            line_total(&item, TransactionType::Rental).unwrap(),
            Money::new(50_000)
        );
    }

    #[test]
    fn test_rental_line_total_requires_valid_selection() {
        let mut item = rental_item("a", 50_000, 1, 3);
        item.rental_selection = None;
        assert!(matches!(
            line_total(&item, TransactionType::Rental),
            Err(CoreError::InvalidRentalSelection { .. })
        ));

        // A stored selection whose dates were reversed
        item.rental_selection = Some(RentalSelection {
            start: date(2024, 1, 4),
            end: date(2024, 1, 1),
            day_count: 3,
        });
        assert!(matches!(
            line_total(&item, TransactionType::Rental),
            Err(CoreError::InvalidRentalSelection { .. })
        ));
    }

    #[test]
    fn test_purchase_ignores_rental_selection() {
        let mut item = rental_item("a", 50_000, 2, 3);
        item.unit_price = Money::new(300_000);
        assert_eq!(
            line_total(&item, TransactionType::Purchase).unwrap(),
            Money::new(600_000)
        );
    }

    #[test]
    fn test_negative_inputs_are_rejected() {
        let item = purchase_item("neg-price", -1, 1);
        assert!(matches!(
            line_total(&item, TransactionType::Purchase),
            Err(CoreError::InvalidLineItem { .. })
        ));

        let item = purchase_item("neg-qty", 1_000, -2);
        assert!(matches!(
            line_total(&item, TransactionType::Purchase),
            Err(CoreError::InvalidLineItem { .. })
        ));

        let item = purchase_item("zero-qty", 1_000, 0);
        assert!(matches!(
            aggregate(&[item], TransactionType::Purchase, None),
            Err(CoreError::InvalidLineItem { .. })
        ));
    }

    #[test]
    fn test_overflow_is_an_error() {
        let item = purchase_item("big", i64::MAX, 2);
        assert!(matches!(
            line_total(&item, TransactionType::Purchase),
            Err(CoreError::InvalidLineItem { .. })
        ));

        let items = [purchase_item("a", i64::MAX, 1), purchase_item("b", 1, 1)];
        assert!(aggregate(&items, TransactionType::Purchase, None).is_err());
    }

    #[test]
    fn test_aggregate_totals() {
        let items = [purchase_item("a", 100_000, 2)];
        let costs = aggregate(&items, TransactionType::Purchase, Some(Money::new(15_000))).unwrap();
        assert_eq!(costs.sub_total, Money::new(200_000));
        assert_eq!(costs.transport_fee, Money::new(15_000));
        assert_eq!(costs.total_amount, Money::new(215_000));
    }

    #[test]
    fn test_aggregate_defaults_transport_fee_to_zero() {
        let items = [rental_item("a", 50_000, 1, 3)];
        let costs = aggregate(&items, TransactionType::Rental, None).unwrap();
        assert_eq!(costs.transport_fee, Money::zero());
        assert_eq!(costs.total_amount, Money::new(150_000));
    }

    #[test]
    fn test_aggregate_empty_is_fee_only() {
        let costs = aggregate(&[], TransactionType::Purchase, Some(Money::new(10))).unwrap();
        assert_eq!(costs.sub_total, Money::zero());
        assert_eq!(costs.total_amount, Money::new(10));
    }

    #[test]
    fn test_aggregate_rejects_negative_transport_fee() {
        let items = [purchase_item("a", 1, 1)];
        assert!(matches!(
            aggregate(&items, TransactionType::Purchase, Some(Money::new(-5))),
            Err(CoreError::Validation(ValidationError::MustNotBeNegative { .. }))
        ));
    }

    #[test]
    fn test_aggregate_is_order_independent() {
        let items = vec![
            purchase_item("a", 120_000, 1),
            purchase_item("b", 35_000, 4),
            purchase_item("c", 9_900, 7),
        ];
        let expected = aggregate(&items, TransactionType::Purchase, None)
            .unwrap()
            .sub_total;

        let permutations = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
        for order in permutations {
            let permuted: Vec<CartLineItem> = order.iter().map(|&i| items[i].clone()).collect();
            let costs = aggregate(&permuted, TransactionType::Purchase, None).unwrap();
            assert_eq!(costs.sub_total, expected);
        }
    }
}
