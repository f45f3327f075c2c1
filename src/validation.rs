//! Input-shape checks applied before an order reaches the matching core.

use crate::error::OrderRejection;
use crate::types::{Address, IncomingOrder};
use rust_decimal::Decimal;

/// Largest accepted order quantity. Keeps collateral (`price × quantity`) and its sums
/// well inside `Decimal` range.
pub const MAX_ORDER_QUANTITY: u64 = 1_000_000_000_000;

/// `0x` followed by exactly 40 hex digits (either case).
pub fn is_valid_address(address: &Address) -> bool {
    match address.as_str().strip_prefix("0x") {
        Some(hex) => hex.len() == 40 && hex.bytes().all(|b| b.is_ascii_hexdigit()),
        None => false,
    }
}

/// Owner, price and quantity checks. Market existence and status are checked by the
/// [`crate::engine::Exchange`], which owns that state.
pub fn validate_order(order: &IncomingOrder) -> Result<(), OrderRejection> {
    if !is_valid_address(&order.owner) {
        return Err(OrderRejection::InvalidAddress(order.owner.clone()));
    }
    if order.price <= Decimal::ZERO || order.price >= Decimal::ONE {
        return Err(OrderRejection::PriceOutOfRange(order.price));
    }
    if order.quantity == 0 {
        return Err(OrderRejection::ZeroQuantity);
    }
    if order.quantity > MAX_ORDER_QUANTITY {
        return Err(OrderRejection::QuantityTooLarge {
            quantity: order.quantity,
            max: MAX_ORDER_QUANTITY,
        });
    }
    Ok(())
}
