//! Paper execution: decides whether a limit order would trade against a
//! chain snapshot, and at what price.

use crate::models::{
    Fill, OrderPlacement, OrderRequest, OrderSide, PlacedOrder, PlacementStatus,
};
use chrono::{DateTime, Utc};
use quote_client::{OptionChainSnapshot, OptionContract};
use rust_decimal::{Decimal, RoundingStrategy};


/// Rounds an execution price to the cent.
#[must_use]
pub fn round_to_cent(price: Decimal) -> Decimal {
    price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the rejection reason for a malformed request.
#[must_use]
pub fn validate(request: &OrderRequest) -> Option<String> {
    if request.symbol.trim().is_empty() {
        return Some("symbol is empty".to_string());
    }
    if request.quantity == 0 {
        return Some("quantity must be positive".to_string());
    }
    if request.limit <= Decimal::ZERO {
        return Some("limit price must be positive".to_string());
    }
    None
}

/// Execution price if a `side` order at `limit` crosses `contract`.
///
/// A buy crosses when the ask is at or below the limit; a sell when the bid
/// is at or above it. When the relevant side is not quoted the contract's
/// mid (or last) stands in for it.
#[must_use]
pub fn execution_price(side: OrderSide, limit: Decimal, contract: &OptionContract) -> Option<Decimal> {
    let price = match side {
        OrderSide::Buy => {
            let ask = contract.quoted_ask().or_else(|| contract.mid())?;
            (ask <= limit).then(|| ask.min(limit))?
        }
        OrderSide::Sell => {
            let bid = contract.quoted_bid().or_else(|| contract.mid())?;
            (bid >= limit).then(|| bid.max(limit))?
        }
    };
    Some(round_to_cent(price))
}

/// Evaluates `request` against `chain`.
///
/// Never fails: a missing contract or a non-crossing limit is an accepted,
/// unfilled order, and a malformed request is a rejected one.
#[must_use]
pub fn evaluate(
    id: String,
    request: &OrderRequest,
    chain: &OptionChainSnapshot,
    now: DateTime<Utc>,
) -> OrderPlacement {
    if let Some(reason) = validate(request) {
        return OrderPlacement {
            placed: PlacedOrder {
                id,
                status: PlacementStatus::Rejected,
                reason: Some(reason),
            },
            fill: None,
        };
    }

    let fill = chain
        .find(request.option.right.into(), request.option.strike)
        .and_then(|contract| execution_price(request.side, request.limit, contract))
        .map(|price| Fill {
            price,
            quantity: request.quantity,
            timestamp: now,
        });

    OrderPlacement {
        placed: PlacedOrder {
            id,
            status: PlacementStatus::Accepted,
            reason: None,
        },
        fill,
    }
}
