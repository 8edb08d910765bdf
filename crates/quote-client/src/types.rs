//! Quote and option-chain snapshot types.

use crate::error::Error;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[cfg(test)]
mod tests;

/// Strikes closer than this are the same contract. Vendors encode strikes
/// differently (plain decimals, thousandths fixed-point, floats), so exact
/// equality is not usable.
pub const STRIKE_TOLERANCE: Decimal = dec!(0.0001);

/// Call or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    /// Call option.
    Call,
    /// Put option.
    Put,
}

impl std::fmt::Display for OptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "call"),
            Self::Put => write!(f, "put"),
        }
    }
}

impl std::str::FromStr for OptionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "call" | "c" => Ok(Self::Call),
            "put" | "p" => Ok(Self::Put),
            other => Err(Error::Parse(format!("unknown option kind: {}", other))),
        }
    }
}

/// Returns true when two strikes identify the same contract.
#[must_use]
pub fn strikes_match(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() < STRIKE_TOLERANCE
}

/// Drops zero or negative quotes; vendors use them to mean "no market".
fn positive(value: Option<Decimal>) -> Option<Decimal> {
    value.filter(|v| *v > Decimal::ZERO)
}

/// A single listed option with its latest quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    /// Call or put.
    pub kind: OptionKind,
    /// Strike price.
    pub strike: Decimal,
    /// Best bid, if quoted.
    #[serde(default)]
    pub bid: Option<Decimal>,
    /// Best ask, if quoted.
    #[serde(default)]
    pub ask: Option<Decimal>,
    /// Last trade price, if any.
    #[serde(default)]
    pub last: Option<Decimal>,
    /// Vendor contract symbol, when the vendor provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_symbol: Option<String>,
}

impl OptionContract {
    /// Creates an unquoted contract.
    #[must_use]
    pub fn new(kind: OptionKind, strike: Decimal) -> Self {
        Self {
            kind,
            strike,
            bid: None,
            ask: None,
            last: None,
            contract_symbol: None,
        }
    }

    /// Sets the bid/ask pair.
    #[must_use]
    pub fn with_quote(mut self, bid: Option<Decimal>, ask: Option<Decimal>) -> Self {
        self.bid = bid;
        self.ask = ask;
        self
    }

    /// Sets the last trade price.
    #[must_use]
    pub fn with_last(mut self, last: Option<Decimal>) -> Self {
        self.last = last;
        self
    }

    /// Bid if it is a real (positive) quote.
    #[must_use]
    pub fn quoted_bid(&self) -> Option<Decimal> {
        positive(self.bid)
    }

    /// Ask if it is a real (positive) quote.
    #[must_use]
    pub fn quoted_ask(&self) -> Option<Decimal> {
        positive(self.ask)
    }

    /// Mid price: average of bid/ask when both are quoted, otherwise the
    /// quoted side, otherwise the last trade.
    #[must_use]
    pub fn mid(&self) -> Option<Decimal> {
        match (self.quoted_bid(), self.quoted_ask()) {
            (Some(bid), Some(ask)) => Some((bid + ask) / dec!(2)),
            (Some(bid), None) => Some(bid),
            (None, Some(ask)) => Some(ask),
            (None, None) => positive(self.last),
        }
    }

    /// True when this contract is `(kind, strike)` within tolerance.
    #[must_use]
    pub fn matches(&self, kind: OptionKind, strike: Decimal) -> bool {
        self.kind == kind && strikes_match(self.strike, strike)
    }
}

/// Option chain for one underlying, optionally scoped to one expiration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionChainSnapshot {
    /// Underlying symbol.
    pub symbol: String,
    /// Underlying price reported alongside the chain, if any.
    #[serde(default)]
    pub underlying_price: Option<Decimal>,
    /// All listed expirations, ascending.
    pub expirations: BTreeSet<NaiveDate>,
    /// Expiration the contracts belong to, when the chain is scoped.
    #[serde(default)]
    pub expiration: Option<NaiveDate>,
    /// Call contracts.
    pub calls: Vec<OptionContract>,
    /// Put contracts.
    pub puts: Vec<OptionContract>,
}

impl OptionChainSnapshot {
    /// Creates an empty chain for a symbol.
    #[must_use]
    pub fn empty(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            underlying_price: None,
            expirations: BTreeSet::new(),
            expiration: None,
            calls: Vec::new(),
            puts: Vec::new(),
        }
    }

    /// True when at least one contract exists on either side, priced or not.
    #[must_use]
    pub fn has_contracts(&self) -> bool {
        !self.calls.is_empty() || !self.puts.is_empty()
    }

    /// Earliest listed expiration.
    #[must_use]
    pub fn first_expiration(&self) -> Option<NaiveDate> {
        self.expirations.iter().next().copied()
    }

    /// Contracts on one side of the chain.
    #[must_use]
    pub fn side(&self, kind: OptionKind) -> &[OptionContract] {
        match kind {
            OptionKind::Call => &self.calls,
            OptionKind::Put => &self.puts,
        }
    }

    /// Adds a contract to the side its kind belongs to.
    pub fn push(&mut self, contract: OptionContract) {
        match contract.kind {
            OptionKind::Call => self.calls.push(contract),
            OptionKind::Put => self.puts.push(contract),
        }
    }

    /// Finds the contract matching `(kind, strike)` within tolerance.
    #[must_use]
    pub fn find(&self, kind: OptionKind, strike: Decimal) -> Option<&OptionContract> {
        self.side(kind).iter().find(|c| c.matches(kind, strike))
    }

    /// Sorts both sides by strike.
    pub fn sort_by_strike(&mut self) {
        self.calls.sort_by(|a, b| a.strike.cmp(&b.strike));
        self.puts.sort_by(|a, b| a.strike.cmp(&b.strike));
    }
}

/// Outcome of a credential check against a vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TokenStatus {
    /// The vendor accepted the credentials.
    Valid,
    /// The vendor rejected the credentials.
    Invalid {
        /// Vendor-supplied or synthesized reason.
        reason: String,
    },
}

/// Normalizes a user-entered ticker: trims, upper-cases and rejects empty
/// input or characters no vendor accepts.
///
/// # Errors
/// Returns [`Error::InvalidSymbol`] for empty or malformed input.
pub fn normalize_symbol(raw: &str) -> Result<String, Error> {
    let symbol = raw.trim().to_ascii_uppercase();
    if symbol.is_empty() {
        return Err(Error::InvalidSymbol("symbol is empty".to_string()));
    }
    let valid = symbol
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));
    if !valid {
        return Err(Error::InvalidSymbol(symbol));
    }
    Ok(symbol)
}
