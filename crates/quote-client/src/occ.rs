//! OCC option symbol codec.
//!
//! Format: root (1-6 chars) + `YYMMDD` + `C`/`P` + strike × 1000 as eight
//! digits, e.g. `AAPL240119C00190000`. Polygon prefixes tickers with `O:`.

use crate::error::Error;
use crate::types::OptionKind;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// A decoded OCC option symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccSymbol {
    /// Underlying root, e.g. `AAPL`.
    pub root: String,
    /// Expiration date.
    pub expiration: NaiveDate,
    /// Call or put.
    pub kind: OptionKind,
    /// Strike price.
    pub strike: Decimal,
}

impl OccSymbol {
    /// Decodes an OCC symbol.
    ///
    /// # Errors
    /// Returns `Parse` for anything that is not a well-formed OCC symbol.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let raw = raw.trim();
        let symbol = raw.strip_prefix("O:").unwrap_or(raw);
        let malformed = || Error::Parse(format!("malformed OCC symbol: {}", raw));

        // root + 6 date + 1 kind + 8 strike
        if !symbol.is_ascii() || symbol.len() < 16 {
            return Err(malformed());
        }
        let (head, strike_digits) = symbol.split_at(symbol.len() - 8);
        let (head, kind_char) = head.split_at(head.len() - 1);
        let (root, date_digits) = head.split_at(head.len() - 6);

        let root = root.trim();
        if root.is_empty() || root.len() > 6 {
            return Err(malformed());
        }
        if !strike_digits.bytes().all(|b| b.is_ascii_digit())
            || !date_digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(malformed());
        }

        let kind = match kind_char {
            "C" => OptionKind::Call,
            "P" => OptionKind::Put,
            _ => return Err(malformed()),
        };
        let expiration =
            NaiveDate::parse_from_str(&format!("20{}", date_digits), "%Y%m%d").map_err(|_| malformed())?;
        let thousandths: i64 = strike_digits.parse().map_err(|_| malformed())?;

        Ok(Self {
            root: root.to_string(),
            expiration,
            kind,
            strike: Decimal::new(thousandths, 3).normalize(),
        })
    }
}

impl std::fmt::Display for OccSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            OptionKind::Call => 'C',
            OptionKind::Put => 'P',
        };
        let thousandths = (self.strike * Decimal::ONE_THOUSAND).trunc().mantissa();
        write!(
            f,
            "{}{}{}{:08}",
            self.root,
            self.expiration.format("%y%m%d"),
            kind,
            thousandths
        )
    }
}
