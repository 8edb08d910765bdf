//! Unit tests for quote types.

use super::*;
use rust_decimal_macros::dec;

// ============================================================================
// Strike Matching Tests
// ============================================================================

#[test]
fn test_strikes_within_tolerance_match() {
    assert!(strikes_match(dec!(100.0), dec!(100.00009)));
    assert!(strikes_match(dec!(100.00009), dec!(100.0)));
}

#[test]
fn test_strikes_outside_tolerance_differ() {
    assert!(!strikes_match(dec!(100.0), dec!(100.01)));
    assert!(!strikes_match(dec!(100.0), dec!(100.0001)));
}

#[test]
fn test_contract_matches_requires_same_kind() {
    let call = OptionContract::new(OptionKind::Call, dec!(150));

    assert!(call.matches(OptionKind::Call, dec!(150.000)));
    assert!(!call.matches(OptionKind::Put, dec!(150)));
}

// ============================================================================
// Mid Price Tests
// ============================================================================

#[test]
fn test_mid_averages_two_sided_quote() {
    let c = OptionContract::new(OptionKind::Call, dec!(100)).with_quote(Some(dec!(2.40)), Some(dec!(2.60)));
    assert_eq!(c.mid(), Some(dec!(2.50)));
}

#[test]
fn test_mid_uses_single_side() {
    let bid_only = OptionContract::new(OptionKind::Put, dec!(100)).with_quote(Some(dec!(1.10)), None);
    let ask_only = OptionContract::new(OptionKind::Put, dec!(100)).with_quote(None, Some(dec!(1.30)));

    assert_eq!(bid_only.mid(), Some(dec!(1.10)));
    assert_eq!(ask_only.mid(), Some(dec!(1.30)));
}

#[test]
fn test_mid_ignores_zero_quotes_and_falls_back_to_last() {
    let c = OptionContract::new(OptionKind::Call, dec!(100))
        .with_quote(Some(dec!(0)), Some(dec!(0)))
        .with_last(Some(dec!(0.85)));

    assert_eq!(c.quoted_bid(), None);
    assert_eq!(c.quoted_ask(), None);
    assert_eq!(c.mid(), Some(dec!(0.85)));
}

#[test]
fn test_mid_absent_when_nothing_quoted() {
    let c = OptionContract::new(OptionKind::Call, dec!(100));
    assert_eq!(c.mid(), None);
}

// ============================================================================
// Chain Snapshot Tests
// ============================================================================

#[test]
fn test_chain_push_and_find() {
    let mut chain = OptionChainSnapshot::empty("AAPL");
    chain.push(OptionContract::new(OptionKind::Call, dec!(100.00009)));
    chain.push(OptionContract::new(OptionKind::Put, dec!(95)));

    assert!(chain.has_contracts());
    assert!(chain.find(OptionKind::Call, dec!(100)).is_some());
    assert!(chain.find(OptionKind::Put, dec!(100)).is_none());
    assert!(chain.find(OptionKind::Call, dec!(100.01)).is_none());
}

#[test]
fn test_empty_chain_has_no_contracts() {
    let mut chain = OptionChainSnapshot::empty("AAPL");
    chain
        .expirations
        .insert(NaiveDate::from_ymd_opt(2026, 1, 16).unwrap());

    assert!(!chain.has_contracts());
}

#[test]
fn test_first_expiration_is_earliest() {
    let mut chain = OptionChainSnapshot::empty("SPY");
    chain.expirations.insert(NaiveDate::from_ymd_opt(2026, 3, 20).unwrap());
    chain.expirations.insert(NaiveDate::from_ymd_opt(2026, 1, 16).unwrap());

    assert_eq!(
        chain.first_expiration(),
        NaiveDate::from_ymd_opt(2026, 1, 16)
    );
}

// ============================================================================
// Symbol Normalization Tests
// ============================================================================

#[test]
fn test_normalize_symbol_trims_and_uppercases() {
    assert_eq!(normalize_symbol("  aapl ").unwrap(), "AAPL");
    assert_eq!(normalize_symbol("brk.b").unwrap(), "BRK.B");
    assert_eq!(normalize_symbol("^spx").unwrap(), "^SPX");
}

#[test]
fn test_normalize_symbol_rejects_bad_input() {
    assert!(matches!(normalize_symbol("   "), Err(Error::InvalidSymbol(_))));
    assert!(matches!(normalize_symbol("AA PL"), Err(Error::InvalidSymbol(_))));
    assert!(matches!(normalize_symbol("AAPL/"), Err(Error::InvalidSymbol(_))));
}

#[test]
fn test_option_kind_from_str() {
    assert_eq!("C".parse::<OptionKind>().unwrap(), OptionKind::Call);
    assert_eq!("put".parse::<OptionKind>().unwrap(), OptionKind::Put);
    assert!("straddle".parse::<OptionKind>().is_err());
}

#[test]
fn test_token_status_serialization() {
    let json = serde_json::to_string(&TokenStatus::Invalid {
        reason: "expired".to_string(),
    })
    .unwrap();

    assert!(json.contains("\"status\":\"invalid\""));
    assert!(json.contains("\"reason\":\"expired\""));
}
