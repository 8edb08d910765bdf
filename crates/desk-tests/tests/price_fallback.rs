//! Delayed price fallback across the provider and public sources.

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use desk_tests::{
    FixtureServer, UNREACHABLE, csv_quote, public_sources, test_http, yahoo_chart, yahoo_quote,
};
use quote_client::{Error, PolygonProvider, QuoteService};
use rust_decimal_macros::dec;
use std::sync::Arc;

fn failing(status: StatusCode) -> (StatusCode, &'static str) {
    (status, "upstream failure")
}

#[tokio::test]
async fn test_public_quote_wins_first() {
    let yahoo = FixtureServer::start(
        Router::new()
            .route("/v7/finance/quote", get(|| async { Json(yahoo_quote("AAPL", 190.12)) }))
            .route("/v8/finance/chart/{symbol}", get(|| async { Json(yahoo_chart(1.0)) })),
    )
    .await;
    let quotes = QuoteService::new(test_http(), &public_sources(yahoo.url(), &[]), None);

    let price = tokio_test::assert_ok!(quotes.fetch_delayed_price(" aapl ").await);
    assert_eq!(price, dec!(190.12));
    assert_eq!(yahoo.paths(), vec!["/v7/finance/quote"]);
    assert!(yahoo.hits()[0].contains("symbols=AAPL"));
}

#[tokio::test]
async fn test_chart_used_when_quote_fails() {
    let yahoo = FixtureServer::start(
        Router::new()
            .route(
                "/v7/finance/quote",
                get(|| async { failing(StatusCode::INTERNAL_SERVER_ERROR) }),
            )
            .route("/v8/finance/chart/{symbol}", get(|| async { Json(yahoo_chart(187.25)) })),
    )
    .await;
    let quotes = QuoteService::new(test_http(), &public_sources(yahoo.url(), &[]), None);

    let price = quotes.fetch_delayed_price("AAPL").await.unwrap();
    assert_eq!(price, dec!(187.25));
    assert_eq!(
        yahoo.paths(),
        vec!["/v7/finance/quote", "/v8/finance/chart/AAPL"]
    );
}

#[tokio::test]
async fn test_csv_mirrors_tried_in_order() {
    let yahoo = FixtureServer::start(
        Router::new()
            .route("/v7/finance/quote", get(|| async { failing(StatusCode::BAD_GATEWAY) }))
            .route(
                "/v8/finance/chart/{symbol}",
                get(|| async { failing(StatusCode::NOT_FOUND) }),
            ),
    )
    .await;
    let first_mirror = FixtureServer::start(
        Router::new().route("/q/l/", get(|| async { csv_quote("aapl.us", "N/D") })),
    )
    .await;
    let second_mirror = FixtureServer::start(
        Router::new().route("/q/l/", get(|| async { csv_quote("aapl.us", "186.40") })),
    )
    .await;

    let public = public_sources(yahoo.url(), &[first_mirror.url(), second_mirror.url()]);
    let quotes = QuoteService::new(test_http(), &public, None);

    let price = quotes.fetch_delayed_price("AAPL").await.unwrap();
    assert_eq!(price, dec!(186.40));
    assert_eq!(yahoo.hits().len(), 2);
    assert_eq!(first_mirror.hits().len(), 1);
    assert!(second_mirror.hits()[0].contains("s=aapl.us"));
}

#[tokio::test]
async fn test_last_error_surfaces_when_everything_fails() {
    let mirror = FixtureServer::start(
        Router::new().route("/q/l/", get(|| async { csv_quote("zzzz.us", "N/D") })),
    )
    .await;
    let quotes = QuoteService::new(test_http(), &public_sources(UNREACHABLE, &[mirror.url()]), None);

    let err = quotes.fetch_delayed_price("ZZZZ").await.unwrap_err();
    assert!(matches!(err, Error::NoData(_)), "unexpected error: {err:?}");
}

#[tokio::test]
async fn test_invalid_symbol_never_reaches_a_source() {
    let yahoo = FixtureServer::start(
        Router::new().route("/v7/finance/quote", get(|| async { Json(yahoo_quote("AAPL", 1.0)) })),
    )
    .await;
    let quotes = QuoteService::new(test_http(), &public_sources(yahoo.url(), &[]), None);

    let err = quotes.fetch_delayed_price("AA PL;").await.unwrap_err();
    assert!(matches!(err, Error::InvalidSymbol(_)));
    assert!(yahoo.hits().is_empty());
}

#[tokio::test]
async fn test_provider_answers_before_public_sources() {
    let polygon = FixtureServer::start(Router::new().route(
        "/v2/aggs/ticker/{symbol}/prev",
        get(|| async { Json(serde_json::json!({"results": [{"c": 191.5}]})) }),
    ))
    .await;
    let yahoo = FixtureServer::start(
        Router::new().route("/v7/finance/quote", get(|| async { Json(yahoo_quote("AAPL", 1.0)) })),
    )
    .await;

    let provider = PolygonProvider::new(test_http(), polygon.url(), "secret-key".to_string());
    let quotes = QuoteService::new(
        test_http(),
        &public_sources(yahoo.url(), &[]),
        Some(Arc::new(provider)),
    );

    assert_eq!(quotes.fetch_delayed_price("AAPL").await.unwrap(), dec!(191.5));
    assert!(polygon.hits()[0].contains("apiKey=secret-key"));
    assert!(yahoo.hits().is_empty());
}

#[tokio::test]
async fn test_rejected_provider_falls_back_to_public() {
    let polygon = FixtureServer::start(Router::new().route(
        "/v2/aggs/ticker/{symbol}/prev",
        get(|| async { failing(StatusCode::UNAUTHORIZED) }),
    ))
    .await;
    let yahoo = FixtureServer::start(
        Router::new().route("/v7/finance/quote", get(|| async { Json(yahoo_quote("AAPL", 190.0)) })),
    )
    .await;

    let provider = PolygonProvider::new(test_http(), polygon.url(), "expired".to_string());
    let quotes = QuoteService::new(
        test_http(),
        &public_sources(yahoo.url(), &[]),
        Some(Arc::new(provider)),
    );

    assert_eq!(quotes.fetch_delayed_price("AAPL").await.unwrap(), dec!(190));
    assert_eq!(polygon.hits().len(), 1);
    assert_eq!(yahoo.hits().len(), 1);
}

#[tokio::test]
#[ignore = "hits the public internet"]
async fn test_live_aapl_price_from_public_sources() {
    let http = quote_client::HttpClient::with_defaults().unwrap();
    let quotes = QuoteService::new(http, &quote_client::PublicSourcesConfig::default(), None);

    let price = quotes.fetch_delayed_price("AAPL").await.unwrap();
    assert!(price > rust_decimal::Decimal::ZERO);
}
