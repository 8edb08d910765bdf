//! Vendor clients against fixture endpoints: auth placement, decoding and
//! status classification.

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use desk_tests::{DeskServer, FixtureServer, UNREACHABLE, public_sources, test_http};
use quote_client::{
    AlpacaProvider, AlphaVantageProvider, Error, FinnhubProvider, OptionKind, PolygonProvider,
    QuoteProvider, TokenStatus, TradierProvider,
};
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;

fn bearer_ok(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "Bearer tradier-token")
}

async fn tradier_expirations(headers: HeaderMap) -> Response {
    if !bearer_ok(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({"expirations": {"date": ["2026-02-20", "2026-01-16"]}})).into_response()
}

async fn tradier_chain(headers: HeaderMap) -> Response {
    if !bearer_ok(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({
        "options": {
            "option": [
                {"symbol": "AAPL260116C00190000", "option_type": "call", "strike": 190.0, "bid": 2.4, "ask": 2.5, "last": 2.45},
                {"symbol": "AAPL260116P00185000", "option_type": "put", "strike": 185.0, "bid": 1.1, "ask": 1.2, "last": null}
            ]
        }
    }))
    .into_response()
}

async fn tradier_fixture() -> FixtureServer {
    FixtureServer::start(
        Router::new()
            .route(
                "/v1/markets/quotes",
                get(|headers: HeaderMap| async move {
                    if !bearer_ok(&headers) {
                        return StatusCode::UNAUTHORIZED.into_response();
                    }
                    Json(json!({"quotes": {"quote": {"symbol": "AAPL", "last": 190.3, "close": null, "prevclose": 189.0}}}))
                        .into_response()
                }),
            )
            .route("/v1/markets/options/expirations", get(tradier_expirations))
            .route("/v1/markets/options/chains", get(tradier_chain))
            .route(
                "/v1/user/profile",
                get(|headers: HeaderMap| async move {
                    if bearer_ok(&headers) {
                        StatusCode::OK
                    } else {
                        StatusCode::UNAUTHORIZED
                    }
                }),
            ),
    )
    .await
}

#[tokio::test]
async fn test_tradier_price_and_chain() {
    let fixture = tradier_fixture().await;
    let tradier = TradierProvider::new(test_http(), fixture.url(), "tradier-token".to_string());

    assert_eq!(tradier.fetch_price("AAPL").await.unwrap(), dec!(190.3));

    let chain = tradier.fetch_chain("AAPL", None).await.unwrap();
    let jan = NaiveDate::from_ymd_opt(2026, 1, 16).unwrap();
    assert_eq!(chain.expiration, Some(jan));
    assert_eq!(chain.first_expiration(), Some(jan));
    assert_eq!(chain.calls.len(), 1);
    assert_eq!(chain.find(OptionKind::Put, dec!(185)).unwrap().bid, Some(dec!(1.1)));
    assert!(fixture.hits().last().unwrap().contains("expiration=2026-01-16"));
}

#[tokio::test]
async fn test_tradier_bad_token() {
    let fixture = tradier_fixture().await;
    let tradier = TradierProvider::new(test_http(), fixture.url(), "wrong".to_string());

    assert!(matches!(tradier.fetch_price("AAPL").await, Err(Error::Unauthorized(_))));
    assert!(matches!(
        tradier.validate_token().await,
        Ok(TokenStatus::Invalid { .. })
    ));

    let good = TradierProvider::new(test_http(), fixture.url(), "tradier-token".to_string());
    assert_eq!(good.validate_token().await.unwrap(), TokenStatus::Valid);
}

#[tokio::test]
async fn test_alpaca_headers_and_occ_chain() {
    let fixture = FixtureServer::start(Router::new().route(
        "/v1beta1/options/snapshots/{symbol}",
        get(|headers: HeaderMap| async move {
            let key = headers.get("APCA-API-KEY-ID").and_then(|v| v.to_str().ok());
            let secret = headers.get("APCA-API-SECRET-KEY").and_then(|v| v.to_str().ok());
            if key != Some("key-id") || secret != Some("key-secret") {
                return StatusCode::FORBIDDEN.into_response();
            }
            Json(json!({
                "snapshots": {
                    "AAPL260116C00190000": {"latestQuote": {"bp": 2.4, "ap": 2.5}},
                    "AAPL260116P00185000": {"latestQuote": {"bp": 1.1, "ap": 1.2}, "latestTrade": {"p": 1.15}},
                    "GARBAGE": {"latestQuote": {"bp": 9.0, "ap": 9.5}},
                    "MSFT260116C00400000": {"latestQuote": {"bp": 5.0, "ap": 5.5}}
                }
            }))
            .into_response()
        }),
    ))
    .await;

    let alpaca = AlpacaProvider::new(test_http(), fixture.url(), "key-id:key-secret").unwrap();
    let chain = alpaca.fetch_chain("AAPL", None).await.unwrap();

    assert_eq!(chain.calls.len(), 1);
    assert_eq!(chain.puts.len(), 1);
    assert_eq!(chain.find(OptionKind::Call, dec!(190)).unwrap().ask, Some(dec!(2.5)));
    assert!(fixture.hits()[0].contains("feed=indicative"));

    let wrong = AlpacaProvider::new(test_http(), fixture.url(), "key-id:nope").unwrap();
    assert!(matches!(
        wrong.fetch_chain("AAPL", None).await,
        Err(Error::Unauthorized(_))
    ));
}

#[tokio::test]
async fn test_alpha_vantage_body_rejections() {
    let fixture = FixtureServer::start(Router::new().route(
        "/query",
        get(|axum::extract::RawQuery(query): axum::extract::RawQuery| async move {
            let query = query.unwrap_or_default();
            let body = if query.contains("apikey=good") && query.contains("symbol=AAPL") {
                json!({"Global Quote": {"01. symbol": "AAPL", "05. price": "190.1200", "08. previous close": "188.0000"}})
            } else if query.contains("apikey=good") {
                json!({"Note": "Thank you for using Alpha Vantage! Our standard call frequency is 5 calls per minute."})
            } else {
                json!({"Information": "the parameter apikey is invalid or missing."})
            };
            Json(body)
        }),
    ))
    .await;

    let good = AlphaVantageProvider::new(test_http(), fixture.url(), "good".to_string());
    assert_eq!(good.fetch_price("AAPL").await.unwrap(), dec!(190.12));
    assert!(matches!(good.fetch_price("MSFT").await, Err(Error::Network(_))));
    assert!(matches!(
        good.fetch_chain("AAPL", None).await,
        Err(Error::Unsupported(_))
    ));

    let bad = AlphaVantageProvider::new(test_http(), fixture.url(), "bad".to_string());
    assert!(matches!(bad.fetch_price("AAPL").await, Err(Error::Unauthorized(_))));
    assert!(matches!(
        bad.validate_token().await,
        Ok(TokenStatus::Invalid { .. })
    ));
}

#[tokio::test]
async fn test_finnhub_price_and_server_error() {
    let fixture = FixtureServer::start(
        Router::new().route(
            "/api/v1/quote",
            get(|axum::extract::RawQuery(query): axum::extract::RawQuery| async move {
                if query.unwrap_or_default().contains("symbol=AAPL") {
                    Json(json!({"c": 0, "pc": 189.5})).into_response()
                } else {
                    StatusCode::SERVICE_UNAVAILABLE.into_response()
                }
            }),
        ),
    )
    .await;

    let finnhub = FinnhubProvider::new(test_http(), fixture.url(), "token".to_string());
    assert_eq!(finnhub.fetch_price("AAPL").await.unwrap(), dec!(189.5));
    assert!(matches!(finnhub.fetch_price("MSFT").await, Err(Error::Network(_))));
    assert!(fixture.hits()[0].contains("token=token"));
}

#[tokio::test]
async fn test_unreachable_vendor_errors_hide_query_keys() {
    let polygon = PolygonProvider::new(test_http(), UNREACHABLE, "SECRET123".to_string());
    let finnhub = FinnhubProvider::new(test_http(), UNREACHABLE, "SECRET456".to_string());

    let err = polygon.fetch_price("AAPL").await.unwrap_err();
    assert!(!err.to_string().contains("SECRET123"), "{}", err);
    let err = polygon.validate_token().await.unwrap_err();
    assert!(!err.to_string().contains("SECRET123"), "{}", err);
    let err = finnhub.fetch_price("AAPL").await.unwrap_err();
    assert!(!err.to_string().contains("SECRET456"), "{}", err);

    let desk = DeskServer::start_with(
        public_sources(UNREACHABLE, &[]),
        Some(Arc::new(PolygonProvider::new(
            test_http(),
            UNREACHABLE,
            "SECRET123".to_string(),
        ))),
    )
    .await;
    let status: serde_json::Value = reqwest::get(desk.url("/api/v1/provider"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["provider"], "polygon");
    assert!(!status.to_string().contains("SECRET123"));
}
