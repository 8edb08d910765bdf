//! Order placement and ledger management over the REST API.

use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use desk_tests::{
    DeskServer, FixtureServer, public_sources, yahoo_contract, yahoo_options, yahoo_quote,
};
use options_paper_desk::models::{
    OrderListResponse, OrderStatus, PlaceOrderResponse, PlacementStatus, RemovedResponse,
    SavedOrder,
};
use reqwest::StatusCode;
use rust_decimal_macros::dec;
use serde_json::{Value, json};

fn expiration() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 1, 18).unwrap()
}

async fn market() -> FixtureServer {
    FixtureServer::start(
        Router::new()
            .route("/v7/finance/quote", get(|| async { Json(yahoo_quote("AAPL", 190.12)) }))
            .route(
                "/v7/finance/options/{symbol}",
                get(|| async {
                    Json(yahoo_options(
                        "AAPL",
                        190.12,
                        &[expiration()],
                        expiration(),
                        vec![yahoo_contract(190.0, 2.40, 2.50)],
                        vec![yahoo_contract(185.0, 1.10, 1.20)],
                    ))
                }),
            ),
    )
    .await
}

fn order(right: &str, strike: &str, side: &str, quantity: u32, limit: &str) -> Value {
    json!({
        "symbol": "aapl",
        "option": {"expiration": "2030-01-18", "right": right, "strike": strike},
        "side": side,
        "quantity": quantity,
        "limit": limit,
        "time_in_force": "gtc"
    })
}

async fn place(client: &reqwest::Client, desk: &DeskServer, body: Value) -> PlaceOrderResponse {
    let resp = client
        .post(desk.url("/api/v1/orders"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.unwrap()
}

#[tokio::test]
async fn test_marketable_buy_fills_at_ask() {
    let market = market().await;
    let desk = DeskServer::start(public_sources(market.url(), &[])).await;
    let client = reqwest::Client::new();

    let placed = place(&client, &desk, order("call", "190", "buy", 2, "2.60")).await;

    assert_eq!(placed.placement.placed.status, PlacementStatus::Accepted);
    let fill = placed.placement.fill.expect("immediate fill");
    assert_eq!(fill.price, dec!(2.50));
    assert_eq!(fill.quantity, 2);
    assert_eq!(placed.order.status, OrderStatus::Filled);
    assert_eq!(placed.order.symbol, "AAPL");
    assert_eq!(placed.order.fill_price, Some(dec!(2.50)));
}

#[tokio::test]
async fn test_resting_sell_stays_working() {
    let market = market().await;
    let desk = DeskServer::start(public_sources(market.url(), &[])).await;
    let client = reqwest::Client::new();

    let placed = place(&client, &desk, order("put", "185", "sell", 1, "1.50")).await;

    assert!(placed.placement.fill.is_none());
    assert_eq!(placed.order.status, OrderStatus::Working);
    assert_eq!(desk.state.ledger.working().unwrap().len(), 1);
}

#[tokio::test]
async fn test_rejected_order_is_saved_as_failed_without_fetching() {
    let market = market().await;
    let desk = DeskServer::start(public_sources(market.url(), &[])).await;
    let client = reqwest::Client::new();

    let placed = place(&client, &desk, order("call", "190", "buy", 0, "2.60")).await;

    assert_eq!(placed.placement.placed.status, PlacementStatus::Rejected);
    assert_eq!(
        placed.placement.placed.reason.as_deref(),
        Some("quantity must be positive")
    );
    assert_eq!(placed.order.status, OrderStatus::Failed);
    assert!(market.hits().is_empty());
}

#[tokio::test]
async fn test_list_filter_get_delete_clear() {
    let market = market().await;
    let desk = DeskServer::start(public_sources(market.url(), &[])).await;
    let client = reqwest::Client::new();

    let filled = place(&client, &desk, order("call", "190", "buy", 1, "3.00")).await;
    let working = place(&client, &desk, order("call", "190", "buy", 1, "2.00")).await;
    place(&client, &desk, order("put", "185", "buy", 1, "1.00")).await;

    let all: OrderListResponse = client
        .get(desk.url("/api/v1/orders"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.count, 3);
    assert_eq!(all.orders[0].id, filled.order.id);

    let only_working: OrderListResponse = client
        .get(desk.url("/api/v1/orders?status=working"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(only_working.count, 2);

    let bad = client
        .get(desk.url("/api/v1/orders?status=open"))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    let body: Value = bad.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_REQUEST");

    let fetched: SavedOrder = client
        .get(desk.url(&format!("/api/v1/orders/{}", working.order.id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched, working.order);

    let removed: RemovedResponse = client
        .delete(desk.url(&format!("/api/v1/orders/{}", working.order.id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(removed.removed, 1);

    let gone = client
        .get(desk.url(&format!("/api/v1/orders/{}", working.order.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);

    let cleared: RemovedResponse = client
        .delete(desk.url("/api/v1/orders"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cleared.removed, 2);
    assert!(desk.state.ledger.load().unwrap().is_empty());
}

#[tokio::test]
async fn test_quote_and_chain_endpoints() {
    let market = market().await;
    let desk = DeskServer::start(public_sources(market.url(), &[])).await;
    let client = reqwest::Client::new();

    let quote: Value = client
        .get(desk.url("/api/v1/quotes/aapl"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(quote["symbol"], "AAPL");
    assert_eq!(quote["price"], "190.12");

    let invalid = client
        .get(desk.url("/api/v1/quotes/AA%20PL"))
        .send()
        .await
        .unwrap();
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    let body: Value = invalid.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_SYMBOL");

    let chain: Value = client
        .get(desk.url("/api/v1/chains/AAPL?expiration=2030-01-18"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(chain["expiration"], "2030-01-18");
    assert_eq!(chain["calls"].as_array().unwrap().len(), 1);
    assert_eq!(chain["puts"][0]["mid"], "1.15");
}

#[tokio::test]
async fn test_upstream_outage_is_bad_gateway() {
    let desk = DeskServer::start(public_sources(desk_tests::UNREACHABLE, &[])).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(desk.url("/api/v1/quotes/AAPL"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "UPSTREAM_UNAVAILABLE");
}

#[tokio::test]
async fn test_health_and_provider_status_without_provider() {
    let desk = DeskServer::start(public_sources(desk_tests::UNREACHABLE, &[])).await;
    let client = reqwest::Client::new();

    let health: Value = client
        .get(desk.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["provider"], Value::Null);
    assert_eq!(health["monitor"], "never");

    let provider: Value = client
        .get(desk.url("/api/v1/provider"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(provider["provider"], Value::Null);
    assert_eq!(provider["token_valid"], Value::Null);
}
