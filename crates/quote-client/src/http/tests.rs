//! Unit tests for HTTP plumbing.

use super::*;

#[test]
fn test_success_status_passes() {
    assert!(classify_status(StatusCode::OK, "{}").is_ok());
    assert!(classify_status(StatusCode::NO_CONTENT, "").is_ok());
}

#[test]
fn test_auth_statuses_are_unauthorized() {
    assert!(matches!(
        classify_status(StatusCode::UNAUTHORIZED, "bad key"),
        Err(Error::Unauthorized(_))
    ));
    assert!(matches!(
        classify_status(StatusCode::FORBIDDEN, ""),
        Err(Error::Unauthorized(_))
    ));
}

#[test]
fn test_other_statuses_are_network() {
    for status in [
        StatusCode::NOT_FOUND,
        StatusCode::TOO_MANY_REQUESTS,
        StatusCode::INTERNAL_SERVER_ERROR,
        StatusCode::BAD_GATEWAY,
    ] {
        assert!(matches!(classify_status(status, ""), Err(Error::Network(_))));
    }
}

#[test]
fn test_error_detail_truncates_long_bodies() {
    let body = "x".repeat(5_000);
    let Err(Error::Network(detail)) = classify_status(StatusCode::BAD_GATEWAY, &body) else {
        panic!("expected network error");
    };
    assert!(detail.starts_with("HTTP 502"));
    assert!(detail.len() < 300);
}

#[test]
fn test_endpoint_joins_and_encodes() {
    let url = endpoint(
        "https://api.example.com/",
        "/v1/markets/quotes",
        &[("symbols", "BRK.B"), ("greeks", "false")],
    )
    .unwrap();

    assert_eq!(
        url.as_str(),
        "https://api.example.com/v1/markets/quotes?symbols=BRK.B&greeks=false"
    );
}

#[test]
fn test_endpoint_without_query() {
    let url = endpoint("http://127.0.0.1:9000", "v2/aggs/ticker/AAPL/prev", &[]).unwrap();
    assert_eq!(url.query(), None);
    assert_eq!(url.path(), "/v2/aggs/ticker/AAPL/prev");
}

#[test]
fn test_endpoint_rejects_garbage_base() {
    assert!(matches!(endpoint("not a url", "x", &[]), Err(Error::Network(_))));
}

#[test]
fn test_auth_debug_hides_tokens() {
    let bearer = format!("{:?}", Auth::Bearer("secret-token".into()));
    let query = format!(
        "{:?}",
        Auth::Query {
            param: "apiKey",
            value: "secret-token".into()
        }
    );
    let headers = format!("{:?}", Auth::Headers(vec![("APCA-API-KEY-ID", "secret-token".into())]));

    for rendered in [bearer, query, headers] {
        assert!(!rendered.contains("secret-token"), "{}", rendered);
    }
}

#[test]
fn test_default_config_timeout() {
    assert_eq!(HttpConfig::default().timeout, Duration::from_secs(12));
}

#[tokio::test]
async fn test_transport_errors_omit_query_tokens() {
    let client = HttpClient::with_defaults().unwrap();
    let auth = Auth::Query {
        param: "apiKey",
        value: "SECRET123".to_string(),
    };
    let url = endpoint("http://127.0.0.1:1", "/v2/aggs/ticker/AAPL/prev", &[]).unwrap();

    let err = client.get_text(url.clone(), &auth).await.unwrap_err();
    assert!(matches!(err, Error::Network(_)));
    assert!(!err.to_string().contains("SECRET123"), "{}", err);

    let err = client.probe_token(url, &auth).await.unwrap_err();
    assert!(!err.to_string().contains("SECRET123"), "{}", err);
}
