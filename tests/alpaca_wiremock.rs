use anyhow::Result;
use rust_decimal_macros::dec;
use secrecy::SecretString;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sheetfolio::brokers::alpaca::AlpacaAdapter;
use sheetfolio::brokers::{BrokerAdapter, BrokerError};
use sheetfolio::config::AlpacaConfig;

fn adapter(server: &MockServer) -> AlpacaAdapter {
    let cfg = AlpacaConfig {
        api_key: "test-key".to_string(),
        api_secret: SecretString::new("test-secret".to_string()),
        paper: true,
    };
    AlpacaAdapter::new(&cfg).unwrap().with_base_url(server.uri())
}

#[tokio::test]
async fn alpaca_maps_equity_and_buying_power() -> Result<()> {
    let server = MockServer::start().await;

    let body = r#"{
        "equity": "1000.50",
        "buying_power": "800",
        "currency": "USD",
        "status": "ACTIVE"
    }"#;

    Mock::given(method("GET"))
        .and(path("/v2/account"))
        .and(header("APCA-API-KEY-ID", "test-key"))
        .and(header("APCA-API-SECRET-KEY", "test-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .mount(&server)
        .await;

    let snap = adapter(&server).fetch_snapshot().await?;

    assert_eq!(snap.name, "Alpaca");
    assert_eq!(snap.currency, "USD");
    assert_eq!(snap.account_value, dec!(1000.50));
    assert_eq!(snap.available_funds, dec!(800));
    assert!(snap.supplemental.is_none());

    Ok(())
}

#[tokio::test]
async fn alpaca_defaults_currency_when_absent() -> Result<()> {
    let server = MockServer::start().await;

    let body = r#"{"equity": "10", "buying_power": "5"}"#;
    Mock::given(method("GET"))
        .and(path("/v2/account"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .mount(&server)
        .await;

    let snap = adapter(&server).fetch_snapshot().await?;
    assert_eq!(snap.currency, "USD");

    Ok(())
}

#[tokio::test]
async fn alpaca_missing_equity_is_unsupported() {
    let server = MockServer::start().await;

    // An account payload without the fields we require must fail fast,
    // not default to zero.
    let body = r#"{"currency": "USD"}"#;
    Mock::given(method("GET"))
        .and(path("/v2/account"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .mount(&server)
        .await;

    let err = adapter(&server).fetch_snapshot().await.unwrap_err();
    assert!(matches!(err, BrokerError::Unsupported { .. }));
    assert!(err.to_string().contains("equity"));
}

#[tokio::test]
async fn alpaca_auth_rejection_is_hard_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/account"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let err = adapter(&server).fetch_snapshot().await.unwrap_err();
    assert!(matches!(err, BrokerError::Api { .. }));
}
