use anyhow::Result;
use rust_decimal_macros::dec;
use secrecy::SecretString;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sheetfolio::brokers::oanda::OandaAdapter;
use sheetfolio::brokers::{BrokerAdapter, BrokerError};
use sheetfolio::config::{OandaConfig, OandaEnvironment};

fn adapter(server: &MockServer) -> OandaAdapter {
    let cfg = OandaConfig {
        api_key: SecretString::new("test-token".to_string()),
        account_id: "001-011-1234567-001".to_string(),
        environment: OandaEnvironment::Practice,
    };
    OandaAdapter::new(&cfg).unwrap().with_base_url(server.uri())
}

#[tokio::test]
async fn oanda_maps_nav_and_margin_available() -> Result<()> {
    let server = MockServer::start().await;

    let body = r#"{
        "account": {
            "NAV": "2500.00",
            "marginAvailable": "1200.00",
            "currency": "EUR",
            "id": "001-011-1234567-001"
        },
        "lastTransactionID": "6356"
    }"#;

    Mock::given(method("GET"))
        .and(path("/v3/accounts/001-011-1234567-001/summary"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .mount(&server)
        .await;

    let snap = adapter(&server).fetch_snapshot().await?;

    assert_eq!(snap.name, "OANDA");
    assert_eq!(snap.currency, "EUR");
    assert_eq!(snap.account_value, dec!(2500.00));
    assert_eq!(snap.available_funds, dec!(1200.00));

    Ok(())
}

#[tokio::test]
async fn oanda_defaults_currency_when_absent() -> Result<()> {
    let server = MockServer::start().await;

    let body = r#"{"account": {"NAV": "1", "marginAvailable": "1"}}"#;
    Mock::given(method("GET"))
        .and(path("/v3/accounts/001-011-1234567-001/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .mount(&server)
        .await;

    let snap = adapter(&server).fetch_snapshot().await?;
    assert_eq!(snap.currency, "USD");

    Ok(())
}

#[tokio::test]
async fn oanda_missing_account_is_unsupported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/accounts/001-011-1234567-001/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&server)
        .await;

    let err = adapter(&server).fetch_snapshot().await.unwrap_err();
    assert!(matches!(err, BrokerError::Unsupported { .. }));
}

#[tokio::test]
async fn oanda_auth_rejection_is_hard_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/accounts/001-011-1234567-001/summary"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let err = adapter(&server).fetch_snapshot().await.unwrap_err();
    assert!(matches!(err, BrokerError::Api { .. }));
}
