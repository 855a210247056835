use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, ResponseTemplate,
};

use crate::helpers::TestApp;

#[tokio::test]
async fn rate_is_the_product_of_both_upstream_rates() {
    let app = TestApp::spawn().await;
    app.mount_rates(0.000021, 38.5).await;

    let response = app.get_rate().await;

    assert_eq!(response.status(), StatusCode::OK);
    let rate: f64 = response.json().await.unwrap();
    assert!((rate - 0.0008085).abs() < 1e-12, "got {}", rate);
}

#[tokio::test]
async fn rate_queries_upstreams_with_their_api_keys() {
    let app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .and(path("/v1/live/"))
        .and(query_param("api_key", "abstract-key"))
        .and(query_param("base", "BTC"))
        .and(query_param("target", "EUR"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "exchange_rates": { "EUR": 2.0 } })),
        )
        .expect(1)
        .mount(&app.abstract_api)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/latest"))
        .and(query_param("access_key", "exchange-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "rates": { "UAH": 3.0 } })))
        .expect(1)
        .mount(&app.exchange_rates_api)
        .await;

    let response = app.get_rate().await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json::<f64>().await.unwrap(), 6.0);
}

#[tokio::test]
async fn missing_upstream_field_is_a_500_with_an_error_body() {
    let app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "exchange_rates": { "EUR": 2.0 } })),
        )
        .mount(&app.abstract_api)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "rates": { "USD": 1.1 } })))
        .mount(&app.exchange_rates_api)
        .await;

    let response = app.get_rate().await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "Error": "rate UAH not found in response from exchangeratesapi" })
    );
}

#[tokio::test]
async fn a_failing_upstream_does_not_wait_for_a_hung_one() {
    let app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&app.abstract_api)
        .await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "rates": { "UAH": 38.5 } }))
                .set_delay(Duration::from_secs(180)),
        )
        .mount(&app.exchange_rates_api)
        .await;

    let response = tokio::time::timeout(Duration::from_secs(5), app.get_rate())
        .await
        .expect("rate request hung");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["Error"]
        .as_str()
        .unwrap()
        .starts_with("failed to fetch rate from abstractapi"));
}

#[tokio::test]
async fn rate_rejects_other_methods_with_a_400() {
    let app = TestApp::spawn().await;

    let response = reqwest::Client::new()
        .post(app.base_url.join("/rate").unwrap())
        .send()
        .await
        .expect("failed to execute request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "Error": "This HTTP method is not allowed: POST" }));
}
