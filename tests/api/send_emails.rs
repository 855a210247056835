use axum::http::StatusCode;
use serde_json::json;
use wiremock::{
    matchers::{any, method, path},
    Mock, ResponseTemplate,
};

use crate::helpers::{sent_message, SentTo, TestApp, SEND_PATH};

async fn subscribe_all(app: &TestApp, emails: &[&str]) {
    for email in emails {
        let response = app
            .post_subscribe(format!("email={}", email.replace('@', "%40")))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn every_subscriber_is_sent_the_rate() {
    let app = TestApp::spawn().await;
    app.mount_rates(2.0, 3.5).await;
    subscribe_all(&app, &["a@example.com", "b@example.com"]).await;

    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&app.email_server)
        .await;

    let response = app.post_send_emails().await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!("Emails sent successfully"));

    let requests = app.email_server.received_requests().await.unwrap();
    let message = sent_message(&requests[0]);
    assert!(message.starts_with("To: a@example.com\r\n"));
    assert!(message.contains("Subject: Bitcoin to UAH exchange rate update\n"));
    assert!(message.ends_with("\n\nBitcoin now costs 7 UAH"));
}

#[tokio::test]
async fn no_subscribers_sends_nothing() {
    let app = TestApp::spawn().await;
    app.mount_rates(0.000021, 38.5).await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    let response = app.post_send_emails().await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn a_failed_recipient_is_reported_and_the_rest_are_still_sent() {
    let app = TestApp::spawn().await;
    app.mount_rates(0.000021, 38.5).await;
    subscribe_all(&app, &["a@example.com", "b@example.com", "c@example.com"]).await;

    Mock::given(SentTo("b@example.com"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.email_server)
        .await;
    Mock::given(SentTo("a@example.com"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;
    Mock::given(SentTo("c@example.com"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let response = app.post_send_emails().await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["Error"], "failed to deliver 1 of 3 notifications");

    let deliveries = body["batch"]["deliveries"].as_array().unwrap();
    let statuses: Vec<(&str, &str)> = deliveries
        .iter()
        .map(|delivery| {
            (
                delivery["recipient"].as_str().unwrap(),
                delivery["outcome"]["status"].as_str().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        statuses,
        [
            ("a@example.com", "delivered"),
            ("b@example.com", "failed"),
            ("c@example.com", "delivered"),
        ]
    );
    assert!(deliveries[1]["outcome"]["reason"]
        .as_str()
        .unwrap()
        .starts_with("the email API rejected the message"));
}

#[tokio::test]
async fn no_emails_are_sent_when_the_rate_is_unavailable() {
    let app = TestApp::spawn().await;
    subscribe_all(&app, &["a@example.com"]).await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.abstract_api)
        .await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.exchange_rates_api)
        .await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    let response = app.post_send_emails().await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["Error"]
        .as_str()
        .unwrap()
        .starts_with("failed to fetch rate from"));
    assert!(body.get("batch").is_none());
}

#[tokio::test]
async fn send_emails_rejects_other_methods_with_a_400() {
    let app = TestApp::spawn().await;

    let response = reqwest::get(app.base_url.join("/sendEmails").unwrap())
        .await
        .expect("failed to execute request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
