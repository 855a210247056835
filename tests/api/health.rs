use crate::helpers::TestApp;

#[tokio::test]
async fn health_works() {
    let app = TestApp::spawn().await;
    let client = reqwest::Client::new();

    let response = client
        .get(app.base_url.join("/health").unwrap())
        .send()
        .await
        .expect("failed to execute request");

    assert!(response.status().is_success());
    assert_eq!(Some(0), response.content_length());
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let app = TestApp::spawn().await;
    let client = reqwest::Client::new();

    let generated = client
        .get(app.base_url.join("/health").unwrap())
        .send()
        .await
        .expect("failed to execute request");
    let echoed = client
        .get(app.base_url.join("/health").unwrap())
        .header("request-id", "caller-supplied")
        .send()
        .await
        .expect("failed to execute request");

    let generated = generated.headers()["request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(generated).is_ok());
    assert_eq!(echoed.headers()["request-id"], "caller-supplied");
}
