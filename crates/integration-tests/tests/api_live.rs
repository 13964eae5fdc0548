//! End-to-end HTTP tests against a running server.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database and a redis instance
//! - The API running (`cargo run -p petal-api`)
//! - `PETAL_API_BASE_URL` if the server is not on localhost:3000
//!
//! They are `#[ignore]`d so the default test run stays hermetic:
//!
//! ```bash
//! cargo test -p petal-integration-tests -- --ignored
//! ```

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use petal_integration_tests::api_base_url;

/// Register a throwaway user and return (token, email).
async fn signup(client: &Client) -> (String, String) {
    let email = format!("live-test-{}@petal.shop", uuid::Uuid::new_v4());
    let response = client
        .post(format!("{}/api/v1/users/signup", api_base_url()))
        .json(&json!({
            "name": "Live Tester",
            "email": email,
            "phone_number": "01012345678",
            "password": "a-strong-password",
            "password_confirm": "a-strong-password",
        }))
        .send()
        .await
        .expect("signup request");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("signup body");
    let token = body["token"].as_str().expect("token present").to_owned();
    (token, email)
}

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_health_endpoints() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", api_base_url()))
        .send()
        .await
        .expect("health request");
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .get(format!("{}/health/ready", api_base_url()))
        .send()
        .await
        .expect("readiness request");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_signup_then_login() {
    let client = Client::new();
    let (_, email) = signup(&client).await;

    let response = client
        .post(format!("{}/api/v1/users/login", api_base_url()))
        .json(&json!({ "email": email, "password": "a-strong-password" }))
        .send()
        .await
        .expect("login request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("login body");
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["data"]["user"]["email"], json!(email));
    // Credential material never leaves the server.
    assert!(body["data"]["user"]["password_hash"].is_null());
}

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_protected_routes_reject_anonymous_and_garbage_tokens() {
    let client = Client::new();

    let response = client
        .get(format!("{}/api/v1/cart", api_base_url()))
        .send()
        .await
        .expect("anonymous request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client
        .get(format!("{}/api/v1/cart", api_base_url()))
        .bearer_auth("not-a-real-token")
        .send()
        .await
        .expect("garbage token request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_cart_is_scoped_to_its_owner() {
    let client = Client::new();
    let (token, _) = signup(&client).await;

    // A fresh account has no cart yet; the API says 404, never 403.
    let response = client
        .get(format!("{}/api/v1/cart", api_base_url()))
        .bearer_auth(&token)
        .send()
        .await
        .expect("cart request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires a running server and seeded products"]
async fn test_cached_product_listing_is_stable_within_ttl() {
    let client = Client::new();

    let first = client
        .get(format!("{}/api/v1/products", api_base_url()))
        .send()
        .await
        .expect("first listing")
        .text()
        .await
        .expect("first body");

    let second = client
        .get(format!("{}/api/v1/products", api_base_url()))
        .send()
        .await
        .expect("second listing")
        .text()
        .await
        .expect("second body");

    // Within the TTL window the second read is served from the cache and
    // must be byte-identical.
    assert_eq!(first, second);
}

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_checkout_with_empty_cart_fails() {
    let client = Client::new();
    let (token, _) = signup(&client).await;

    let response = client
        .post(format!("{}/api/v1/orders/make-order", api_base_url()))
        .bearer_auth(&token)
        .json(&json!({
            "shipping_address": "10 Rose St",
            "city": "Cairo",
            "phone_number": "01012345678",
            "payment_method": "cash_on_delivery",
        }))
        .send()
        .await
        .expect("checkout request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
