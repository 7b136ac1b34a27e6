//! HTTP-level tests for the checkout-session service.

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use cart_api::{create_router, AppConfig, AppState};
use cart_core::{CartConfig, CheckoutRequest, FeeSchedule, LineItem, Merchant, MerchantRegistry, WidgetFlavor};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn registry() -> MerchantRegistry {
    MerchantRegistry::new()
        .with_merchant(Merchant::new("ghomoud", "Ghomoud Store"))
        .with_merchant(Merchant::new("paused", "Paused Shop").inactive())
        .with_merchant(
            Merchant::new("nofees", "No Fees").with_fees(FeeSchedule {
                platform_rate: 0.0,
                gateway_rate: 0.0,
                gateway_fixed: 0.0,
            }),
        )
}

fn server_with(config: AppConfig) -> TestServer {
    let state = AppState::with_parts(config, registry()).unwrap();
    TestServer::new(create_router(state)).unwrap()
}

fn server() -> TestServer {
    server_with(AppConfig::default())
}

fn cart_body() -> Value {
    json!({
        "merchant_id": "ghomoud",
        "items": [
            { "id": "prod-1", "name": "Widget", "price": 1000, "quantity": 2 }
        ],
        "total": 2000
    })
}

#[tokio::test]
async fn test_health() {
    let response = server().get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "routebase-cart");
}

#[tokio::test]
async fn test_create_session_routebase_flavor() {
    let response = server()
        .post("/api/checkout/session")
        .json(&cart_body())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["replayed"], false);

    let url = body["checkout_url"].as_str().unwrap();
    assert_eq!(body["checkoutUrl"], url);
    assert_eq!(body["checkout_session"]["checkout_url"], url);
    assert!(url.starts_with("http://localhost:8080/checkout/cs_"));

    let session = &body["checkout_session"];
    assert_eq!(session["total"], 2000.0);
    assert_eq!(session["platform_fee"], 60.0);
    assert_eq!(session["gateway_fee"], 88.0);
    assert_eq!(session["merchant_payout"], 1852.0);
    assert_eq!(session["currency"], "PKR");
    assert_eq!(body["items"][0]["quantity"], 2);
}

#[tokio::test]
async fn test_create_session_rb_flavor() {
    let response = server()
        .post("/api/checkout/session")
        .json(&json!({
            "merchantId": "ghomoud",
            "items": [{ "id": "p1", "name": "Tea", "price": "250", "qty": 3 }]
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["checkout_session"]["total"], 750.0);
    assert_eq!(body["items"][0]["quantity"], 3);
}

/// POST the body a widget with `config` would send, to the path it would use
async fn post_as_widget(server: &TestServer, config: CartConfig) -> axum_test::TestResponse {
    let origin = "http://localhost:8080";
    let config = config.with_default_origin(origin);
    let endpoint = config.checkout_endpoint();
    let path = endpoint.strip_prefix(origin).unwrap().to_string();

    let request = CheckoutRequest {
        merchant_id: config.merchant_id.clone(),
        items: vec![LineItem::new("p1", "Tea", 250.0).with_quantity(2)],
        total: 500.0,
        idempotency_key: format!("widget-{}", config.storage_key()),
        flavor: config.flavor,
        endpoint,
    };
    server.post(&path).json(&request.body().unwrap()).await
}

#[tokio::test]
async fn test_default_widget_endpoints_reach_service() {
    let server = server();

    let response = post_as_widget(&server, CartConfig::new("ghomoud")).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["checkout_session"]["total"], 500.0);

    let response = post_as_widget(
        &server,
        CartConfig::new("ghomoud").with_flavor(WidgetFlavor::RouteBase),
    )
    .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_missing_fields() {
    let server = server();

    let response = server
        .post("/api/checkout/session")
        .json(&json!({ "items": [{ "id": "p1", "price": 1 }] }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post("/api/checkout/session")
        .json(&json!({ "merchant_id": "ghomoud", "items": [] }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_invalid_item_rejected() {
    let response = server()
        .post("/api/checkout/session")
        .json(&json!({
            "merchant_id": "ghomoud",
            "items": [{ "id": "p1", "name": "Bad", "price": "abc" }]
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Invalid item in cart");
}

#[tokio::test]
async fn test_total_mismatch_rejected() {
    let mut body = cart_body();
    body["total"] = json!(1999.5);

    let response = server().post("/api/checkout/session").json(&body).await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_total_within_tolerance() {
    let mut body = cart_body();
    body["total"] = json!(2000.005);

    let response = server().post("/api/checkout/session").json(&body).await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_inactive_merchant() {
    let mut body = cart_body();
    body["merchant_id"] = json!("paused");

    let response = server().post("/api/checkout/session").json(&body).await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unlisted_merchant_uses_defaults() {
    let mut body = cart_body();
    body["merchant_id"] = json!("walk-in");

    let response = server().post("/api/checkout/session").json(&body).await;
    response.assert_status_ok();
    let session: Value = response.json();
    assert_eq!(session["checkout_session"]["platform_fee"], 60.0);
}

#[tokio::test]
async fn test_merchant_fee_override() {
    let mut body = cart_body();
    body["merchant_id"] = json!("nofees");

    let response = server().post("/api/checkout/session").json(&body).await;
    let session: Value = response.json();
    assert_eq!(session["checkout_session"]["merchant_payout"], 2000.0);
}

#[tokio::test]
async fn test_idempotent_replay() {
    let server = server();
    let mut body = cart_body();
    body["idempotency_key"] = json!("key-1");

    let first: Value = server.post("/api/checkout/session").json(&body).await.json();
    let second: Value = server.post("/api/checkout/session").json(&body).await.json();

    assert_eq!(first["session_id"], second["session_id"]);
    assert_eq!(first["replayed"], false);
    assert_eq!(second["replayed"], true);

    let listed: Value = server
        .get("/api/checkout/session")
        .add_query_param("merchant_id", "ghomoud")
        .await
        .json();
    assert_eq!(listed["count"], 1);
}

#[tokio::test]
async fn test_idempotency_key_header() {
    let server = server();

    let first: Value = server
        .post("/api/checkout/session")
        .add_header(
            HeaderName::from_static("idempotency-key"),
            HeaderValue::from_static("hdr-1"),
        )
        .json(&cart_body())
        .await
        .json();

    let mut body = cart_body();
    body["idempotency_key"] = json!("hdr-1");
    let second: Value = server.post("/api/checkout/session").json(&body).await.json();

    assert_eq!(first["session_id"], second["session_id"]);
    assert_eq!(second["replayed"], true);
}

#[tokio::test]
async fn test_idempotency_conflict() {
    let server = server();
    let mut body = cart_body();
    body["idempotency_key"] = json!("key-2");

    server
        .post("/api/checkout/session")
        .json(&body)
        .await
        .assert_status_ok();

    body["items"][0]["quantity"] = json!(3);
    body["total"] = json!(3000);
    let response = server.post("/api/checkout/session").json(&body).await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_concurrent_duplicates_collapse() {
    let server = server();
    let mut body = cart_body();
    body["idempotency_key"] = json!("key-3");

    let (a, b) = tokio::join!(
        async { server.post("/api/checkout/session").json(&body).await },
        async { server.post("/api/checkout/session").json(&body).await },
    );

    let a: Value = a.json();
    let b: Value = b.json();
    assert_eq!(a["session_id"], b["session_id"]);
    assert_ne!(a["replayed"], b["replayed"]);
}

#[tokio::test]
async fn test_get_session_lookup() {
    let server = server();
    let created: Value = server
        .post("/api/checkout/session")
        .json(&cart_body())
        .await
        .json();
    let session_id = created["session_id"].as_str().unwrap();

    let response = server
        .get("/api/checkout/session")
        .add_query_param("session_id", session_id)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["checkout_session"]["id"], session_id);

    server
        .get("/api/checkout/session")
        .add_query_param("session_id", "cs_0_missing")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    server
        .get("/api/checkout/session")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_checkout_page() {
    let server = server();
    let created: Value = server
        .post("/api/checkout/session")
        .json(&json!({
            "merchant_id": "ghomoud",
            "items": [{ "id": "p1", "name": "<script>x</script>", "price": 10 }]
        }))
        .await
        .json();
    let session_id = created["session_id"].as_str().unwrap();

    let response = server.get(&format!("/checkout/{}", session_id)).await;
    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("&lt;script&gt;"));
    assert!(!html.contains("<script>x"));

    server
        .get("/checkout/cs_0_missing")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_backend_forwarding() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/checkout/session"))
        .and(header("idempotency-key", "fwd-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "checkout_session": { "id": "remote_1", "checkout_url": "https://pay.example.com/c/remote_1" }
        })))
        .expect(1)
        .mount(&backend)
        .await;

    let server = server_with(AppConfig {
        backend_url: Some(backend.uri()),
        ..AppConfig::default()
    });

    let mut body = cart_body();
    body["idempotency_key"] = json!("fwd-1");

    let first: Value = server.post("/api/checkout/session").json(&body).await.json();
    assert_eq!(first["checkoutUrl"], "https://pay.example.com/c/remote_1");
    assert!(first.get("warning").is_none());

    // Replays do not hit the backend again
    let second: Value = server.post("/api/checkout/session").json(&body).await.json();
    assert_eq!(second["checkoutUrl"], "https://pay.example.com/c/remote_1");
}

#[tokio::test]
async fn test_backend_error_returns_500() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/checkout/session"))
        .respond_with(ResponseTemplate::new(502).set_body_json(json!({ "error": "gateway down" })))
        .mount(&backend)
        .await;

    let server = server_with(AppConfig {
        backend_url: Some(backend.uri()),
        ..AppConfig::default()
    });

    let mut body = cart_body();
    body["idempotency_key"] = json!("err-1");
    let response = server.post("/api/checkout/session").json(&body).await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    // The failed attempt leaves the key free for a retry
    let listed: Value = server
        .get("/api/checkout/session")
        .add_query_param("merchant_id", "ghomoud")
        .await
        .json();
    assert_eq!(listed["count"], 0);
}

#[tokio::test]
async fn test_backend_unreachable_falls_back() {
    let server = server_with(AppConfig {
        backend_url: Some("http://127.0.0.1:1".to_string()),
        ..AppConfig::default()
    });

    let response = server
        .post("/api/checkout/session")
        .json(&cart_body())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["warning"].is_string());
    assert!(body["checkout_url"]
        .as_str()
        .unwrap()
        .starts_with("http://localhost:8080/checkout/"));
}
