//! Security tests
//!
//! Signature checks, the per-order nonce ceiling, ledger eviction, refund
//! hashing, webhook fallback and the testing-mode fixture gate.

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
    use base64::Engine;
    use serde_json::Value;
    use warp::http::StatusCode;
    use warp::test::request;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::domain::checkout::CheckoutPayload;
    use crate::tests::common::{self, TestApp};
    use crate::tests::config;

    const RETURN_URL: &str = "https://127.0.0.1/checkout/order-received";

    fn checkout_path(payload: &CheckoutPayload) -> String {
        format!(
            "/wc-paypal-proxy/v1/checkout?data={}",
            common::form_value(&common::encode(payload))
        )
    }

    fn json(body: &[u8]) -> Value {
        serde_json::from_slice(body).expect("json body")
    }

    #[tokio::test]
    async fn test_tampered_hash_is_rejected() {
        let app = TestApp::new(config::test_config());
        let mut payload = common::signed_payload("1001", "n-1", "25.50", RETURN_URL);
        let mut hash = payload.hash.clone().unwrap();
        let flipped = if hash.starts_with('0') { "1" } else { "0" };
        hash.replace_range(..1, flipped);
        payload.hash = Some(hash);

        let res = request().method("GET").path(&checkout_path(&payload)).reply(&app.routes()).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert!(String::from_utf8_lossy(res.body()).contains("Invalid data signature"));

        let res = request()
            .method("POST")
            .path("/wc-paypal-proxy/v1/create-order")
            .json(&serde_json::json!({
                "order_id": "1001",
                "nonce": common::session_nonce("1001"),
                "data": common::encode(&payload),
            }))
            .reply(&app.routes())
            .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(json(res.body())["code"], "unauthorized");
        assert!(app.gateway.created().await.is_empty());
    }

    #[tokio::test]
    async fn test_payload_from_unknown_domain_is_rejected() {
        let app = TestApp::new(config::test_config());
        let payload = common::signed_payload("1001", "n-1", "25.50", "https://evil.example/thanks");

        let res = request().method("GET").path(&checkout_path(&payload)).reply(&app.routes()).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_referer_attributes_call_to_store() {
        let app = TestApp::new(config::test_config());
        let payload = common::signed_payload("1001", "n-1", "25.50", "https://evil.example/thanks");

        let res = request()
            .method("GET")
            .path(&checkout_path(&payload))
            .header("referer", "https://127.0.0.1/checkout/")
            .reply(&app.routes())
            .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_bad_session_nonce_is_rejected_before_provider_call() {
        let app = TestApp::new(config::test_config());
        let payload = common::signed_payload("1001", "n-1", "25.50", RETURN_URL);

        let res = request()
            .method("POST")
            .path("/wc-paypal-proxy/v1/create-order")
            .json(&serde_json::json!({
                "order_id": "1001",
                "nonce": common::session_nonce("9999"),
                "data": common::encode(&payload),
            }))
            .reply(&app.routes())
            .await;

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        let body = json(res.body());
        assert_eq!(body["code"], "invalid_nonce");
        assert_eq!(body["data"]["status"], 403);
        assert!(app.gateway.created().await.is_empty());
    }

    #[tokio::test]
    async fn test_order_id_must_match_signed_data() {
        let app = TestApp::new(config::test_config());
        let payload = common::signed_payload("1001", "n-1", "25.50", RETURN_URL);

        let res = request()
            .method("POST")
            .path("/wc-paypal-proxy/v1/create-order")
            .json(&serde_json::json!({
                "order_id": "2002",
                "nonce": common::session_nonce("2002"),
                "data": common::encode(&payload),
            }))
            .reply(&app.routes())
            .await;

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert!(app.gateway.created().await.is_empty());
    }

    #[tokio::test]
    async fn test_unsigned_amount_cannot_override_signed_amount() {
        let app = TestApp::new(config::test_config());
        let payload = common::signed_payload("1001", "n-1", "25.50", RETURN_URL);

        let res = request()
            .method("POST")
            .path("/wc-paypal-proxy/v1/create-order")
            .json(&serde_json::json!({
                "order_id": "1001",
                "amount": "0.01",
                "nonce": common::session_nonce("1001"),
                "data": common::encode(&payload),
            }))
            .reply(&app.routes())
            .await;

        assert_eq!(res.status(), StatusCode::OK);
        let created = app.gateway.created().await;
        assert_eq!(created[0].amount.to_string(), "25.50");
    }

    #[tokio::test]
    async fn test_hundred_and_first_attempt_is_rejected() {
        let app = TestApp::new(config::test_config());
        let routes = app.routes();

        for attempt in 0..100 {
            let payload = common::signed_payload("1001", &format!("n-{}", attempt), "25.50", RETURN_URL);
            let res = request().method("GET").path(&checkout_path(&payload)).reply(&routes).await;
            assert_eq!(res.status(), StatusCode::OK, "attempt {}", attempt + 1);
        }

        let payload = common::signed_payload("1001", "n-100", "25.50", RETURN_URL);
        let res = request().method("GET").path(&checkout_path(&payload)).reply(&routes).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert!(String::from_utf8_lossy(res.body()).contains("Too many attempts for this order"));

        let other = common::signed_payload("1002", "n-0", "25.50", RETURN_URL);
        let res = request().method("GET").path(&checkout_path(&other)).reply(&routes).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_evicted_order_starts_over() {
        let mut config = config::test_config();
        config.security.nonce_ceiling = 1;
        config.security.ledger_capacity = 3;
        let app = TestApp::new(config);
        let routes = app.routes();

        let first = common::signed_payload("1", "n", "5.00", RETURN_URL);
        let res = request().method("GET").path(&checkout_path(&first)).reply(&routes).await;
        assert_eq!(res.status(), StatusCode::OK);
        let res = request().method("GET").path(&checkout_path(&first)).reply(&routes).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        for order in ["2", "3", "4"] {
            let payload = common::signed_payload(order, "n", "5.00", RETURN_URL);
            let res = request().method("GET").path(&checkout_path(&payload)).reply(&routes).await;
            assert_eq!(res.status(), StatusCode::OK);
        }

        let res = request().method("GET").path(&checkout_path(&first)).reply(&routes).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_refund_amount_mismatch_is_rejected() {
        let app = TestApp::new(config::test_config());
        let res = request()
            .method("POST")
            .path("/wc-paypal-proxy/v1/refund")
            .json(&serde_json::json!({
                "order_id": "1001",
                "transaction_id": "CAP-1",
                "amount": "100.00",
                "nonce": "r-1",
                "hash": common::refund_hash("1001", "r-1", "10.00"),
            }))
            .reply(&app.routes())
            .await;

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(json(res.body())["message"], "Invalid refund request");
        assert!(app.gateway.refunds().await.is_empty());
    }

    #[tokio::test]
    async fn test_testing_mode_never_bypasses_refund_verification() {
        let app = TestApp::new(config::testing_mode_config());
        let res = request()
            .method("POST")
            .path("/wc-paypal-proxy/v1/refund")
            .json(&serde_json::json!({
                "order_id": "1001",
                "transaction_id": "CAP-1",
                "amount": "10.00",
                "nonce": "r-1",
                "hash": "00",
            }))
            .reply(&app.routes())
            .await;

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert!(app.gateway.refunds().await.is_empty());
    }

    #[tokio::test]
    async fn test_fixture_token_requires_testing_mode() {
        let path = "/wc-paypal-proxy/v1/checkout?data=abc123";

        let app = TestApp::new(config::test_config());
        let res = request().method("GET").path(path).reply(&app.routes()).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let app = TestApp::new(config::testing_mode_config());
        let res = request().method("GET").path(path).reply(&app.routes()).await;
        assert_eq!(res.status(), StatusCode::OK);
        let html = String::from_utf8_lossy(res.body());
        assert!(html.contains("Order #123"));
        assert!(html.contains("Test Store"));
    }

    #[tokio::test]
    async fn test_primary_failure_falls_back_once_with_payload() {
        let store = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/wc-paypal-proxy/v1/webhook"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&store)
            .await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(query_param("wc-paypal-proxy-webhook", "yes"))
            .and(body_string_contains("payload="))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&store)
            .await;

        let app = TestApp::new(config::test_config());
        let payload = common::signed_payload("1001", "n-1", "25.50", &format!("{}/thanks", store.uri()));
        let res = request()
            .method("POST")
            .path("/wc-paypal-proxy/v1/capture-order")
            .json(&serde_json::json!({
                "order_id": "1001",
                "paypal_order_id": "PP-1001",
                "nonce": common::session_nonce("1001"),
                "data": common::encode(&payload),
            }))
            .reply(&app.routes())
            .await;
        assert_eq!(res.status(), StatusCode::OK);

        let received = store.received_requests().await.expect("recorded requests");
        assert_eq!(received.len(), 2);
        let legacy = &received[1];
        assert_eq!(legacy.url.query(), Some("wc-paypal-proxy-webhook=yes"));

        let form = |body: &[u8]| -> serde_json::Map<String, Value> {
            url::form_urlencoded::parse(body)
                .into_owned()
                .map(|(k, v)| (k, Value::String(v)))
                .collect()
        };
        let primary = form(&received[0].body);
        let mut fields = form(&legacy.body);
        let encoded = fields.remove("payload").expect("payload field");
        assert_eq!(fields, primary);
        assert_eq!(primary["transaction_id"], "CAP-PP-1001");
        assert_eq!(primary["status"], "completed");

        let decoded = BASE64_STANDARD.decode(encoded.as_str().expect("payload text")).expect("base64 payload");
        let notification: Value = serde_json::from_slice(&decoded).expect("json payload");
        assert_eq!(notification, Value::Object(primary));
    }
}
