//! Integration tests for the PayPal proxy bridge
//!
//! Requests go through the complete route tree, including rejection
//! recovery. The origin store is a wiremock server on loopback.

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use secrecy::SecretString;
    use serde_json::Value;
    use warp::http::StatusCode;
    use warp::test::request;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::domain::signing::{self, WebhookClaims};
    use crate::tests::common::{self, MockGateway, TestApp};
    use crate::tests::config::{self, STORE_KEY};

    fn json(body: &[u8]) -> Value {
        serde_json::from_slice(body).expect("json body")
    }

    fn form_fields(body: &[u8]) -> std::collections::HashMap<String, String> {
        url::form_urlencoded::parse(body).into_owned().collect()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = TestApp::new(config::test_config());
        let res = request().method("GET").path("/health").reply(&app.routes()).await;

        assert_eq!(res.status(), StatusCode::OK);
        let body = json(res.body());
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["paypal_configured"], true);
    }

    #[tokio::test]
    async fn test_unknown_route_returns_rest_error() {
        let app = TestApp::new(config::test_config());
        let res = request().method("GET").path("/wc-paypal-proxy/v1/nope").reply(&app.routes()).await;

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(res.body())["code"], "rest_no_route");
    }

    #[tokio::test]
    async fn test_checkout_page_renders_session() {
        let app = TestApp::new(config::test_config());
        let payload = common::signed_payload("1001", "n-1", "25.50", "https://127.0.0.1/checkout/order-received");
        let data = common::encode(&payload);

        let res = request()
            .method("GET")
            .path(&format!("/wc-paypal-proxy/v1/checkout?data={}", common::form_value(&data)))
            .reply(&app.routes())
            .await;

        assert_eq!(res.status(), StatusCode::OK);
        let html = String::from_utf8_lossy(res.body());
        assert!(html.contains("var wc_paypal_proxy_data = "));
        assert!(html.contains("https://pay.proxy.test/wc-paypal-proxy/v1/create-order"));
        assert!(html.contains("https://pay.proxy.test/wc-paypal-proxy/v1/capture-order"));
        assert!(html.contains(&common::session_nonce("1001")));
        assert!(html.contains("currency=EUR"));
    }

    #[tokio::test]
    async fn test_checkout_without_data_renders_error_page() {
        let app = TestApp::new(config::test_config());
        let res = request().method("GET").path("/wc-paypal-proxy/v1/checkout").reply(&app.routes()).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let html = String::from_utf8_lossy(res.body());
        assert!(html.contains("No data provided"));
        assert!(html.contains("payment_failed"));
    }

    #[tokio::test]
    async fn test_checkout_create_capture_notifies_store() {
        let store = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/wc-paypal-proxy/v1/webhook"))
            .and(body_string_contains("status=completed"))
            .and(body_string_contains("transaction_id=CAP-PP-1001"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&store)
            .await;

        let app = TestApp::new(config::test_config());
        let routes = app.routes();
        let return_url = format!("{}/checkout/order-received/1001", store.uri());
        let mut payload = common::signed_payload("1001", "n-1", "25.50", &return_url);
        payload.products = vec![common::product("Widget", "2", "10.00")];
        let data = common::encode(&payload);

        let res = request()
            .method("GET")
            .path(&format!("/wc-paypal-proxy/v1/checkout?data={}", common::form_value(&data)))
            .reply(&routes)
            .await;
        assert_eq!(res.status(), StatusCode::OK);

        let nonce = common::session_nonce("1001");
        let res = request()
            .method("POST")
            .path("/wc-paypal-proxy/v1/create-order")
            .header("content-type", "application/json")
            .json(&serde_json::json!({
                "order_id": 1001,
                "amount": "25.50",
                "nonce": nonce,
                "data": data,
            }))
            .reply(&routes)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let order = json(res.body());
        assert_eq!(order["id"], "PP-1001");
        assert_eq!(order["status"], "CREATED");

        let created = app.gateway.created().await;
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].amount, dec!(25.50));
        assert_eq!(created[0].currency, "EUR");
        assert_eq!(created[0].items.len(), 1);
        assert_eq!(created[0].items[0].quantity, 2);
        assert_eq!(created[0].items[0].unit_price, dec!(10.00));
        assert_eq!(created[0].items[0].sku, "A-42");

        let body = format!(
            "order_id=1001&paypal_order_id=PP-1001&nonce={}&data={}",
            common::form_value(&nonce),
            common::form_value(&data)
        );
        let res = request()
            .method("POST")
            .path("/wc-paypal-proxy/v1/capture-order")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(body)
            .reply(&routes)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let capture = json(res.body());
        assert_eq!(capture["id"], "CAP-PP-1001");
        assert_eq!(capture["status"], "COMPLETED");

        let received = store.received_requests().await.expect("recorded requests");
        assert_eq!(received.len(), 1);
        let fields = form_fields(&received[0].body);
        let expected_hash = signing::sign(
            &SecretString::new(STORE_KEY.to_string()),
            &WebhookClaims {
                order_id: "1001",
                status: "completed",
                nonce: &fields["nonce"],
            },
        );
        assert_eq!(fields["hash"], expected_hash);
        assert_eq!(fields["order_id"], "1001");
    }

    #[tokio::test]
    async fn test_mapped_products_use_destination_names() {
        let mut config = config::test_config();
        config
            .catalog
            .product_names
            .insert("905".to_string(), "Ceramic Mug".to_string());
        let app = TestApp::new(config);

        let mut mapped = common::product("Tasse", "1", "8.00");
        mapped.mapped_product_id = Some("905".into());
        let mut payload = common::signed_payload("1004", "n-1", "12.00", "https://127.0.0.1/thanks");
        payload.products = vec![mapped, common::product("Sticker", "2", "1.00")];

        let res = request()
            .method("POST")
            .path("/wc-paypal-proxy/v1/create-order")
            .json(&serde_json::json!({
                "order_id": "1004",
                "nonce": common::session_nonce("1004"),
                "data": common::encode(&payload),
            }))
            .reply(&app.routes())
            .await;
        assert_eq!(res.status(), StatusCode::OK);

        let created = app.gateway.created().await;
        let items = &created[0].items;
        assert_eq!(items[0].name, "Ceramic Mug");
        assert_eq!(items[0].sku, "905");
        assert_eq!(items[1].name, "Sticker");
        assert_eq!(items[1].sku, "A-42");
        assert_eq!(created[0].amount, dec!(12.00));
    }

    #[tokio::test]
    async fn test_declined_capture_reports_failure() {
        let store = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/wc-paypal-proxy/v1/webhook"))
            .and(body_string_contains("status=failed"))
            .and(body_string_contains("error=INSTRUMENT_DECLINED"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&store)
            .await;

        let app = TestApp::with_gateway(config::test_config(), MockGateway::declining());
        let payload = common::signed_payload("1002", "n-1", "10.00", &format!("{}/thanks", store.uri()));
        let res = request()
            .method("POST")
            .path("/wc-paypal-proxy/v1/capture-order")
            .json(&serde_json::json!({
                "order_id": "1002",
                "paypal_order_id": "PP-1002",
                "nonce": common::session_nonce("1002"),
                "data": common::encode(&payload),
            }))
            .reply(&app.routes())
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = json(res.body());
        assert_eq!(body["code"], "gateway_error");
        assert_eq!(body["message"], "INSTRUMENT_DECLINED");
        assert_eq!(body["data"]["status"], 400);
    }

    #[tokio::test]
    async fn test_capture_requires_paypal_order_id() {
        let app = TestApp::new(config::test_config());
        let payload = common::signed_payload("1003", "n-1", "10.00", "https://127.0.0.1/thanks");
        let res = request()
            .method("POST")
            .path("/wc-paypal-proxy/v1/capture-order")
            .json(&serde_json::json!({
                "order_id": "1003",
                "nonce": common::session_nonce("1003"),
                "data": common::encode(&payload),
            }))
            .reply(&app.routes())
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(app.gateway.captured().await.is_empty());
    }

    #[tokio::test]
    async fn test_refund_with_return_url_notifies_store() {
        let store = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/wc-paypal-proxy/v1/webhook"))
            .and(body_string_contains("status=refunded"))
            .and(body_string_contains("transaction_id=REF-CAP-1"))
            .and(body_string_contains("amount=10.00"))
            .and(body_string_contains("reason=Damaged"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&store)
            .await;

        let app = TestApp::new(config::test_config());
        let res = request()
            .method("POST")
            .path("/wc-paypal-proxy/v1/refund")
            .json(&serde_json::json!({
                "order_id": "1001",
                "transaction_id": "CAP-1",
                "amount": "10.00",
                "currency": "eur",
                "reason": "Damaged",
                "nonce": "r-1",
                "hash": common::refund_hash("1001", "r-1", "10.00"),
                "return_url": format!("{}/my-account", store.uri()),
            }))
            .reply(&app.routes())
            .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body = json(res.body());
        assert_eq!(body["success"], true);
        assert_eq!(body["id"], "REF-CAP-1");

        let refunds = app.gateway.refunds().await;
        assert_eq!(refunds.len(), 1);
        assert_eq!(refunds[0].capture_id, "CAP-1");
        assert_eq!(refunds[0].amount, dec!(10.00));
        assert_eq!(refunds[0].currency, "EUR");
        assert_eq!(refunds[0].reason, "Damaged");
    }

    #[tokio::test]
    async fn test_refund_missing_parameters() {
        let app = TestApp::new(config::test_config());
        let res = request()
            .method("POST")
            .path("/wc-paypal-proxy/v1/refund")
            .header("content-type", "application/x-www-form-urlencoded")
            .body("order_id=1001&amount=10.00")
            .reply(&app.routes())
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = json(res.body());
        assert_eq!(body["code"], "invalid_request");
        assert_eq!(body["message"], "Missing required parameters");
        assert!(app.gateway.refunds().await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_json_body_is_rejected() {
        let app = TestApp::new(config::test_config());
        let res = request()
            .method("POST")
            .path("/wc-paypal-proxy/v1/create-order")
            .header("content-type", "application/json")
            .body("{not json")
            .reply(&app.routes())
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(res.body())["code"], "invalid_json");
    }
}
