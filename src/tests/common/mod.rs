//! Common test utilities and mock implementations
//!
//! This module provides shared utilities, mocks, and fixtures used across
//! all test modules.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use secrecy::SecretString;
use tokio::sync::Mutex;
use warp::{Filter, Reply};

use crate::config::AppConfig;
use crate::domain::checkout::{CheckoutPayload, ProductLine};
use crate::domain::orders::{LineItem, RemoteCapture, RemoteOrder, RemoteRefund};
use crate::domain::ports::PaymentGateway;
use crate::domain::signing::{self, CheckoutClaims, RefundClaims, SessionNonceIssuer};
use crate::infrastructure::adapters::LedgerStore;
use crate::infrastructure::http::HttpServer;
use crate::shared::error::{AppError, AppResult};
use crate::tests::config::{SESSION_SECRET, STORE_KEY};

/// Arguments of one `create_order` call
#[derive(Debug, Clone)]
pub struct CreatedOrder {
    pub order_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub items: Vec<LineItem>,
}

/// Arguments of one `refund_capture` call
#[derive(Debug, Clone)]
pub struct IssuedRefund {
    pub capture_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub reason: String,
}

/// In-memory payment gateway that records every call
#[derive(Default)]
pub struct MockGateway {
    created: Mutex<Vec<CreatedOrder>>,
    captured: Mutex<Vec<String>>,
    refunds: Mutex<Vec<IssuedRefund>>,
    decline_captures: bool,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway whose captures are always declined
    pub fn declining() -> Self {
        Self {
            decline_captures: true,
            ..Self::default()
        }
    }

    pub async fn created(&self) -> Vec<CreatedOrder> {
        self.created.lock().await.clone()
    }

    pub async fn captured(&self) -> Vec<String> {
        self.captured.lock().await.clone()
    }

    pub async fn refunds(&self) -> Vec<IssuedRefund> {
        self.refunds.lock().await.clone()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_order(
        &self,
        order_id: &str,
        amount: Decimal,
        currency: &str,
        items: &[LineItem],
    ) -> AppResult<RemoteOrder> {
        self.created.lock().await.push(CreatedOrder {
            order_id: order_id.to_string(),
            amount,
            currency: currency.to_string(),
            items: items.to_vec(),
        });
        Ok(RemoteOrder {
            id: format!("PP-{}", order_id),
            status: "CREATED".to_string(),
        })
    }

    async fn capture_order(&self, remote_order_id: &str) -> AppResult<RemoteCapture> {
        self.captured.lock().await.push(remote_order_id.to_string());
        if self.decline_captures {
            return Err(AppError::Gateway("INSTRUMENT_DECLINED".to_string()));
        }
        Ok(RemoteCapture {
            id: format!("CAP-{}", remote_order_id),
            order_id: remote_order_id.to_string(),
            status: "COMPLETED".to_string(),
        })
    }

    async fn refund_capture(
        &self,
        capture_id: &str,
        amount: Decimal,
        currency: &str,
        reason: &str,
    ) -> AppResult<RemoteRefund> {
        self.refunds.lock().await.push(IssuedRefund {
            capture_id: capture_id.to_string(),
            amount,
            currency: currency.to_string(),
            reason: reason.to_string(),
        });
        Ok(RemoteRefund {
            id: format!("REF-{}", capture_id),
            status: "COMPLETED".to_string(),
        })
    }

    fn is_configured(&self) -> bool {
        true
    }
}

/// A server wired to an in-memory ledger and a mock gateway
pub struct TestApp {
    pub server: HttpServer,
    pub gateway: Arc<MockGateway>,
}

impl TestApp {
    pub fn new(config: AppConfig) -> Self {
        Self::with_gateway(config, MockGateway::new())
    }

    pub fn with_gateway(config: AppConfig, gateway: MockGateway) -> Self {
        crate::tests::config::init();
        let ledger = LedgerStore::in_memory(config.security.nonce_ceiling, config.security.ledger_capacity);
        let gateway = Arc::new(gateway);
        let server = HttpServer::with_components(Arc::new(config), Arc::new(ledger), gateway.clone())
            .expect("test server");
        Self { server, gateway }
    }

    pub fn routes(&self) -> impl Filter<Extract = impl Reply, Error = std::convert::Infallible> + Clone {
        self.server.routes()
    }
}

/// Payload signed with the test store's key
pub fn signed_payload(order_id: &str, nonce: &str, amount: &str, return_url: &str) -> CheckoutPayload {
    let hash = signing::sign(&store_key(), &CheckoutClaims { order_id, nonce });
    CheckoutPayload {
        order_id: Some(order_id.into()),
        nonce: Some(nonce.into()),
        hash: Some(hash),
        currency: Some("EUR".to_string()),
        amount: Some(amount.into()),
        return_url: Some(return_url.to_string()),
        cancel_url: Some(format!("{}/cart", return_url.trim_end_matches('/'))),
        store_name: Some("Test Store".to_string()),
        products: vec![],
    }
}

/// A single product line priced at `price`
pub fn product(name: &str, quantity: &str, price: &str) -> ProductLine {
    ProductLine {
        name: Some(name.to_string()),
        quantity: Some(quantity.into()),
        price: Some(price.into()),
        origin_product_id: Some("42".into()),
        ..Default::default()
    }
}

pub fn encode(payload: &CheckoutPayload) -> String {
    payload.encode().expect("encode payload")
}

/// Refund hash as the store computes it
pub fn refund_hash(order_id: &str, nonce: &str, amount: &str) -> String {
    signing::sign(&store_key(), &RefundClaims { order_id, nonce, amount })
}

/// Session nonce the checkout page would have been given
pub fn session_nonce(order_id: &str) -> String {
    SessionNonceIssuer::new(SecretString::new(SESSION_SECRET.to_string()), 12).issue(order_id, Utc::now())
}

/// Percent-encode a value for a query string or form body
pub fn form_value(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn store_key() -> SecretString {
    SecretString::new(STORE_KEY.to_string())
}
