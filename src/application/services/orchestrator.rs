//! Order orchestration
//!
//! Drives one checkout, create, capture or refund call from authentication
//! through the payment provider to the store notification. Each handler
//! stops at the first failure.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::application::services::authenticator::{AuthContext, RequestAuthenticator};
use crate::application::services::notifier::WebhookNotifier;
use crate::config::AppConfig;
use crate::domain::checkout::{CheckoutPayload, CheckoutSession, SessionLinks, TEST_FIXTURE_TOKEN};
use crate::domain::money::{self, TextValue};
use crate::domain::orders::{LineItem, OrderFlow, OrderState, RemoteCapture, RemoteOrder};
use crate::domain::ports::{PaymentGateway, ProductNameResolver};
use crate::domain::webhook::{PaymentStatus, WebhookDetails};
use crate::shared::error::{AppError, AppResult};

/// Body of `POST /create-order`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateOrderRequest {
    pub order_id: Option<TextValue>,
    pub amount: Option<TextValue>,
    pub currency: Option<String>,
    pub nonce: Option<String>,
    pub data: Option<String>,
}

/// Body of `POST /capture-order`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CaptureOrderRequest {
    pub order_id: Option<TextValue>,
    pub paypal_order_id: Option<String>,
    pub nonce: Option<String>,
    pub data: Option<String>,
}

/// Body of `POST /refund`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RefundRequest {
    pub order_id: Option<TextValue>,
    pub transaction_id: Option<String>,
    pub amount: Option<TextValue>,
    pub reason: Option<String>,
    pub currency: Option<String>,
    pub nonce: Option<TextValue>,
    pub hash: Option<String>,
    pub return_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefundResponse {
    pub success: bool,
    pub id: String,
    pub status: String,
}

fn text(value: &Option<TextValue>) -> String {
    value.as_ref().map(TextValue::as_text).unwrap_or_default()
}

fn trimmed(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub struct OrderOrchestrator {
    config: Arc<AppConfig>,
    authenticator: Arc<RequestAuthenticator>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<WebhookNotifier>,
    catalog: Arc<dyn ProductNameResolver>,
}

impl OrderOrchestrator {
    pub fn new(
        config: Arc<AppConfig>,
        authenticator: Arc<RequestAuthenticator>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<WebhookNotifier>,
        catalog: Arc<dyn ProductNameResolver>,
    ) -> Self {
        Self {
            config,
            authenticator,
            gateway,
            notifier,
            catalog,
        }
    }

    pub fn gateway_configured(&self) -> bool {
        self.gateway.is_configured()
    }

    pub fn paypal_client_id(&self) -> &str {
        &self.config.paypal.client_id
    }

    /// Decode the `data` blob, honouring the fixture token only in testing mode
    fn load_payload(&self, data: Option<&str>) -> AppResult<CheckoutPayload> {
        let data = data
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| AppError::Validation("No data provided".to_string()))?;

        if data == TEST_FIXTURE_TOKEN && self.authenticator.testing_mode() {
            warn!("Testing mode: using fixture checkout data");
            return Ok(CheckoutPayload::test_fixture());
        }
        CheckoutPayload::decode(data)
    }

    /// Authenticate a checkout request and build the session for the page
    pub async fn handle_checkout(&self, ctx: &AuthContext, data: Option<&str>) -> AppResult<CheckoutSession> {
        let payload = self.load_payload(data)?;
        let mut flow = OrderFlow::start(payload.order_id());

        if let Err(e) = self.authenticator.verify_checkout(ctx, &payload).await {
            flow.fail();
            return Err(e);
        }
        flow.advance(OrderState::Authenticated);

        let order_id = payload.order_id();
        let links = SessionLinks {
            create_url: self.config.endpoint_url("create-order"),
            capture_url: self.config.endpoint_url("capture-order"),
            session_nonce: self.authenticator.issue_session_nonce(&order_id),
        };
        let session = CheckoutSession::assemble(&payload, data.unwrap_or_default().trim(), links)?;
        info!(order_id = %session.order_id, amount = %session.amount, currency = %session.currency, "Checkout session created");
        Ok(session)
    }

    /// Re-verify and create the remote order for the signed amount
    pub async fn handle_create_order(&self, ctx: &AuthContext, request: CreateOrderRequest) -> AppResult<RemoteOrder> {
        let order_id = text(&request.order_id);
        self.authenticator.verify_session_nonce(&order_id, trimmed(&request.nonce))?;

        let payload = self.load_payload(request.data.as_deref())?;
        let mut flow = OrderFlow::start(order_id.clone());
        self.authenticate_for_order(ctx, &payload, &order_id, &mut flow).await?;

        let amount = payload
            .amount()
            .filter(|a| *a > Decimal::ZERO)
            .ok_or_else(|| AppError::Validation("Invalid order amount".to_string()))?;
        if let Some(claimed) = request.amount.as_ref().and_then(TextValue::as_decimal) {
            if claimed != amount {
                warn!(order_id = %order_id, claimed = %claimed, signed = %amount, "Ignoring unsigned amount that differs from signed amount");
            }
        }
        let currency = money::normalize_currency(payload.currency.as_deref().or(request.currency.as_deref()))?;

        let items = self.line_items(&payload);
        info!(order_id = %order_id, items = items.len(), "Creating PayPal order");

        match self.gateway.create_order(&order_id, amount, &currency, &items).await {
            Ok(order) => {
                flow.advance(OrderState::RemoteOrderCreated);
                Ok(order)
            }
            Err(e) => {
                flow.fail();
                Err(e)
            }
        }
    }

    /// Re-verify, capture and report the outcome to the store
    pub async fn handle_capture_order(&self, ctx: &AuthContext, request: CaptureOrderRequest) -> AppResult<RemoteCapture> {
        let order_id = text(&request.order_id);
        self.authenticator.verify_session_nonce(&order_id, trimmed(&request.nonce))?;

        let payload = self.load_payload(request.data.as_deref())?;
        let mut flow = OrderFlow::start(order_id.clone());
        self.authenticate_for_order(ctx, &payload, &order_id, &mut flow).await?;

        let remote_id = trimmed(&request.paypal_order_id)
            .ok_or_else(|| AppError::Validation("Missing PayPal order id".to_string()))?
            .to_string();

        let origin = payload.return_url.as_deref();
        match self.gateway.capture_order(&remote_id).await {
            Ok(capture) => {
                flow.advance(OrderState::Captured);
                info!(order_id = %order_id, paypal_order_id = %remote_id, capture_id = %capture.id, "Order captured");
                let outcome = self
                    .notifier
                    .notify(origin, &order_id, PaymentStatus::Completed, WebhookDetails::transaction(capture.id.clone()))
                    .await;
                if outcome.is_delivered() {
                    flow.advance(OrderState::Notified);
                }
                Ok(capture)
            }
            Err(e) => {
                flow.fail();
                warn!(order_id = %order_id, error = %e, "Capture failed");
                self.notifier
                    .notify(origin, &order_id, PaymentStatus::Failed, WebhookDetails::failure(e.public_message()))
                    .await;
                Err(e)
            }
        }
    }

    /// Verify a store-signed refund, refund the capture and report it
    pub async fn handle_refund(&self, request: RefundRequest) -> AppResult<RefundResponse> {
        let order_id = text(&request.order_id);
        let transaction_id = trimmed(&request.transaction_id).unwrap_or_default().to_string();
        let amount_text = text(&request.amount);
        let amount = money::parse_amount(&amount_text).filter(|a| *a > Decimal::ZERO);

        let amount = match amount {
            Some(amount) if !order_id.is_empty() && !transaction_id.is_empty() => amount,
            _ => return Err(AppError::Validation("Missing required parameters".to_string())),
        };

        let mut flow = OrderFlow::start(order_id.clone());
        let credential = match self
            .authenticator
            .verify_refund(&order_id, &text(&request.nonce), &amount_text, request.hash.as_deref().unwrap_or_default().trim())
            .await
        {
            Ok(credential) => credential,
            Err(e) => {
                flow.fail();
                return Err(e);
            }
        };
        flow.advance(OrderState::Authenticated);

        let currency = money::normalize_currency(request.currency.as_deref())?;
        let reason = request.reason.as_deref().unwrap_or_default().trim().to_string();

        let refund = match self.gateway.refund_capture(&transaction_id, amount, &currency, &reason).await {
            Ok(refund) => refund,
            Err(e) => {
                flow.fail();
                return Err(e);
            }
        };
        info!(order_id = %order_id, refund_id = %refund.id, amount = %money::format_amount(amount), currency = %currency, "Refund processed");

        let details = WebhookDetails {
            transaction_id: Some(refund.id.clone()),
            amount: Some(money::format_amount(amount)),
            reason: Some(reason).filter(|r| !r.is_empty()),
            error: None,
        };
        let outcome = match trimmed(&request.return_url) {
            Some(url) => self.notifier.notify(Some(url), &order_id, PaymentStatus::Refunded, details).await,
            None => {
                let store_url = credential.default_store_url();
                self.notifier
                    .notify_entry(&credential, &store_url, &order_id, PaymentStatus::Refunded, details)
                    .await
            }
        };
        if outcome.is_delivered() {
            flow.advance(OrderState::Notified);
        }

        Ok(RefundResponse {
            success: true,
            id: refund.id,
            status: refund.status,
        })
    }

    async fn authenticate_for_order(
        &self,
        ctx: &AuthContext,
        payload: &CheckoutPayload,
        order_id: &str,
        flow: &mut OrderFlow,
    ) -> AppResult<()> {
        if let Err(e) = self.authenticator.verify_checkout(ctx, payload).await {
            flow.fail();
            return Err(e);
        }
        if payload.order_id() != order_id {
            flow.fail();
            warn!(order_id = %order_id, signed_order_id = %payload.order_id(), "Order id does not match signed data");
            return Err(AppError::Auth("Invalid data signature".to_string()));
        }
        flow.advance(OrderState::Authenticated);
        Ok(())
    }

    /// Provider line items, using destination-store names for mapped products
    fn line_items(&self, payload: &CheckoutPayload) -> Vec<LineItem> {
        payload
            .products
            .iter()
            .filter_map(|product| {
                let resolved = product
                    .mapped_id()
                    .and_then(|id| self.catalog.product_name(&id));
                LineItem::from_product(product, resolved)
            })
            .collect()
    }
}
