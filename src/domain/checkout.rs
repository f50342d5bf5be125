//! Checkout payloads sent by client stores and the session handed to the
//! checkout page.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::money::{self, TextValue};
use crate::shared::error::{AppError, AppResult};

/// Sentinel `data` value that loads [`CheckoutPayload::test_fixture`]
/// instead of decoding. Only honoured when testing mode is enabled.
pub const TEST_FIXTURE_TOKEN: &str = "abc123";

/// One product line as described by the originating store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<TextValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<TextValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<TextValue>,
    /// Product id in the originating store
    #[serde(rename = "store_a_id", skip_serializing_if = "Option::is_none")]
    pub origin_product_id: Option<TextValue>,
    /// Product id in the destination (proxy) store, when mapped
    #[serde(rename = "store_b_id", skip_serializing_if = "Option::is_none")]
    pub mapped_product_id: Option<TextValue>,
}

impl ProductLine {
    pub fn mapped_id(&self) -> Option<String> {
        self.mapped_product_id
            .as_ref()
            .map(TextValue::as_text)
            .filter(|id| !id.is_empty() && id != "0")
    }

    pub fn origin_id(&self) -> Option<String> {
        self.origin_product_id
            .as_ref()
            .map(TextValue::as_text)
            .filter(|id| !id.is_empty())
    }
}

/// Decoded `data` blob signed by the originating store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutPayload {
    pub order_id: Option<TextValue>,
    pub nonce: Option<TextValue>,
    pub hash: Option<String>,
    pub currency: Option<String>,
    pub amount: Option<TextValue>,
    pub return_url: Option<String>,
    pub cancel_url: Option<String>,
    pub store_name: Option<String>,
    pub products: Vec<ProductLine>,
}

/// The fields covered by the checkout signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub order_id: String,
    pub nonce: String,
    pub hash: String,
}

impl CheckoutPayload {
    /// Decode base64(JSON). Spaces are read as `+` to survive form-decoding
    /// of an unescaped query string.
    pub fn decode(encoded: &str) -> AppResult<Self> {
        let cleaned: String = encoded.trim().replace(' ', "+");
        let bytes = BASE64_STANDARD
            .decode(cleaned.as_bytes())
            .map_err(|_| AppError::Validation("Invalid checkout data format".to_string()))?;
        let value: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|_| AppError::Validation("Invalid checkout data format".to_string()))?;
        if !value.is_object() {
            return Err(AppError::Validation("Invalid checkout data format".to_string()));
        }
        serde_json::from_value(value)
            .map_err(|_| AppError::Validation("Invalid checkout data format".to_string()))
    }

    pub fn encode(&self) -> AppResult<String> {
        Ok(BASE64_STANDARD.encode(serde_json::to_vec(self)?))
    }

    /// Fixed order used by the gated test fixture
    pub fn test_fixture() -> Self {
        Self {
            order_id: Some("123".into()),
            currency: Some("USD".to_string()),
            amount: Some("10.00".into()),
            return_url: Some("https://example.com/success".to_string()),
            cancel_url: Some("https://example.com/cancel".to_string()),
            store_name: Some("Test Store".to_string()),
            ..Default::default()
        }
    }

    pub fn order_id(&self) -> String {
        self.order_id.as_ref().map(TextValue::as_text).unwrap_or_default()
    }

    pub fn amount(&self) -> Option<Decimal> {
        self.amount.as_ref().and_then(TextValue::as_decimal)
    }

    /// Signed fields, or `None` when any of them is missing or blank
    pub fn signed_request(&self) -> Option<SignedRequest> {
        let order_id = self.order_id();
        let nonce = self.nonce.as_ref().map(TextValue::as_text).unwrap_or_default();
        let hash = self.hash.as_deref().map(str::trim).unwrap_or_default().to_string();
        if order_id.is_empty() || nonce.is_empty() || hash.is_empty() {
            return None;
        }
        Some(SignedRequest { order_id, nonce, hash })
    }
}

/// Everything the checkout page needs; never persisted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutSession {
    pub order_id: String,
    pub currency: String,
    pub amount: String,
    pub return_url: String,
    pub cancel_url: String,
    pub store_name: String,
    pub create_url: String,
    pub capture_url: String,
    pub nonce: String,
    pub data: String,
    pub products: Vec<ProductLine>,
}

/// Proxy-side values merged into a session
#[derive(Debug, Clone)]
pub struct SessionLinks {
    pub create_url: String,
    pub capture_url: String,
    pub session_nonce: String,
}

impl CheckoutSession {
    /// Validate the payload's business fields and build the session
    pub fn assemble(payload: &CheckoutPayload, encoded: &str, links: SessionLinks) -> AppResult<Self> {
        let order_id = payload.order_id();
        if order_id.is_empty() {
            return Err(AppError::Validation("Missing required checkout fields".to_string()));
        }
        let amount = payload
            .amount()
            .filter(|a| *a > Decimal::ZERO)
            .ok_or_else(|| AppError::Validation("Missing required checkout fields".to_string()))?;
        let currency = money::normalize_currency(payload.currency.as_deref())?;

        Ok(Self {
            order_id,
            currency,
            amount: money::format_amount(amount),
            return_url: sanitize_url(payload.return_url.as_deref()),
            cancel_url: sanitize_url(payload.cancel_url.as_deref()),
            store_name: payload.store_name.as_deref().map(str::trim).unwrap_or_default().to_string(),
            create_url: links.create_url,
            capture_url: links.capture_url,
            nonce: links.session_nonce,
            data: encoded.to_string(),
            products: payload.products.clone(),
        })
    }
}

/// Keep only absolute http(s) URLs
fn sanitize_url(raw: Option<&str>) -> String {
    raw.and_then(|u| url::Url::parse(u.trim()).ok())
        .filter(|u| matches!(u.scheme(), "http" | "https"))
        .map(|u| u.to_string())
        .unwrap_or_default()
}
