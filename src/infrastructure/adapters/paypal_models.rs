//! PayPal REST wire types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::money::format_amount;
use crate::domain::orders::{reconcile, LineItem, RemoteCapture, RemoteOrder, RemoteRefund};
use crate::shared::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Money {
    pub currency_code: String,
    pub value: String,
}

impl Money {
    pub fn new(currency: &str, amount: Decimal) -> Self {
        Self {
            currency_code: currency.to_string(),
            value: format_amount(amount),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmountBreakdown {
    pub item_total: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderAmount {
    pub currency_code: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<AmountBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItem {
    pub name: String,
    pub unit_amount: Money,
    pub quantity: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sku: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseUnit {
    pub reference_id: String,
    pub description: String,
    pub amount: OrderAmount,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationContext {
    pub shipping_preference: &'static str,
    pub user_action: &'static str,
    pub return_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRequest {
    pub intent: &'static str,
    pub purchase_units: Vec<PurchaseUnit>,
    pub application_context: ApplicationContext,
}

/// Build the create-order body. The top-level amount is always `amount`;
/// items only contribute the breakdown.
pub fn build_order_request(
    order_id: &str,
    amount: Decimal,
    currency: &str,
    items: &[LineItem],
    proxy_url: &str,
) -> OrderRequest {
    let breakdown = (!items.is_empty()).then(|| {
        let split = reconcile(amount, items);
        AmountBreakdown {
            item_total: Money::new(currency, split.item_total),
            shipping: split.shipping.map(|s| Money::new(currency, s)),
        }
    });

    let items = items
        .iter()
        .map(|item| OrderItem {
            name: item.name.clone(),
            unit_amount: Money::new(currency, item.unit_price),
            quantity: item.quantity.to_string(),
            sku: item.sku.clone(),
        })
        .collect();

    OrderRequest {
        intent: "CAPTURE",
        purchase_units: vec![PurchaseUnit {
            reference_id: order_id.to_string(),
            description: format!("Order #{}", order_id),
            amount: OrderAmount {
                currency_code: currency.to_string(),
                value: format_amount(amount),
                breakdown,
            },
            items,
        }],
        application_context: ApplicationContext {
            shipping_preference: "NO_SHIPPING",
            user_action: "PAY_NOW",
            return_url: proxy_url.to_string(),
            cancel_url: proxy_url.to_string(),
        },
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefundRequest {
    pub amount: Money,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub note_to_payer: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

/// `{id, status}` shape shared by order and refund responses
#[derive(Debug, Deserialize)]
pub struct ResourceResponse {
    pub id: String,
    #[serde(default)]
    pub status: String,
}

impl From<ResourceResponse> for RemoteOrder {
    fn from(r: ResourceResponse) -> Self {
        RemoteOrder { id: r.id, status: r.status }
    }
}

impl From<ResourceResponse> for RemoteRefund {
    fn from(r: ResourceResponse) -> Self {
        RemoteRefund { id: r.id, status: r.status }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CaptureRecord {
    id: String,
    status: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Payments {
    captures: Vec<CaptureRecord>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CapturedUnit {
    payments: Option<Payments>,
}

#[derive(Debug, Deserialize)]
pub struct CaptureResponse {
    id: String,
    #[serde(default)]
    purchase_units: Vec<CapturedUnit>,
}

impl CaptureResponse {
    /// First capture of the first purchase unit
    pub fn into_capture(self) -> AppResult<RemoteCapture> {
        let capture = self
            .purchase_units
            .into_iter()
            .next()
            .and_then(|unit| unit.payments)
            .and_then(|payments| payments.captures.into_iter().next())
            .filter(|capture| !capture.id.is_empty())
            .ok_or_else(|| AppError::Gateway("Invalid capture response".to_string()))?;

        Ok(RemoteCapture {
            id: capture.id,
            order_id: self.id,
            status: capture.status,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorDetail {
    issue: String,
    description: String,
}

/// PayPal error body
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ErrorResponse {
    name: String,
    message: String,
    details: Vec<ErrorDetail>,
}

impl ErrorResponse {
    /// Human-readable message suitable for passing back to the caller
    pub fn describe(&self) -> String {
        let detail = self
            .details
            .iter()
            .map(|d| if d.description.is_empty() { d.issue.as_str() } else { d.description.as_str() })
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("; ");

        match (self.message.is_empty(), detail.is_empty()) {
            (false, false) => format!("{} {}", self.message, detail),
            (false, true) => self.message.clone(),
            (true, false) => detail,
            (true, true) if !self.name.is_empty() => self.name.clone(),
            (true, true) => "Payment provider returned an error".to_string(),
        }
    }
}
