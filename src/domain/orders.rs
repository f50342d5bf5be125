//! Order-side domain model: line items, breakdown reconciliation and the
//! per-order state machine.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::checkout::ProductLine;
use crate::domain::money::TextValue;

/// Longest item name the payment provider accepts
pub const MAX_ITEM_NAME_CHARS: usize = 127;

/// Prefix applied to origin-store product ids used as SKU fallback
pub const ORIGIN_SKU_PREFIX: &str = "A-";

/// Provider-facing line item
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub sku: String,
}

impl LineItem {
    /// Build from a store product line. Lines without a name, a positive
    /// quantity or a positive price are skipped.
    pub fn from_product(product: &ProductLine, resolved_name: Option<String>) -> Option<Self> {
        let name = resolved_name
            .or_else(|| product.name.clone())
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())?;

        let quantity = product
            .quantity
            .as_ref()
            .and_then(TextValue::as_decimal)
            .filter(|q| *q > Decimal::ZERO && q.fract().is_zero())
            .and_then(|q| q.to_u32())?;

        let unit_price = product
            .price
            .as_ref()
            .and_then(TextValue::as_decimal)
            .map(to_cents)
            .filter(|p| *p > Decimal::ZERO)?;

        let sku = match (product.mapped_id(), product.origin_id()) {
            (Some(mapped), _) => mapped,
            (None, Some(origin)) => format!("{}{}", ORIGIN_SKU_PREFIX, origin),
            (None, None) => String::new(),
        };

        Some(Self {
            name: truncate_chars(&name, MAX_ITEM_NAME_CHARS),
            quantity,
            unit_price,
            sku,
        })
    }

    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Round to the two decimal places sent on the wire
fn to_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

/// Amount breakdown sent alongside line items
#[derive(Debug, Clone, PartialEq)]
pub struct Breakdown {
    pub item_total: Decimal,
    /// Residual between the authenticated amount and the item total,
    /// present only when strictly positive
    pub shipping: Option<Decimal>,
}

/// Split the authenticated `amount` into item total and shipping. The amount
/// itself is never derived from the items.
pub fn reconcile(amount: Decimal, items: &[LineItem]) -> Breakdown {
    let item_total: Decimal = items.iter().map(LineItem::line_total).sum();
    let residual = to_cents(amount - item_total);
    Breakdown {
        item_total,
        shipping: (residual > Decimal::ZERO).then_some(residual),
    }
}

/// Provider order handle returned by create
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteOrder {
    pub id: String,
    pub status: String,
}

/// Provider capture returned by capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteCapture {
    /// Capture id; this is the transaction id reported to the store
    pub id: String,
    /// Provider order id the capture belongs to
    pub order_id: String,
    pub status: String,
}

/// Provider refund returned by refund
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRefund {
    pub id: String,
    pub status: String,
}

/// Lifecycle of one order inside a single request chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderState {
    Received,
    Authenticated,
    RemoteOrderCreated,
    Captured,
    Notified,
    Error,
}

impl OrderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Received => "received",
            OrderState::Authenticated => "authenticated",
            OrderState::RemoteOrderCreated => "remote_order_created",
            OrderState::Captured => "captured",
            OrderState::Notified => "notified",
            OrderState::Error => "error",
        }
    }

    /// Forward-only transitions; `Error` is reachable from anywhere and absorbing
    pub fn can_advance_to(&self, next: OrderState) -> bool {
        use OrderState::*;
        match (self, next) {
            (Error, _) => false,
            (_, Error) => true,
            (Received, Authenticated) => true,
            (Authenticated, RemoteOrderCreated) => true,
            // capture and refund calls authenticate then talk to an existing remote order
            (Authenticated, Captured) => true,
            (Authenticated, Notified) => true,
            (RemoteOrderCreated, Captured) => true,
            (Captured, Notified) => true,
            _ => false,
        }
    }
}

/// Tracks the state of one order while a handler runs
#[derive(Debug)]
pub struct OrderFlow {
    order_id: String,
    state: OrderState,
}

impl OrderFlow {
    pub fn start(order_id: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            state: OrderState::Received,
        }
    }

    /// Move to `next`, ignoring illegal transitions. Returns whether the move happened.
    pub fn advance(&mut self, next: OrderState) -> bool {
        if !self.state.can_advance_to(next) {
            return false;
        }
        debug!(
            order_id = %self.order_id,
            from = self.state.as_str(),
            to = next.as_str(),
            "Order state transition"
        );
        self.state = next;
        true
    }

    pub fn fail(&mut self) {
        self.advance(OrderState::Error);
    }
}
