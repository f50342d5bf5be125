//! Money and currency helpers

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::shared::error::{AppError, AppResult};

pub const DEFAULT_CURRENCY: &str = "USD";

/// A scalar that stores may send either as a JSON string or a JSON number.
/// The original text is kept so signatures can be checked against exactly
/// what was transmitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextValue {
    Text(String),
    Number(serde_json::Number),
}

impl TextValue {
    pub fn as_text(&self) -> String {
        match self {
            TextValue::Text(s) => s.trim().to_string(),
            TextValue::Number(n) => n.to_string(),
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        parse_amount(&self.as_text())
    }
}

impl From<&str> for TextValue {
    fn from(value: &str) -> Self {
        TextValue::Text(value.to_string())
    }
}

/// Parse a monetary amount; scientific notation is accepted for JSON floats
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(raw).ok())
}

/// Round half away from zero to two places and render as `0.00`
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}", rounded)
}

/// Upper-case a three-letter currency code, defaulting to USD when absent
pub fn normalize_currency(raw: Option<&str>) -> AppResult<String> {
    let code = match raw.map(str::trim) {
        None | Some("") => return Ok(DEFAULT_CURRENCY.to_string()),
        Some(code) => code.to_ascii_uppercase(),
    };

    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code)
    } else {
        Err(AppError::Validation(format!("Invalid currency code: {}", code)))
    }
}
