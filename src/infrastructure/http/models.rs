//! HTTP models - Infrastructure concerns
//!
//! Request context for logging and the body decoding shared by the POST
//! endpoints.

use std::time::Instant;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::application::services::AuthContext;
use crate::shared::error::{AppError, AppResult};
use crate::shared::LoggingUtils;

/// Query string of `GET /checkout`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutQuery {
    pub data: Option<String>,
}

/// HTTP request context for tracking and logging (infrastructure concern)
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique request ID
    pub request_id: String,

    /// Endpoint name used in log lines
    pub endpoint: &'static str,

    /// Referer header, if sent
    pub referer: Option<String>,

    started: Instant,
}

impl RequestContext {
    pub fn new(endpoint: &'static str, referer: Option<String>) -> Self {
        Self {
            request_id: LoggingUtils::generate_request_id(),
            endpoint,
            referer,
            started: Instant::now(),
        }
    }

    pub fn auth_context(&self) -> AuthContext {
        AuthContext::from_referer(self.referer.clone())
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    pub fn log_start(&self, order_id: Option<&str>) {
        LoggingUtils::log_request(&self.request_id, self.endpoint, order_id, self.referer.as_deref());
    }

    pub fn log_outcome<T>(&self, result: &AppResult<T>) {
        match result {
            Ok(_) => LoggingUtils::log_success(&self.request_id, self.endpoint, self.elapsed_ms()),
            Err(e) => LoggingUtils::log_error(&self.request_id, self.endpoint, e, self.elapsed_ms()),
        }
    }
}

/// Decode a POST body sent either as JSON or as a urlencoded form
pub fn decode_body<T: DeserializeOwned>(content_type: Option<&str>, body: &Bytes) -> AppResult<T> {
    let is_json = content_type
        .map(|ct| ct.to_ascii_lowercase().contains("json"))
        .unwrap_or_else(|| body.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'{'));

    if body.iter().all(u8::is_ascii_whitespace) {
        return serde_json::from_value(serde_json::Value::Object(Default::default()))
            .map_err(|_| AppError::Validation("Missing request body".to_string()));
    }

    if is_json {
        return serde_json::from_slice(body).map_err(AppError::from);
    }

    let fields: serde_json::Map<String, serde_json::Value> = url::form_urlencoded::parse(body)
        .map(|(k, v)| (k.into_owned(), serde_json::Value::String(v.into_owned())))
        .collect();
    serde_json::from_value(serde_json::Value::Object(fields))
        .map_err(|e| AppError::Validation(format!("Invalid form body: {}", e)))
}
