//! Error handling module
//!
//! This module provides centralized error handling for the application.

use serde_json::Value;
use thiserror::Error;
use warp::http::StatusCode;

/// Application error types
#[derive(Error, Debug, Clone)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or malformed required field
    #[error("{0}")]
    Validation(String),

    /// Bad signature, unknown caller domain, nonce ceiling reached
    #[error("{0}")]
    Auth(String),

    /// Missing or stale checkout session nonce
    #[error("Invalid nonce")]
    InvalidNonce,

    /// Payment provider call failed or returned an unexpected shape
    #[error("{0}")]
    Gateway(String),

    /// Webhook delivery failed; logged, never surfaced to a caller
    #[error("Webhook delivery failed: {0}")]
    Notification(String),

    #[error("JSON serialization error: {0}")]
    Json(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code used in JSON error bodies
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config_error",
            AppError::Validation(_) => "invalid_request",
            AppError::Auth(_) => "unauthorized",
            AppError::InvalidNonce => "invalid_nonce",
            AppError::Gateway(_) => "gateway_error",
            AppError::Notification(_) => "notification_error",
            AppError::Json(_) => "invalid_json",
            AppError::Storage(_) => "storage_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Get HTTP status code for this error
    pub fn http_status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Json(_) | AppError::Gateway(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) | AppError::InvalidNonce => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message that is safe to show to the caller
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::Auth(msg) | AppError::Gateway(msg) => msg.clone(),
            AppError::InvalidNonce => "Invalid nonce".to_string(),
            AppError::Json(_) => "Invalid request body".to_string(),
            _ => "Internal error".to_string(),
        }
    }

    /// Convert to the JSON error object returned by the REST endpoints
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "code": self.code(),
            "message": self.public_message(),
            "data": { "status": self.http_status_code().as_u16() }
        })
    }
}

/// Application result type
pub type AppResult<T> = Result<T, AppError>;

impl warp::reject::Reject for AppError {}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Json(err.to_string())
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Gateway("Payment provider request timed out".to_string())
        } else {
            AppError::Gateway(format!("Payment provider request failed: {}", err.without_url()))
        }
    }
}
