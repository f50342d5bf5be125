//! Logging utilities module
//!
//! This module provides centralized logging functionality and utilities.

use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info, warn};

use crate::config::app_config::LoggingConfig;

/// Logging utilities for the application
pub struct LoggingUtils;

impl LoggingUtils {
    /// Initialize logging with the specified configuration
    pub fn initialize(logging: &LoggingConfig) -> crate::Result<()> {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&logging.level));

        let builder = fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false);

        let result = if logging.format.eq_ignore_ascii_case("json") {
            tracing::subscriber::set_global_default(builder.json().finish())
        } else {
            tracing::subscriber::set_global_default(builder.finish())
        };

        result.map_err(|e| {
            crate::shared::error::AppError::Internal(format!("Failed to initialize logging: {}", e))
        })
    }

    /// Log an inbound request with structured data
    pub fn log_request(request_id: &str, endpoint: &str, order_id: Option<&str>, referer: Option<&str>) {
        info!(
            request_id = %request_id,
            endpoint = %endpoint,
            order_id = order_id,
            referer = referer,
            "Processing request"
        );
    }

    /// Log a successful response
    pub fn log_success(request_id: &str, endpoint: &str, duration_ms: u64) {
        info!(
            request_id = %request_id,
            endpoint = %endpoint,
            duration_ms = %duration_ms,
            "Request completed successfully"
        );
    }

    /// Log an error response
    pub fn log_error(request_id: &str, endpoint: &str, error: &crate::shared::error::AppError, duration_ms: u64) {
        error!(
            request_id = %request_id,
            endpoint = %endpoint,
            error = %error,
            duration_ms = %duration_ms,
            "Request failed"
        );
    }

    /// Log security events
    pub fn log_security_event(event_type: &str, details: &str, order_id: &str) {
        warn!(
            event_type = %event_type,
            details = %details,
            order_id = %order_id,
            "Security event detected"
        );
    }

    /// Generate a unique request ID
    pub fn generate_request_id() -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();

        format!("req_{:x}", now)
    }
}
