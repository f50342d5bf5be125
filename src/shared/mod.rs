//! Shared utilities and common functionality
//!
//! This module contains error handling and logging helpers that are used
//! across the application.

pub mod error;
pub mod logging;

pub use error::{AppError, AppResult};
pub use logging::LoggingUtils;
