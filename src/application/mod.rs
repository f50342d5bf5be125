//! Application layer - Use cases and application services
//!
//! This module contains the services that drive the payment flow and the
//! use cases exposed to the HTTP layer.

pub mod services;
pub mod use_cases;

pub use services::*;
pub use use_cases::*;
