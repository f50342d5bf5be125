use crate::domain::{health::HealthResponse, ports::PaymentGateway};
use std::sync::Arc;

/// Health check use case
pub struct HealthCheckUseCase {
    gateway: Arc<dyn PaymentGateway>,
}

impl HealthCheckUseCase {
    /// Create a new health check use case
    pub fn new(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { gateway }
    }

    /// Report liveness and whether payments can be taken
    pub fn execute(&self) -> HealthResponse {
        HealthResponse::new(self.gateway.is_configured())
    }
}
