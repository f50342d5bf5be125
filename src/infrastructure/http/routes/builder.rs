//! Route builder module
//!
//! This module contains the main route builder that orchestrates the creation
//! of all application routes.

use std::sync::Arc;

use warp::Filter;

use crate::application::services::OrderOrchestrator;
use crate::application::use_cases::HealthCheckUseCase;
use crate::infrastructure::http::handlers::handle_rejection;
use crate::infrastructure::http::routes::{HealthRoutes, PaymentRoutes};

/// Route builder that orchestrates the creation of all application routes
pub struct RouteBuilder;

impl RouteBuilder {
    /// Build all application routes
    pub fn build_routes(
        orchestrator: Arc<OrderOrchestrator>,
        health_use_case: Arc<HealthCheckUseCase>,
        max_request_size: usize,
    ) -> impl Filter<Extract = impl warp::Reply, Error = std::convert::Infallible> + Clone {
        let payment_routes = PaymentRoutes::create_routes(orchestrator, max_request_size);
        let health_route = HealthRoutes::create_health_route(health_use_case);

        payment_routes
            .or(health_route)
            .recover(handle_rejection)
    }
}
