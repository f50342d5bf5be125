//! HTTP utilities - Common helper functions
//!
//! Filters that inject shared state into route handlers.

use std::sync::Arc;

use warp::Filter;

use crate::application::services::OrderOrchestrator;
use crate::application::use_cases::HealthCheckUseCase;

/// Create a filter that injects the order orchestrator
pub fn with_orchestrator(
    orchestrator: Arc<OrderOrchestrator>,
) -> impl Filter<Extract = (Arc<OrderOrchestrator>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || orchestrator.clone())
}

/// Create a filter that injects the health use case
pub fn with_health_use_case(
    use_case: Arc<HealthCheckUseCase>,
) -> impl Filter<Extract = (Arc<HealthCheckUseCase>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || use_case.clone())
}

/// Optional `Content-Type` header
pub fn content_type() -> impl Filter<Extract = (Option<String>,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>("content-type")
}

/// Optional `Referer` header
pub fn referer() -> impl Filter<Extract = (Option<String>,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>("referer")
}
