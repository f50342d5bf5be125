//! Health check handler module
//!
//! This module contains the health check endpoint handler for monitoring system status.

use std::sync::Arc;

use warp::Reply;

use crate::application::use_cases::HealthCheckUseCase;
use crate::infrastructure::http::responses::ResponseFormatter;

/// Handle health check requests
pub async fn handle_health_request(
    health_use_case: Arc<HealthCheckUseCase>,
) -> Result<impl Reply, warp::reject::Rejection> {
    let health_response = health_use_case.execute();
    Ok(ResponseFormatter::success(&health_response))
}
