//! Checkout page handler

use std::sync::Arc;

use warp::Reply;

use crate::application::services::OrderOrchestrator;
use crate::infrastructure::http::models::{CheckoutQuery, RequestContext};
use crate::infrastructure::http::responses::ResponseFormatter;

/// Serve the checkout page. Always answers with HTML, including on error.
pub async fn handle_checkout_request(
    query: CheckoutQuery,
    referer: Option<String>,
    orchestrator: Arc<OrderOrchestrator>,
) -> Result<impl Reply, warp::reject::Rejection> {
    let context = RequestContext::new("checkout", referer);
    context.log_start(None);

    let result = orchestrator
        .handle_checkout(&context.auth_context(), query.data.as_deref())
        .await;
    context.log_outcome(&result);

    let response = match result {
        Ok(session) => ResponseFormatter::checkout_page(&session, orchestrator.paypal_client_id()),
        Err(e) => ResponseFormatter::error_page(&e.public_message(), e.http_status_code()),
    };
    Ok(response)
}
