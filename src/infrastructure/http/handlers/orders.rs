//! Create, capture and refund handlers

use std::sync::Arc;

use bytes::Bytes;
use warp::reply::Response;

use crate::application::services::{CaptureOrderRequest, CreateOrderRequest, OrderOrchestrator, RefundRequest};
use crate::domain::money::TextValue;
use crate::infrastructure::http::models::{decode_body, RequestContext};
use crate::infrastructure::http::responses::ResponseFormatter;
use crate::shared::error::AppResult;

fn respond<T: serde::Serialize>(context: &RequestContext, result: AppResult<T>) -> Response {
    context.log_outcome(&result);
    match result {
        Ok(body) => ResponseFormatter::success(&body),
        Err(e) => ResponseFormatter::from_app_error(&e),
    }
}

fn order_id_of(value: &Option<TextValue>) -> Option<String> {
    value.as_ref().map(TextValue::as_text)
}

pub async fn handle_create_order_request(
    content_type: Option<String>,
    body: Bytes,
    referer: Option<String>,
    orchestrator: Arc<OrderOrchestrator>,
) -> Result<Response, warp::reject::Rejection> {
    let context = RequestContext::new("create-order", referer);
    let result = match decode_body::<CreateOrderRequest>(content_type.as_deref(), &body) {
        Ok(request) => {
            context.log_start(order_id_of(&request.order_id).as_deref());
            orchestrator.handle_create_order(&context.auth_context(), request).await
        }
        Err(e) => Err(e),
    };
    Ok(respond(&context, result))
}

pub async fn handle_capture_order_request(
    content_type: Option<String>,
    body: Bytes,
    referer: Option<String>,
    orchestrator: Arc<OrderOrchestrator>,
) -> Result<Response, warp::reject::Rejection> {
    let context = RequestContext::new("capture-order", referer);
    let result = match decode_body::<CaptureOrderRequest>(content_type.as_deref(), &body) {
        Ok(request) => {
            context.log_start(order_id_of(&request.order_id).as_deref());
            orchestrator.handle_capture_order(&context.auth_context(), request).await
        }
        Err(e) => Err(e),
    };
    Ok(respond(&context, result))
}

pub async fn handle_refund_request(
    content_type: Option<String>,
    body: Bytes,
    referer: Option<String>,
    orchestrator: Arc<OrderOrchestrator>,
) -> Result<Response, warp::reject::Rejection> {
    let context = RequestContext::new("refund", referer);
    let result = match decode_body::<RefundRequest>(content_type.as_deref(), &body) {
        Ok(request) => {
            context.log_start(order_id_of(&request.order_id).as_deref());
            orchestrator.handle_refund(request).await
        }
        Err(e) => Err(e),
    };
    Ok(respond(&context, result))
}
