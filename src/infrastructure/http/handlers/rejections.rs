//! Turns warp rejections into the REST error shape

use std::convert::Infallible;

use tracing::debug;
use warp::http::StatusCode;
use warp::reply::Response;

use crate::infrastructure::http::responses::ResponseFormatter;
use crate::shared::error::AppError;

pub async fn handle_rejection(err: warp::Rejection) -> Result<Response, Infallible> {
    if let Some(app_error) = err.find::<AppError>() {
        return Ok(ResponseFormatter::from_app_error(app_error));
    }

    let (status, code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "rest_no_route", "No route was found matching the URL and request method")
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", "Request body is too large")
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, "length_required", "Content-Length header is required")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed", "Method not allowed")
    } else if err.find::<warp::reject::InvalidHeader>().is_some() {
        (StatusCode::BAD_REQUEST, "invalid_request", "Invalid request header")
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        (StatusCode::BAD_REQUEST, "invalid_request", "Invalid query string")
    } else {
        debug!(rejection = ?err, "Unhandled rejection");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "Internal error")
    };

    let body = serde_json::json!({
        "code": code,
        "message": message,
        "data": { "status": status.as_u16() }
    });
    Ok(ResponseFormatter::json_with_status(&body, status))
}
