//! HTTP responses module
//!
//! JSON replies for the REST endpoints and the HTML pages served to the
//! checkout iframe.

use serde::Serialize;
use serde_json::Value;
use warp::http::{header, HeaderValue, StatusCode};
use warp::reply::Response;
use warp::Reply;

use crate::domain::checkout::CheckoutSession;
use crate::shared::error::AppError;

const PAYPAL_SDK_URL: &str = "https://www.paypal.com/sdk/js";

/// Response formatter for HTTP responses
pub struct ResponseFormatter;

impl ResponseFormatter {
    /// Format a successful JSON response
    pub fn success<T: Serialize>(body: &T) -> Response {
        Self::secure(warp::reply::json(body).into_response())
    }

    /// Format an application error as the REST error object
    pub fn from_app_error(error: &AppError) -> Response {
        let reply = warp::reply::with_status(warp::reply::json(&error.to_json()), error.http_status_code());
        Self::secure(reply.into_response())
    }

    /// Format a plain JSON value with an explicit status
    pub fn json_with_status(body: &Value, status: StatusCode) -> Response {
        Self::secure(warp::reply::with_status(warp::reply::json(body), status).into_response())
    }

    /// Render the checkout page for an authenticated session
    pub fn checkout_page(session: &CheckoutSession, client_id: &str) -> Response {
        let config = match serde_json::to_string(session) {
            Ok(json) => escape_script_json(&json),
            Err(_) => return Self::error_page("Unable to render checkout", StatusCode::INTERNAL_SERVER_ERROR),
        };
        let sdk_src = format!(
            "{}?client-id={}&currency={}&intent=capture",
            PAYPAL_SDK_URL,
            escape_html(client_id),
            escape_html(&session.currency)
        );
        let title = if session.store_name.is_empty() {
            "Checkout".to_string()
        } else {
            format!("{} - Checkout", escape_html(&session.store_name))
        };

        let html = format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<script src="{sdk_src}" data-namespace="paypal"></script>
</head>
<body>
<div id="wc-paypal-proxy-checkout">
<div class="wc-paypal-proxy-summary">Order #{order_id}: {amount} {currency}</div>
<div id="paypal-button-container"></div>
<div id="wc-paypal-proxy-message" role="alert"></div>
</div>
<script>var wc_paypal_proxy_data = {config};</script>
</body>
</html>
"#,
            title = title,
            sdk_src = sdk_src,
            order_id = escape_html(&session.order_id),
            amount = escape_html(&session.amount),
            currency = escape_html(&session.currency),
            config = config,
        );
        Self::html(html, StatusCode::OK)
    }

    /// Render an HTML error page; the message is escaped
    pub fn error_page(message: &str, status: StatusCode) -> Response {
        let html = format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Payment Error</title>
</head>
<body>
<div class="wc-paypal-proxy-error">
<h2>Payment Error</h2>
<p>{}</p>
</div>
<script>if (window.parent !== window) {{ window.parent.postMessage({{type: "payment_failed"}}, "*"); }}</script>
</body>
</html>
"#,
            escape_html(message)
        );
        Self::html(html, status)
    }

    fn html(body: String, status: StatusCode) -> Response {
        let reply = warp::reply::with_status(warp::reply::html(body), status);
        Self::secure(reply.into_response())
    }

    /// Apply the headers every response carries
    pub fn secure(mut response: Response) -> Response {
        let headers = response.headers_mut();
        headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        headers.insert(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        );
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        response
    }
}

/// Make serialized JSON safe to embed inside a `<script>` element
pub fn escape_script_json(json: &str) -> String {
    json.replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
