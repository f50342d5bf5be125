//! Payment proxy routes under `/wc-paypal-proxy/v1`

use std::sync::Arc;

use warp::Filter;

use crate::application::services::OrderOrchestrator;
use crate::infrastructure::http::handlers::{
    handle_capture_order_request, handle_checkout_request, handle_create_order_request, handle_refund_request,
};
use crate::infrastructure::http::models::CheckoutQuery;
use crate::infrastructure::http::utils::{content_type, referer, with_orchestrator};

pub struct PaymentRoutes;

impl PaymentRoutes {
    pub fn create_routes(
        orchestrator: Arc<OrderOrchestrator>,
        max_request_size: usize,
    ) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        let base = warp::path("wc-paypal-proxy").and(warp::path("v1"));

        let checkout = base
            .clone()
            .and(warp::path("checkout"))
            .and(warp::path::end())
            .and(warp::get())
            .and(warp::query::<CheckoutQuery>())
            .and(referer())
            .and(with_orchestrator(orchestrator.clone()))
            .and_then(handle_checkout_request);

        let create = base
            .clone()
            .and(warp::path("create-order"))
            .and(Self::post_body(max_request_size))
            .and(with_orchestrator(orchestrator.clone()))
            .and_then(handle_create_order_request);

        let capture = base
            .clone()
            .and(warp::path("capture-order"))
            .and(Self::post_body(max_request_size))
            .and(with_orchestrator(orchestrator.clone()))
            .and_then(handle_capture_order_request);

        let refund = base
            .and(warp::path("refund"))
            .and(Self::post_body(max_request_size))
            .and(with_orchestrator(orchestrator))
            .and_then(handle_refund_request);

        checkout.or(create).or(capture).or(refund)
    }

    /// `POST` with content type, raw body and referer, in that order
    fn post_body(
        max_request_size: usize,
    ) -> impl Filter<Extract = (Option<String>, bytes::Bytes, Option<String>), Error = warp::Rejection> + Clone {
        warp::path::end()
            .and(warp::post())
            .and(content_type())
            .and(warp::body::content_length_limit(max_request_size as u64))
            .and(warp::body::bytes())
            .and(referer())
    }
}
