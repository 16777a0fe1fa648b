use std::any::Any;

use axum::body::Body;
use axum::http::Request;
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info_span, Span};

use crate::error::AppError;
use crate::handlers::{create_url_handler, health_handler, redirect_handler};
use crate::middleware::{log_elapsed_time, log_request_body};
use crate::state::AppState;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Optional trace-level logging around every request. Both are off by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouterOptions {
    /// Log method, URI, headers and body of each request.
    pub log_requests: bool,
    /// Log start, stop and duration of each request.
    pub log_elapsed_time: bool,
}

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        Self::router_with_options(state, RouterOptions::default())
    }

    pub fn router_with_options(state: AppState, options: RouterOptions) -> Router {
        // Outermost first: the request id exists before the span is opened.
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(CatchPanicLayer::custom(handle_panic));

        let mut router = Router::new()
            .route("/health", get(health_handler))
            .route("/", post(create_url_handler))
            .route("/{slug}", get(redirect_handler));

        // Both run inside the request span.
        if options.log_requests {
            router = router.layer(from_fn(log_request_body));
        }
        if options.log_elapsed_time {
            router = router.layer(from_fn(log_elapsed_time));
        }

        router.layer(middleware).with_state(state)
    }
}

fn make_request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id,
    )
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    error!(panic = message, "request handler panicked");

    AppError::Panic.into_response()
}
