//! Optional request logging, enabled per router through [`RouterOptions`].
//!
//! [`RouterOptions`]: crate::app::RouterOptions

use axum::body::{to_bytes, Body};
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use jiff::Timestamp;
use std::time::Instant;
use tracing::trace;

use crate::error::{AppError, Result};

/// Upper bound on a request body buffered for logging.
pub const MAX_LOGGED_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Logs method, URI, headers and body of every request at trace level.
///
/// The body is buffered and handed on unchanged. A body that cannot be read
/// fails the request with 400.
pub async fn log_request_body(request: Request, next: Next) -> Result<Response> {
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, MAX_LOGGED_BODY_BYTES)
        .await
        .map_err(|e| AppError::InvalidRequest(format!("failed to read request body: {e}")))?;

    trace!(
        method = %parts.method,
        uri = %parts.uri,
        headers = ?parts.headers,
        request_body = %String::from_utf8_lossy(&bytes),
        "request received"
    );

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

/// Logs start, stop and duration of every request at trace level.
pub async fn log_elapsed_time(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start_time = Timestamp::now();
    let started = Instant::now();

    let response = next.run(request).await;

    trace!(
        %start_time,
        stop_time = %Timestamp::now(),
        duration = ?started.elapsed(),
        %method,
        %uri,
        status = response.status().as_u16(),
        "request handled"
    );
    response
}
