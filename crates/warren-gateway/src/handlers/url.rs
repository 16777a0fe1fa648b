use crate::error::{AppError, Result};
use crate::model::{CreateUrlRequest, CreateUrlResponse, DataResponse};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{debug, info};
use url::Url;

/// Accepts absolute `http`/`https` URLs that name a host.
///
/// The URL is stored as given and later sent back in a `Location` header,
/// so it must not carry control characters or surrounding whitespace, which
/// the parser would otherwise silently strip.
fn validate_url(raw: &str) -> Result<()> {
    if raw.trim().is_empty() {
        return Err(AppError::InvalidRequest("url must not be empty".to_string()));
    }
    if raw.trim() != raw {
        return Err(AppError::InvalidRequest(
            "url must not have leading or trailing whitespace".to_string(),
        ));
    }
    if raw.chars().any(char::is_control) {
        return Err(AppError::InvalidRequest(
            "url must not contain control characters".to_string(),
        ));
    }

    let parsed =
        Url::parse(raw).map_err(|e| AppError::InvalidRequest(format!("invalid url: {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::InvalidRequest(format!(
            "unsupported url scheme: {}",
            parsed.scheme()
        )));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(AppError::InvalidRequest("url must have a host".to_string()));
    }

    Ok(())
}

pub async fn create_url_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateUrlRequest>, JsonRejection>,
) -> Result<Json<DataResponse<CreateUrlResponse>>> {
    let Json(request) = payload?;
    validate_url(&request.url)?;

    let slug = state.registry().register_url(&request.url).await?;
    info!(slug = %slug, url = %request.url, "registered url");

    let short_url = state.public_base_url().map(|base| slug.to_url(base));
    Ok(Json(DataResponse {
        data: CreateUrlResponse {
            slug: slug.into_string(),
            short_url,
        },
    }))
}

pub async fn redirect_handler(
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> Result<Response> {
    if slug.chars().count() < state.slug_min_length() {
        debug!(slug = %slug, "slug is shorter than the minimum length");
        return Err(AppError::InvalidSlug(format!(
            "slug must be at least {} characters long",
            state.slug_min_length()
        )));
    }

    let url = state.registry().get_url(&slug).await?;
    Ok((StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, url)]).into_response())
}
