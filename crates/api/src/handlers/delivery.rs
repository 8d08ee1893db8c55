//! Handler for the bundle delivery phase.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::{ACCEPT_ENCODING, IF_MODIFIED_SINCE, IF_NONE_MATCH};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use assetline_core::delivery::{self, DeliveryRequest, DeliveryStatus};
use assetline_core::error::CoreError;
use assetline_core::types::AssetType;

use crate::error::{AppError, AppResult};
use crate::session::session_token;
use crate::state::AppState;

fn header_str<'a>(headers: &'a HeaderMap, name: axum::http::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// GET /assets/{file}
///
/// Serves `scripts.js` or `styles.css` from the delivery record stored by
/// the caller's last page render. Each bundle can be fetched once per
/// render; the query string (the fingerprint) only busts browser caches.
pub async fn deliver_bundle(
    State(state): State<AppState>,
    Path(file): Path<String>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let asset_type = AssetType::from_bundle_file(&file)
        .ok_or_else(|| AppError::NotFound(format!("No bundle named '{file}'")))?;

    let token = session_token(&headers).ok_or(CoreError::MissingDeliveryState)?;
    let slot = state
        .sessions
        .take(&token, asset_type)
        .await
        .ok_or(CoreError::MissingDeliveryState)?;

    let request = DeliveryRequest {
        accept_encoding: header_str(&headers, ACCEPT_ENCODING),
        if_modified_since: header_str(&headers, IF_MODIFIED_SINCE),
        if_none_match: header_str(&headers, IF_NONE_MATCH),
        transport_compresses: state.config.transport_compression,
    };

    let delivered = delivery::deliver(
        state.sources.as_ref(),
        &slot,
        &state.config.url_mapping(),
        &request,
        chrono::Utc::now(),
    )
    .await?;

    let status = match delivered.status {
        DeliveryStatus::Ok => StatusCode::OK,
        DeliveryStatus::NotModified => StatusCode::NOT_MODIFIED,
    };

    let mut builder = Response::builder().status(status);
    for (name, value) in &delivered.headers {
        builder = builder.header(*name, value.as_str());
    }
    builder
        .body(Body::from(delivered.body))
        .map_err(|e| AppError::InternalError(e.to_string()))
}
