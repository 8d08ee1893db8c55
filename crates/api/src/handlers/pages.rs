//! Handler for the page-render phase.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use assetline_core::emitter::HtmlTagEmitter;
use assetline_core::loader::AssetLoader;
use assetline_core::page::PageContext;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::session::{new_session_token, session_cookie, session_token};
use crate::state::AppState;

/// POST /api/v1/pages/render
///
/// Replays the manifest into a fresh loader, selects the assets for the
/// described page and stores the delivery record under the caller's session.
/// Mints a session cookie when the request carries none. A body that is not
/// a page context is rejected with `BAD_REQUEST`.
pub async fn render_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<PageContext>, JsonRejection>,
) -> AppResult<Response> {
    let Json(ctx) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let (token, minted) = match session_token(&headers) {
        Some(token) => (token, false),
        None => (new_session_token(), true),
    };

    let mut loader = AssetLoader::new(state.config.loader_config());
    state.manifest.apply(&mut loader)?;

    let mut emitter = HtmlTagEmitter::new();
    let delivery = loader.finalize(&ctx, &mut emitter);
    state.sessions.put(&token, delivery).await;

    let page = emitter.finish();
    tracing::debug!(
        bundles = page.bundles.len(),
        external = ?page.external_handles,
        new_session = minted,
        "Rendered page assets",
    );

    let mut response = Json(DataResponse { data: page }).into_response();
    if minted {
        let cookie = HeaderValue::from_str(&session_cookie(&token))
            .map_err(|e| AppError::InternalError(e.to_string()))?;
        response.headers_mut().insert(SET_COOKIE, cookie);
    }
    Ok(response)
}
