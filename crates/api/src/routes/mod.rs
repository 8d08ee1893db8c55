pub mod assets;
pub mod health;
pub mod pages;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /pages/render                                    render page assets (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/pages", pages::router())
}
