//! Route definitions for bundle delivery and raw asset files.
//!
//! ```text
//! GET    /assets/{file}                 deliver_bundle (scripts.js, styles.css)
//! GET    {static_mount}/*               files of the assets directory
//! ```

use axum::routing::get;
use axum::Router;
use tower_http::services::ServeDir;

use crate::config::ServerConfig;
use crate::handlers::delivery;
use crate::state::AppState;

/// Bundle delivery routes (root level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/assets/{file}", get(delivery::deliver_bundle))
}

/// Serves the assets directory verbatim at the configured static mount, the
/// target of re-anchored stylesheet URLs.
///
/// A root mount (`/`) cannot be nested, so it becomes the fallback service
/// and only answers paths no other route claims.
pub fn static_router(config: &ServerConfig) -> Router<AppState> {
    let files = ServeDir::new(&config.assets_dir);
    if config.static_mount.trim_matches('/').is_empty() {
        Router::new().fallback_service(files)
    } else {
        Router::new().nest_service(&config.static_mount, files)
    }
}
