//! Route definitions for the page-render phase.
//!
//! ```text
//! POST   /render                        render_page
//! ```

use axum::routing::post;
use axum::Router;

use crate::handlers::pages;
use crate::state::AppState;

/// Page routes, mounted at `/api/v1/pages`.
pub fn router() -> Router<AppState> {
    Router::new().route("/render", post(pages::render_page))
}
