use std::sync::Arc;

use assetline_core::delivery::sources::SourceResolver;
use assetline_core::manifest::Manifest;
use assetline_core::session::SessionStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Registration directives replayed into a fresh loader per render.
    pub manifest: Arc<Manifest>,
    /// Delivery records handed from page renders to bundle requests.
    pub sessions: Arc<SessionStore>,
    /// Reader for local and remote asset sources.
    pub sources: Arc<SourceResolver>,
}

impl AppState {
    pub fn new(config: ServerConfig, manifest: Manifest) -> Self {
        let sessions = SessionStore::new(std::time::Duration::from_secs(config.session_ttl_secs));
        let sources = SourceResolver::new(config.remote_sources);
        Self {
            config: Arc::new(config),
            manifest: Arc::new(manifest),
            sessions: Arc::new(sessions),
            sources: Arc::new(sources),
        }
    }
}
