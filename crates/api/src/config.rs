use assetline_core::delivery::rewrite::UrlMapping;
use assetline_core::loader::{LoaderConfig, DEFAULT_BASE_URL};

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Path of the registration manifest (default: `assets.json`).
    pub manifest_path: String,
    /// Directory local asset sources are resolved against (default: `.`).
    pub assets_dir: String,
    /// Explicit base URL for delivery links; derived when unset.
    pub loader_base_url: Option<String>,
    /// URL path serving `assets_dir` verbatim (default: `/static`).
    pub static_mount: String,
    pub caching_enabled: bool,
    pub compression_enabled: bool,
    pub force_gzip: bool,
    /// A transport layer compresses responses; the pipeline then skips its
    /// own compression.
    pub transport_compression: bool,
    /// Lifetime of a stored delivery record in seconds (default: `300`).
    pub session_ttl_secs: u64,
    /// Fetch `http(s)://` sources (default: `true`).
    pub remote_sources: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: vec!["http://localhost:5173".to_string()],
            request_timeout_secs: 30,
            manifest_path: "assets.json".to_string(),
            assets_dir: ".".to_string(),
            loader_base_url: None,
            static_mount: "/static".to_string(),
            caching_enabled: true,
            compression_enabled: true,
            force_gzip: false,
            transport_compression: false,
            session_ttl_secs: 300,
            remote_sources: true,
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}

fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("{name} must be true or false")),
        Err(_) => default,
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                    |
    /// |--------------------------|----------------------------|
    /// | `HOST`                   | `0.0.0.0`                  |
    /// | `PORT`                   | `3000`                     |
    /// | `CORS_ORIGINS`           | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                       |
    /// | `ASSET_MANIFEST`         | `assets.json`              |
    /// | `ASSETS_DIR`             | `.`                        |
    /// | `LOADER_BASE_URL`        | derived (`/assets`)        |
    /// | `STATIC_MOUNT`           | `/static`                  |
    /// | `CACHING_ENABLED`        | `true`                     |
    /// | `COMPRESSION_ENABLED`    | `true`                     |
    /// | `FORCE_GZIP_COMPRESSION` | `false`                    |
    /// | `TRANSPORT_COMPRESSION`  | `false`                    |
    /// | `SESSION_TTL_SECS`       | `300`                      |
    /// | `REMOTE_SOURCES`         | `true`                     |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port: u16 = env_or("PORT", "3000")
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = env_or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", "30")
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let session_ttl_secs: u64 = env_or("SESSION_TTL_SECS", "300")
            .parse()
            .expect("SESSION_TTL_SECS must be a valid u64");

        let loader_base_url = std::env::var("LOADER_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let static_mount = format!("/{}", env_or("STATIC_MOUNT", "/static").trim_matches('/'));

        Self {
            host: env_or("HOST", "0.0.0.0"),
            port,
            cors_origins,
            request_timeout_secs,
            manifest_path: env_or("ASSET_MANIFEST", &defaults.manifest_path),
            assets_dir: env_or("ASSETS_DIR", &defaults.assets_dir),
            loader_base_url,
            static_mount,
            caching_enabled: env_flag("CACHING_ENABLED", defaults.caching_enabled),
            compression_enabled: env_flag("COMPRESSION_ENABLED", defaults.compression_enabled),
            force_gzip: env_flag("FORCE_GZIP_COMPRESSION", defaults.force_gzip),
            transport_compression: env_flag(
                "TRANSPORT_COMPRESSION",
                defaults.transport_compression,
            ),
            session_ttl_secs,
            remote_sources: env_flag("REMOTE_SOURCES", defaults.remote_sources),
        }
    }

    /// Configuration handed to each per-render loader.
    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            caching_enabled: self.caching_enabled,
            compression_enabled: self.compression_enabled,
            force_gzip: self.force_gzip,
            assets_dir: self.assets_dir.clone(),
            base_url: self.loader_base_url.clone(),
        }
    }

    /// URL layout used to re-anchor stylesheet URLs.
    pub fn url_mapping(&self) -> UrlMapping {
        let base = self.loader_base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        UrlMapping {
            assets_dir: self.assets_dir.clone(),
            static_mount: self.static_mount.clone(),
            endpoint_dir: url_path(base).to_string(),
        }
    }
}

/// Path component of an absolute URL, or the input when it is already a path.
fn url_path(url: &str) -> &str {
    match url.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("/", |idx| &rest[idx..]),
        None => url,
    }
}
