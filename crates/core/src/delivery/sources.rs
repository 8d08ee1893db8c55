//! Reading asset sources from disk or over HTTP.
//!
//! Reads are attempted once; a failure is reported to the caller, which
//! decides how it shows up in the bundle.

use std::future::Future;
use std::io::ErrorKind;

use chrono::{DateTime, Utc};

use crate::registry::is_remote_source;

/// Content of one source plus its modification time, when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceContent {
    pub body: String,
    pub modified: Option<DateTime<Utc>>,
}

/// Why a source could not be read.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("source not found: {0}")]
    NotFound(String),

    #[error("failed to read {src}: {reason}")]
    Unreadable { src: String, reason: String },
}

/// Reads the content of a registered source path or URL.
pub trait SourceReader: Send + Sync {
    fn read(&self, src: &str) -> impl Future<Output = Result<SourceContent, SourceError>> + Send;
}

// ---------------------------------------------------------------------------
// Filesystem
// ---------------------------------------------------------------------------

/// Reads local files. Invalid UTF-8 is replaced rather than rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSourceReader;

impl SourceReader for FileSourceReader {
    async fn read(&self, src: &str) -> Result<SourceContent, SourceError> {
        let bytes = tokio::fs::read(src).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => SourceError::NotFound(src.to_string()),
            _ => SourceError::Unreadable {
                src: src.to_string(),
                reason: e.to_string(),
            },
        })?;

        let modified = tokio::fs::metadata(src)
            .await
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from);

        Ok(SourceContent {
            body: String::from_utf8_lossy(&bytes).into_owned(),
            modified,
        })
    }
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// Fetches `http://` / `https://` sources. Remote sources carry no
/// modification time.
#[derive(Debug, Clone, Default)]
pub struct RemoteSourceReader {
    client: reqwest::Client,
}

impl RemoteSourceReader {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl SourceReader for RemoteSourceReader {
    async fn read(&self, src: &str) -> Result<SourceContent, SourceError> {
        let unreadable = |reason: String| SourceError::Unreadable {
            src: src.to_string(),
            reason,
        };

        let response = self
            .client
            .get(src)
            .send()
            .await
            .map_err(|e| unreadable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(src.to_string()));
        }
        let response = response
            .error_for_status()
            .map_err(|e| unreadable(e.to_string()))?;

        let body = response.text().await.map_err(|e| unreadable(e.to_string()))?;
        Ok(SourceContent {
            body,
            modified: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Sends remote URLs to the HTTP reader (when enabled) and everything else
/// to the filesystem reader.
#[derive(Debug, Clone, Default)]
pub struct SourceResolver {
    files: FileSourceReader,
    remote: Option<RemoteSourceReader>,
}

impl SourceResolver {
    /// Resolver with remote fetching enabled or disabled.
    pub fn new(remote_sources: bool) -> Self {
        if remote_sources {
            Self::with_remote(reqwest::Client::new())
        } else {
            Self::local_only()
        }
    }

    /// Resolver that reads local files only.
    pub fn local_only() -> Self {
        Self::default()
    }

    /// Resolver that also fetches remote sources with `client`.
    pub fn with_remote(client: reqwest::Client) -> Self {
        Self {
            files: FileSourceReader,
            remote: Some(RemoteSourceReader::new(client)),
        }
    }
}

impl SourceReader for SourceResolver {
    async fn read(&self, src: &str) -> Result<SourceContent, SourceError> {
        if !is_remote_source(src) {
            return self.files.read(src).await;
        }
        match &self.remote {
            Some(remote) => remote.read(src).await,
            None => Err(SourceError::Unreadable {
                src: src.to_string(),
                reason: "remote sources are disabled".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[tokio::test]
    async fn reads_existing_file_with_mtime() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("a.css");
        std::fs::write(&path, "a { color: red }").expect("write");

        let content = FileSourceReader
            .read(path.to_str().expect("path"))
            .await
            .expect("read");
        assert_eq!(content.body, "a { color: red }");
        assert!(content.modified.is_some());
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("nope.js");
        assert_matches!(
            FileSourceReader.read(path.to_str().expect("path")).await,
            Err(SourceError::NotFound(_))
        );
    }

    #[tokio::test]
    async fn directory_is_unreadable() {
        let dir = tempfile::tempdir().expect("create temp dir");
        assert_matches!(
            FileSourceReader.read(dir.path().to_str().expect("path")).await,
            Err(SourceError::Unreadable { .. })
        );
    }

    /// Serves `/lib.js` on an ephemeral port and returns its base URL.
    async fn spawn_remote() -> String {
        let app = axum::Router::new().route(
            "/lib.js",
            axum::routing::get(|| async { "var remote = 1" }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });
        format!("http://{addr}")
    }

    /// Client that ignores any proxy configured in the environment.
    fn direct_client() -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().expect("client")
    }

    #[tokio::test]
    async fn remote_source_is_fetched_without_mtime() {
        let base = spawn_remote().await;
        let content = SourceResolver::with_remote(direct_client())
            .read(&format!("{base}/lib.js"))
            .await
            .expect("fetch");
        assert_eq!(content.body, "var remote = 1");
        assert_eq!(content.modified, None);
    }

    #[tokio::test]
    async fn remote_404_is_not_found() {
        let base = spawn_remote().await;
        let src = format!("{base}/missing.js");
        assert_matches!(
            RemoteSourceReader::new(direct_client()).read(&src).await,
            Err(SourceError::NotFound(missing)) if missing == src
        );
    }

    #[tokio::test]
    async fn unreachable_remote_is_unreadable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);
        assert_matches!(
            RemoteSourceReader::new(direct_client())
                .read(&format!("http://{addr}/x.js"))
                .await,
            Err(SourceError::Unreadable { .. })
        );
    }

    #[tokio::test]
    async fn remote_sources_can_be_disabled() {
        assert_matches!(
            SourceResolver::local_only().read("https://cdn.example/x.js").await,
            Err(SourceError::Unreadable { reason, .. }) if reason.contains("disabled")
        );
    }
}
