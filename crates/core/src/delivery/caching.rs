//! HTTP caching headers and conditional-request evaluation.

use chrono::{DateTime, Duration, Utc};

use crate::hashing::sha256_hex;

/// One year, in seconds.
pub const CACHE_MAX_AGE_SECS: i64 = 31_536_000;

/// Format a timestamp as an RFC 7231 HTTP-date.
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Entity tag (without quotes) for a bundle built from `key` whose newest
/// source was modified at `timestamp` (unix seconds).
pub fn entity_tag(timestamp: i64, key: &str) -> String {
    sha256_hex(format!("{timestamp}{key}").as_bytes())
}

/// Caching headers for one bundle response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheHeaders {
    pub cache_control: String,
    pub expires: String,
    pub last_modified: String,
    pub pragma: &'static str,
    /// Entity tag without surrounding quotes.
    pub etag: String,
}

impl CacheHeaders {
    /// Headers for a bundle whose newest source changed at `last_modified`.
    pub fn new(last_modified: DateTime<Utc>, key: &str, now: DateTime<Utc>) -> Self {
        Self {
            cache_control: format!("public, max-age={CACHE_MAX_AGE_SECS}"),
            expires: http_date(now + Duration::seconds(CACHE_MAX_AGE_SECS)),
            last_modified: http_date(last_modified),
            pragma: "cache",
            etag: entity_tag(last_modified.timestamp(), key),
        }
    }

    /// `ETag` header value (quoted).
    pub fn etag_header(&self) -> String {
        format!("\"{}\"", self.etag)
    }

    /// Whether the request's conditional headers match this representation.
    pub fn is_not_modified(&self, if_modified_since: Option<&str>, if_none_match: Option<&str>) -> bool {
        let modified_matches = if_modified_since.is_some_and(|v| v.trim() == self.last_modified);
        let etag_matches = if_none_match.is_some_and(|v| {
            v.split(',').map(str::trim).any(|tag| {
                tag == "*" || tag.trim_start_matches("W/").trim_matches('"') == self.etag
            })
        });
        modified_matches || etag_matches
    }
}
