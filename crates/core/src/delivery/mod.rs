//! Delivery pipeline: turns a stored enqueue decision into one combined,
//! cacheable, optionally compressed payload per asset type.

pub mod caching;
pub mod compression;
pub mod rewrite;
pub mod sources;

use chrono::{DateTime, Utc};

use crate::error::CoreError;
use crate::localization::{substitute_placeholders, LocalizationEntry};
use crate::registry::AssetDefinition;
use crate::session::DeliverySlot;
use crate::types::AssetType;

use self::caching::CacheHeaders;
use self::compression::{compress, negotiate};
use self::rewrite::{rewrite_css_urls, UrlMapping};
use self::sources::{SourceError, SourceReader};

/// Separator appended after every source segment.
pub const SEGMENT_SEPARATOR: &str = "\r\n\r\n";

// ---------------------------------------------------------------------------
// Bundle assembly
// ---------------------------------------------------------------------------

/// The concatenated payload for one asset type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub body: String,
    /// Newest modification time among the sources that were read.
    pub last_modified: Option<DateTime<Utc>>,
    /// Concatenated asset names, part of the entity tag.
    pub cache_key: String,
    /// Sources that could not be read.
    pub failed_sources: Vec<String>,
}

/// Inline replacement for a source that could not be read.
/// Both scripts and stylesheets accept block comments.
fn failure_segment(err: &SourceError, report: bool) -> String {
    if !report {
        return String::new();
    }
    match err {
        SourceError::NotFound(src) => format!("/* file not found: {src} */"),
        SourceError::Unreadable { src, .. } => format!("/* error loading file: {src} */"),
    }
}

/// Read, transform and concatenate every source of `assets`.
///
/// A source that cannot be read is replaced by an inline comment (or by
/// nothing when the asset disables reporting); the rest of the bundle is
/// unaffected.
pub async fn assemble_bundle<R: SourceReader>(
    reader: &R,
    asset_type: AssetType,
    assets: &[AssetDefinition],
    localization: &[LocalizationEntry],
    urls: &UrlMapping,
) -> Bundle {
    let mut body = String::new();
    let mut last_modified: Option<DateTime<Utc>> = None;
    let mut cache_key = String::new();
    let mut failed_sources = Vec::new();

    for asset in assets {
        cache_key.push_str(&asset.name);

        for src in &asset.sources {
            let segment = match reader.read(src).await {
                Ok(content) => {
                    last_modified = last_modified.max(content.modified);
                    match asset_type {
                        AssetType::Script => {
                            // Guards against a missing trailing semicolon.
                            let mut js = content.body;
                            js.push(';');
                            js
                        }
                        AssetType::Style => {
                            let css = substitute_placeholders(&content.body, localization);
                            rewrite_css_urls(&css, &urls.prefix_for(src))
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        %asset_type,
                        asset = %asset.name,
                        error = %err,
                        report = asset.report_missing,
                        "Asset source unavailable",
                    );
                    failed_sources.push(src.clone());
                    failure_segment(&err, asset.report_missing)
                }
            };
            body.push_str(&segment);
            body.push_str(SEGMENT_SEPARATOR);
        }
    }

    Bundle {
        body,
        last_modified,
        cache_key,
        failed_sources,
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// Request-side inputs of a delivery.
#[derive(Debug, Clone, Default)]
pub struct DeliveryRequest<'a> {
    pub accept_encoding: Option<&'a str>,
    pub if_modified_since: Option<&'a str>,
    pub if_none_match: Option<&'a str>,
    /// The transport already compresses responses.
    pub transport_compresses: bool,
}

/// Status of a delivery response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    Ok,
    NotModified,
}

/// A fully negotiated response, independent of any HTTP framework.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResponse {
    pub status: DeliveryStatus,
    /// Header name/value pairs, names in lowercase.
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl DeliveryResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Produce the response for one stored delivery slot.
pub async fn deliver<R: SourceReader>(
    reader: &R,
    slot: &DeliverySlot,
    urls: &UrlMapping,
    request: &DeliveryRequest<'_>,
    now: DateTime<Utc>,
) -> Result<DeliveryResponse, CoreError> {
    let asset_type = slot.asset_type;
    let bundle = assemble_bundle(reader, asset_type, &slot.assets, &slot.localization, urls).await;

    let mut headers: Vec<(&'static str, String)> =
        vec![("content-type", asset_type.content_type().to_string())];

    let encoding = if slot.compression_enabled {
        negotiate(
            request.accept_encoding,
            slot.force_gzip,
            request.transport_compresses,
        )
    } else {
        None
    };
    if encoding.is_some() {
        headers.push(("vary", "Accept-Encoding".to_string()));
    }

    let mut status = DeliveryStatus::Ok;
    if slot.caching_enabled {
        let last_modified = bundle.last_modified.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        let cache = CacheHeaders::new(last_modified, &bundle.cache_key, now);
        if cache.is_not_modified(request.if_modified_since, request.if_none_match) {
            status = DeliveryStatus::NotModified;
        }
        headers.push(("cache-control", cache.cache_control.clone()));
        headers.push(("expires", cache.expires.clone()));
        headers.push(("last-modified", cache.last_modified.clone()));
        headers.push(("pragma", cache.pragma.to_string()));
        headers.push(("etag", cache.etag_header()));
    }

    let body = match status {
        DeliveryStatus::NotModified => Vec::new(),
        DeliveryStatus::Ok => {
            let mut body = bundle.body.into_bytes();
            if let Some(encoding) = encoding {
                body = compress(&body, encoding)?;
                if let Some(value) = encoding.header_value() {
                    headers.push(("content-encoding", value.to_string()));
                }
            }
            headers.push(("content-length", body.len().to_string()));
            body
        }
    };

    tracing::info!(
        %asset_type,
        assets = slot.assets.len(),
        failed = bundle.failed_sources.len(),
        bytes = body.len(),
        not_modified = status == DeliveryStatus::NotModified,
        "Delivered bundle",
    );

    Ok(DeliveryResponse {
        status,
        headers,
        body,
    })
}
