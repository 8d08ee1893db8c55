//! Response compression negotiation.
//!
//! Deflate is preferred over gzip unless gzip is forced. Compression is
//! skipped entirely when the transport already compresses responses or the
//! client sent no `Accept-Encoding` header.

use std::io::Write;

use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;

use crate::error::CoreError;

/// Compression level used for bundles; favours speed over ratio.
const COMPRESSION_LEVEL: u32 = 3;

/// Content coding applied to a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Identity,
    Deflate,
    Gzip,
}

impl Encoding {
    /// Value of the `Content-Encoding` header, `None` for identity.
    pub fn header_value(self) -> Option<&'static str> {
        match self {
            Encoding::Identity => None,
            Encoding::Deflate => Some("deflate"),
            Encoding::Gzip => Some("gzip"),
        }
    }
}

/// Quality of one `Accept-Encoding` item; a missing or malformed `q` counts
/// as 1.
fn quality<'a>(params: impl Iterator<Item = &'a str>) -> f32 {
    params
        .filter_map(|param| param.strip_prefix("q="))
        .find_map(|q| q.trim().parse::<f32>().ok())
        .unwrap_or(1.0)
}

/// Whether `accept_encoding` admits `coding`. An explicit entry for the
/// coding takes precedence over `*`; `q=0` excludes.
fn accepts(accept_encoding: &str, coding: &str) -> bool {
    let mut explicit = None;
    let mut wildcard = None;
    for item in accept_encoding.split(',') {
        let mut parts = item.split(';').map(str::trim);
        let name = parts.next().unwrap_or_default();
        if name.eq_ignore_ascii_case(coding) {
            explicit.get_or_insert(quality(parts));
        } else if name == "*" {
            wildcard.get_or_insert(quality(parts));
        }
    }
    explicit.or(wildcard).is_some_and(|q| q > 0.0)
}

/// Pick an encoding for the response.
///
/// Returns `None` when negotiation is skipped (nothing to advertise) and
/// `Some` otherwise; in the latter case the response varies by
/// `Accept-Encoding`, even when the result is [`Encoding::Identity`].
pub fn negotiate(
    accept_encoding: Option<&str>,
    force_gzip: bool,
    transport_compresses: bool,
) -> Option<Encoding> {
    if transport_compresses {
        return None;
    }
    let accept_encoding = accept_encoding?;

    let encoding = if !force_gzip && accepts(accept_encoding, "deflate") {
        Encoding::Deflate
    } else if accepts(accept_encoding, "gzip") {
        Encoding::Gzip
    } else {
        Encoding::Identity
    };
    Some(encoding)
}

/// Encode `body` with `encoding`. Deflate uses the zlib framing that the
/// HTTP `deflate` coding specifies.
pub fn compress(body: &[u8], encoding: Encoding) -> Result<Vec<u8>, CoreError> {
    let level = Compression::new(COMPRESSION_LEVEL);
    let io_err = |e: std::io::Error| CoreError::Io(format!("compression failed: {e}"));

    match encoding {
        Encoding::Identity => Ok(body.to_vec()),
        Encoding::Deflate => {
            let mut encoder = ZlibEncoder::new(Vec::new(), level);
            encoder.write_all(body).map_err(io_err)?;
            encoder.finish().map_err(io_err)
        }
        Encoding::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), level);
            encoder.write_all(body).map_err(io_err)?;
            encoder.finish().map_err(io_err)
        }
    }
}
