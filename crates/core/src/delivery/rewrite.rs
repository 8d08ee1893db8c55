//! Relative path computation and stylesheet `url(...)` rewriting.
//!
//! A stylesheet served from the delivery endpoint no longer sits next to
//! the files its relative URLs point at, so every relative `url(...)` is
//! re-anchored from the source file's location to the endpoint's.

use crate::registry::{is_remote_source, normalize_slashes};

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// Split a `/`-separated path into components, resolving `.` and `..`
/// lexically.
fn components(path: &str) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if matches!(out.last(), Some(last) if *last != "..") {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Path leading from directory `from_dir` to `to`, using `..` to climb out
/// of `from_dir` where needed. Returns `.` when both are the same.
pub fn relative_path(from_dir: &str, to: &str) -> String {
    let from_dir = normalize_slashes(from_dir);
    let to = normalize_slashes(to);
    let from = components(&from_dir);
    let to = components(&to);

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = std::iter::repeat("..").take(from.len() - common).collect();
    parts.extend_from_slice(&to[common..]);

    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Directory part of a `/`-separated path or URL (everything before the
/// last `/`), or `.` when there is none.
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(idx) => &path[..idx],
        None => ".",
    }
}

// ---------------------------------------------------------------------------
// URL mapping
// ---------------------------------------------------------------------------

/// Where things live in URL space, used to re-anchor stylesheet URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlMapping {
    /// Filesystem directory that registered source paths are prefixed with.
    pub assets_dir: String,
    /// URL path at which `assets_dir` is served verbatim.
    pub static_mount: String,
    /// URL path of the directory the bundles are served from.
    pub endpoint_dir: String,
}

impl UrlMapping {
    /// Prefix that relative URLs found in `src` must receive so they resolve
    /// from the delivery endpoint.
    pub fn prefix_for(&self, src: &str) -> String {
        if is_remote_source(src) {
            return parent_dir(src).to_string();
        }
        let source_dir = relative_path(&self.assets_dir, parent_dir(src));
        let url_dir = normalize_slashes(&format!("{}/{source_dir}", self.static_mount));
        relative_path(&self.endpoint_dir, &url_dir)
    }
}

// ---------------------------------------------------------------------------
// Rewriting
// ---------------------------------------------------------------------------

/// URLs left untouched: absolute, protocol-relative, root-relative, data
/// URIs and fragment references.
fn is_anchored_url(url: &str) -> bool {
    url.is_empty()
        || url.starts_with('/')
        || url.starts_with('#')
        || url.contains("://")
        || url.get(..5).is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

fn join_url(prefix: &str, url: &str) -> String {
    let url = url.strip_prefix("./").unwrap_or(url);
    if prefix.is_empty() || prefix == "." {
        url.to_string()
    } else {
        format!("{}/{url}", prefix.trim_end_matches('/'))
    }
}

/// Offset of the `)` closing a `url(` whose contents start at `inner`.
/// A quoted URL may itself contain `)`.
fn closing_paren(inner: &str) -> Option<usize> {
    let trimmed = inner.trim_start();
    let lead = inner.len() - trimmed.len();
    let search_from = match trimmed.chars().next() {
        Some(q @ ('"' | '\'')) => trimmed[1..].find(q).map_or(0, |end| lead + end + 2),
        _ => 0,
    };
    inner[search_from..].find(')').map(|idx| search_from + idx)
}

/// Prefix every relative `url(...)` reference in `css` with `prefix`.
/// Quoting of each reference is preserved.
pub fn rewrite_css_urls(css: &str, prefix: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;

    while let Some(start) = rest.find("url(") {
        let (before, after_open) = rest.split_at(start + 4);
        out.push_str(before);

        let Some(close) = closing_paren(after_open) else {
            rest = after_open;
            break;
        };
        let raw = after_open[..close].trim();
        let quote = raw
            .chars()
            .next()
            .filter(|c| (*c == '"' || *c == '\'') && raw.len() > 1 && raw.ends_with(*c));
        let url = match quote {
            Some(_) => &raw[1..raw.len() - 1],
            None => raw,
        };

        let url = if is_anchored_url(url) {
            url.to_string()
        } else {
            join_url(prefix, url)
        };

        if let Some(q) = quote {
            out.push(q);
            out.push_str(&url);
            out.push(q);
        } else {
            out.push_str(&url);
        }
        out.push(')');
        rest = &after_open[close + 1..];
    }

    out.push_str(rest);
    out
}
