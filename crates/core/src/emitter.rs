//! HTML tag emitter: collects the outcome of a render as ready-to-insert
//! markup plus the structured values behind it.

use serde::Serialize;

use crate::loader::{AssetTagEmitter, BundleLink};
use crate::localization::{LocalizationEntry, LocalizationStore};
use crate::types::AssetType;

/// Everything a host page needs to reference its bundles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderedPage {
    pub bundles: Vec<BundleLink>,
    /// Dependency handles the host must provide itself, deduplicated.
    pub external_handles: Vec<String>,
    pub media_library: bool,
    /// Inline script declaring the localization globals, when emitted.
    pub localization_script: Option<String>,
    /// `<link>` / `<script>` tags in output order.
    pub tags: Vec<String>,
}

#[derive(Debug, Default)]
pub struct HtmlTagEmitter {
    page: RenderedPage,
}

impl HtmlTagEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> RenderedPage {
        self.page
    }
}

fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

impl AssetTagEmitter for HtmlTagEmitter {
    fn emit_bundle(&mut self, link: &BundleLink) {
        let url = escape_attribute(&link.url);
        let tag = match link.asset_type {
            AssetType::Style => format!(r#"<link rel="stylesheet" type="text/css" href="{url}" />"#),
            AssetType::Script => {
                format!(r#"<script type="text/javascript" src="{url}"></script>"#)
            }
        };
        self.page.tags.push(tag);

        for dep in &link.external_deps {
            if !self.page.external_handles.contains(dep) {
                self.page.external_handles.push(dep.clone());
            }
        }
        self.page.bundles.push(link.clone());
    }

    fn emit_localization(&mut self, entries: &[LocalizationEntry]) {
        let script = LocalizationStore::from(entries.to_vec()).script_preamble();
        self.page.tags.push(format!(
            "<script type=\"text/javascript\">\n{script}\n</script>"
        ));
        self.page.localization_script = Some(script);
    }

    fn request_media_library(&mut self) {
        self.page.media_library = true;
    }
}
