//! Per-render loader context.
//!
//! An [`AssetLoader`] owns everything one page render needs: configuration,
//! the registry and the localization store. Nothing is global; each render
//! builds (or replays into) a fresh loader and finalizes it once.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::localization::{LocalizationEntry, LocalizationStore};
use crate::page::PageContextProvider;
use crate::registry::{AssetDefinition, AssetOptions, AssetRegistry};
use crate::selection::select_all;
use crate::session::DeliveryState;
use crate::types::{AssetType, PerType};

/// Base URL used when none is configured explicitly.
pub const DEFAULT_BASE_URL: &str = "/assets";

/// Loader configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    pub caching_enabled: bool,
    pub compression_enabled: bool,
    pub force_gzip: bool,
    /// Directory prepended to every local source path.
    pub assets_dir: String,
    /// Explicit base URL of the delivery endpoint.
    pub base_url: Option<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            caching_enabled: true,
            compression_enabled: true,
            force_gzip: false,
            assets_dir: ".".to_string(),
            base_url: None,
        }
    }
}

impl LoaderConfig {
    /// Base URL of the delivery endpoint, without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .unwrap_or(DEFAULT_BASE_URL)
    }
}

// ---------------------------------------------------------------------------
// Tag emitter
// ---------------------------------------------------------------------------

/// Link to one combined bundle, handed to the tag emitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleLink {
    pub asset_type: AssetType,
    /// `<base>/<bundle file>?<fingerprint>`
    pub url: String,
    pub fingerprint: String,
    /// Dependencies the bundle does not contain; the host must provide them.
    pub external_deps: Vec<String>,
}

/// Receives the outcome of a render. Implemented by whatever inserts
/// `<script>` / `<link>` references into the host's output.
pub trait AssetTagEmitter {
    fn emit_bundle(&mut self, link: &BundleLink);

    /// Called before the script bundle is emitted, only when there is one.
    fn emit_localization(&mut self, entries: &[LocalizationEntry]);

    /// Called at most once per render.
    fn request_media_library(&mut self);
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AssetLoader {
    config: LoaderConfig,
    registry: AssetRegistry,
    localization: LocalizationStore,
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::new(LoaderConfig::default())
    }
}

impl AssetLoader {
    pub fn new(config: LoaderConfig) -> Self {
        let registry = AssetRegistry::new(config.assets_dir.clone());
        Self {
            config,
            registry,
            localization: LocalizationStore::new(),
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn registry(&self) -> &AssetRegistry {
        &self.registry
    }

    pub fn base_url(&self) -> &str {
        self.config.base_url()
    }

    pub fn register(
        &mut self,
        asset_type: AssetType,
        name: &str,
        options: impl Into<AssetOptions>,
    ) -> Result<&AssetDefinition, CoreError> {
        self.registry.register(asset_type, name, options.into())
    }

    pub fn load(
        &mut self,
        asset_type: AssetType,
        name: &str,
        options: Option<AssetOptions>,
    ) -> Result<(), CoreError> {
        self.registry.load(asset_type, name, options)
    }

    pub fn is_registered(&self, asset_type: AssetType, name: &str) -> bool {
        self.registry.is_registered(asset_type, name)
    }

    pub fn is_loaded(&self, asset_type: AssetType, name: &str) -> bool {
        self.registry.is_loaded(asset_type, name)
    }

    pub fn definition(&self, asset_type: AssetType, name: &str) -> Result<&AssetDefinition, CoreError> {
        self.registry.definition(asset_type, name)
    }

    pub fn localize(&mut self, name: &str, data: Value) -> Result<(), CoreError> {
        self.localization.localize(name, data)
    }

    pub fn localization(&self) -> &LocalizationStore {
        &self.localization
    }

    /// Run selection for the page, report the outcome to `emitter` and
    /// return the state the delivery phase needs.
    ///
    /// Styles are emitted before scripts. Types with nothing enqueued get
    /// no bundle.
    pub fn finalize<P, E>(&self, provider: &P, emitter: &mut E) -> DeliveryState
    where
        P: PageContextProvider + ?Sized,
        E: AssetTagEmitter + ?Sized,
    {
        let ctx = provider.page_context();
        let mut selected = select_all(&self.registry, &ctx);

        if selected.scripts.media_requested || selected.styles.media_requested {
            emitter.request_media_library();
        }

        for asset_type in AssetType::ALL {
            let set = selected.get(asset_type);
            let Some(fingerprint) = set.fingerprint() else {
                continue;
            };
            if asset_type == AssetType::Script && !self.localization.is_empty() {
                emitter.emit_localization(self.localization.entries());
            }
            emitter.emit_bundle(&BundleLink {
                asset_type,
                url: format!(
                    "{}/{}?{fingerprint}",
                    self.base_url(),
                    asset_type.bundle_file()
                ),
                fingerprint,
                external_deps: set.unresolved.clone(),
            });
        }

        tracing::info!(
            scripts = selected.scripts.assets.len(),
            styles = selected.styles.assets.len(),
            page = %ctx.page_identifier,
            admin = ctx.is_admin_area,
            "Finalized page assets",
        );

        DeliveryState {
            enqueued: PerType {
                scripts: std::mem::take(&mut selected.scripts.assets),
                styles: std::mem::take(&mut selected.styles.assets),
            },
            localization: self.localization.entries().to_vec(),
            caching_enabled: self.config.caching_enabled,
            compression_enabled: self.config.compression_enabled,
            force_gzip: self.config.force_gzip,
        }
    }
}
