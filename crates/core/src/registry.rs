//! Asset registry: registered definitions and the per-page loaded set.
//!
//! Registration turns loosely-typed [`AssetOptions`] into a validated
//! [`AssetDefinition`] with defaults filled in. Registered assets are known
//! (and usable as dependency targets); loaded assets are the ones considered
//! for output on the current page.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::page::PageRule;
use crate::types::{AssetType, PerType, Scope, DEFAULT_PRIORITY};

/// Runs of `/` collapse to a single separator.
static REPEATED_SLASHES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("/+").expect("valid regex"));

// ---------------------------------------------------------------------------
// Registration options
// ---------------------------------------------------------------------------

/// A value given as `false`, a single string, or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StringList {
    Flag(bool),
    One(String),
    Many(Vec<String>),
}

impl StringList {
    /// Flatten into a list. `false` means "none"; `true` is rejected.
    fn into_vec(self, option: &str) -> Result<Vec<String>, CoreError> {
        match self {
            StringList::Flag(false) => Ok(Vec::new()),
            StringList::Flag(true) => Err(CoreError::InvalidDefinition(format!(
                "'{option}' must be false, a string or a list of strings"
            ))),
            StringList::One(s) if s.is_empty() => Ok(Vec::new()),
            StringList::One(s) => Ok(vec![s]),
            StringList::Many(v) => Ok(v),
        }
    }
}

/// Recognized registration options (`src`, `page`, `post_type`, `admin`,
/// `deps`, `priority`, `report`). Everything is optional; defaults are
/// applied by [`AssetDefinition::from_options`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetOptions {
    #[serde(default)]
    pub src: Option<StringList>,
    #[serde(default)]
    pub page: Option<PageRule>,
    #[serde(default)]
    pub post_type: Option<StringList>,
    #[serde(default)]
    pub admin: Option<bool>,
    #[serde(default)]
    pub deps: Option<StringList>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub report: Option<bool>,
}

impl AssetOptions {
    /// Shorthand for an asset with a single source and default options.
    pub fn from_src(src: impl Into<String>) -> Self {
        Self {
            src: Some(StringList::One(src.into())),
            ..Default::default()
        }
    }

    pub fn with_deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deps = Some(StringList::Many(deps.into_iter().map(Into::into).collect()));
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// Options as written by callers: either a bare source path or a full
/// option object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AssetArgs {
    Src(String),
    Options(AssetOptions),
}

impl From<AssetArgs> for AssetOptions {
    fn from(args: AssetArgs) -> Self {
        match args {
            AssetArgs::Src(src) => AssetOptions::from_src(src),
            AssetArgs::Options(options) => options,
        }
    }
}

// ---------------------------------------------------------------------------
// Definition
// ---------------------------------------------------------------------------

/// A registered asset with all defaults applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDefinition {
    pub name: String,
    pub asset_type: AssetType,
    /// Normalized source paths or remote URLs, in concatenation order.
    pub sources: Vec<String>,
    pub page: PageRule,
    /// Allowed post types; `None` means unrestricted.
    pub post_types: Option<Vec<String>>,
    pub scope: Scope,
    pub dependencies: Vec<String>,
    pub priority: i64,
    /// Emit an inline comment when a source cannot be read.
    pub report_missing: bool,
}

impl AssetDefinition {
    /// Build a definition from caller options, applying defaults and
    /// prefixing local sources with `assets_dir`.
    pub fn from_options(
        asset_type: AssetType,
        name: &str,
        options: AssetOptions,
        assets_dir: &str,
    ) -> Result<Self, CoreError> {
        if name.trim().is_empty() {
            return Err(CoreError::InvalidDefinition(
                "Asset name must not be empty".to_string(),
            ));
        }

        let sources = options
            .src
            .map(|s| s.into_vec("src"))
            .transpose()?
            .unwrap_or_default();
        if let Some(blank) = sources.iter().position(|s| s.trim().is_empty()) {
            return Err(CoreError::InvalidDefinition(format!(
                "{asset_type} '{name}': source #{blank} is empty"
            )));
        }

        let post_types = match options.post_type {
            None | Some(StringList::Flag(false)) => None,
            Some(list) => Some(list.into_vec("post_type")?),
        };

        let dependencies = options
            .deps
            .map(|d| d.into_vec("deps"))
            .transpose()?
            .unwrap_or_default();
        if dependencies.iter().any(|d| d == name) {
            return Err(CoreError::InvalidDefinition(format!(
                "{asset_type} '{name}' cannot depend on itself"
            )));
        }

        Ok(Self {
            name: name.to_string(),
            asset_type,
            sources: sources
                .iter()
                .map(|s| normalize_source(assets_dir, s))
                .collect(),
            page: options.page.unwrap_or_default().normalized(),
            post_types,
            scope: Scope::from_admin_flag(options.admin.unwrap_or(true)),
            dependencies,
            priority: options.priority.unwrap_or(DEFAULT_PRIORITY),
            report_missing: options.report.unwrap_or(true),
        })
    }

    pub fn has_sources(&self) -> bool {
        !self.sources.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Path normalization
// ---------------------------------------------------------------------------

/// Returns `true` for sources fetched over HTTP rather than read from disk.
pub fn is_remote_source(src: &str) -> bool {
    src.starts_with("http://") || src.starts_with("https://")
}

/// Unify separators to `/` and collapse repeated separators.
pub fn normalize_slashes(path: &str) -> String {
    let unified = path.replace('\\', "/");
    REPEATED_SLASHES_RE.replace_all(&unified, "/").into_owned()
}

/// Prefix a local source with the assets directory and normalize it.
/// Remote URLs are kept verbatim.
pub fn normalize_source(assets_dir: &str, src: &str) -> String {
    if is_remote_source(src) {
        return src.to_string();
    }
    normalize_slashes(&format!("{assets_dir}/{src}"))
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Registered definitions and loaded names, one table per asset type.
#[derive(Debug, Clone)]
pub struct AssetRegistry {
    assets_dir: String,
    registered: PerType<HashMap<String, AssetDefinition>>,
    /// Loaded names in the order they were first loaded.
    loaded: PerType<Vec<String>>,
}

impl AssetRegistry {
    pub fn new(assets_dir: impl Into<String>) -> Self {
        Self {
            assets_dir: assets_dir.into(),
            registered: PerType::default(),
            loaded: PerType::default(),
        }
    }

    /// Register (or overwrite) an asset definition.
    pub fn register(
        &mut self,
        asset_type: AssetType,
        name: &str,
        options: AssetOptions,
    ) -> Result<&AssetDefinition, CoreError> {
        let def = AssetDefinition::from_options(asset_type, name, options, &self.assets_dir)?;
        let table = self.registered.get_mut(asset_type);
        if table.contains_key(name) {
            tracing::debug!(%asset_type, name, "Overwriting registered asset");
        }
        table.insert(name.to_string(), def);
        Ok(&table[name])
    }

    pub fn is_registered(&self, asset_type: AssetType, name: &str) -> bool {
        self.registered.get(asset_type).contains_key(name)
    }

    /// Look up a registered definition.
    pub fn definition(&self, asset_type: AssetType, name: &str) -> Result<&AssetDefinition, CoreError> {
        self.get(asset_type, name).ok_or_else(|| CoreError::NotFound {
            kind: asset_type,
            name: name.to_string(),
        })
    }

    pub fn get(&self, asset_type: AssetType, name: &str) -> Option<&AssetDefinition> {
        self.registered.get(asset_type).get(name)
    }

    /// Mark an asset as a candidate for the current page.
    ///
    /// When the name is not registered yet, `options` (if given) registers
    /// it first. Loading an unknown name without options is an error.
    /// Loading the same name twice keeps its first position.
    pub fn load(
        &mut self,
        asset_type: AssetType,
        name: &str,
        options: Option<AssetOptions>,
    ) -> Result<(), CoreError> {
        if !self.is_registered(asset_type, name) {
            match options {
                Some(options) => {
                    self.register(asset_type, name, options)?;
                }
                None => {
                    return Err(CoreError::NotFound {
                        kind: asset_type,
                        name: name.to_string(),
                    })
                }
            }
        }

        let loaded = self.loaded.get_mut(asset_type);
        if !loaded.iter().any(|n| n == name) {
            loaded.push(name.to_string());
        }
        Ok(())
    }

    /// Loaded definitions in load order.
    pub fn loaded(&self, asset_type: AssetType) -> Vec<&AssetDefinition> {
        self.loaded
            .get(asset_type)
            .iter()
            .filter_map(|name| self.get(asset_type, name))
            .collect()
    }

    pub fn is_loaded(&self, asset_type: AssetType, name: &str) -> bool {
        self.loaded.get(asset_type).iter().any(|n| n == name)
    }
}
