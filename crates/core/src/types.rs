//! Shared primitive types for the asset pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Priority assigned to assets that do not specify one.
pub const DEFAULT_PRIORITY: i64 = 99;

/// Dependency name that asks the host to load its built-in media library
/// instead of naming a registered asset.
pub const MEDIA_LIBRARY_SENTINEL: &str = "wp_media";

/// The two kinds of asset the pipeline combines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Script,
    Style,
}

impl AssetType {
    /// Both types, in the order the pipeline processes them.
    pub const ALL: [AssetType; 2] = [AssetType::Style, AssetType::Script];

    /// File name of the combined bundle served by the delivery endpoint.
    pub fn bundle_file(self) -> &'static str {
        match self {
            AssetType::Script => "scripts.js",
            AssetType::Style => "styles.css",
        }
    }

    /// Resolve a delivery file name (`scripts.js` / `styles.css`) back to its type.
    pub fn from_bundle_file(file: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.bundle_file() == file)
    }

    pub fn content_type(self) -> &'static str {
        match self {
            AssetType::Script => "application/javascript; charset=UTF-8",
            AssetType::Style => "text/css; charset=UTF-8",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetType::Script => write!(f, "script"),
            AssetType::Style => write!(f, "style"),
        }
    }
}

/// Whether an asset targets the admin area or the public frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Admin,
    Frontend,
}

impl Scope {
    pub fn from_admin_flag(admin: bool) -> Self {
        if admin {
            Scope::Admin
        } else {
            Scope::Frontend
        }
    }
}

/// Two values of `T`, one per [`AssetType`].
///
/// Replaces name-based field dispatch (`loaded_scripts` / `loaded_styles`)
/// with an index by type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerType<T> {
    pub scripts: T,
    pub styles: T,
}

impl<T> PerType<T> {
    pub fn get(&self, asset_type: AssetType) -> &T {
        match asset_type {
            AssetType::Script => &self.scripts,
            AssetType::Style => &self.styles,
        }
    }

    pub fn get_mut(&mut self, asset_type: AssetType) -> &mut T {
        match asset_type {
            AssetType::Script => &mut self.scripts,
            AssetType::Style => &mut self.styles,
        }
    }
}
