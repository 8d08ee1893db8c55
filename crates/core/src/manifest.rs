//! Registration manifest.
//!
//! A manifest is a JSON document listing registration directives in order:
//!
//! ```json
//! {
//!   "directives": [
//!     { "action": "register", "type": "script", "name": "jquery-ui", "options": "js/jquery-ui.js" },
//!     { "action": "load", "type": "style", "name": "admin", "options": { "src": "css/admin.css", "deps": ["zzz"] } },
//!     { "action": "localize", "name": "my_data", "data": { "settings": { "color": "red" } } }
//!   ]
//! }
//! ```
//!
//! The manifest is parsed once at startup and replayed into a fresh
//! [`AssetLoader`] for every page render.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::CoreError;
use crate::loader::AssetLoader;
use crate::registry::{AssetArgs, AssetOptions};
use crate::types::AssetType;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub directives: Vec<Directive>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Directive {
    Register {
        #[serde(rename = "type")]
        asset_type: AssetType,
        name: String,
        #[serde(default)]
        options: Option<AssetArgs>,
    },
    Load {
        #[serde(rename = "type")]
        asset_type: AssetType,
        name: String,
        #[serde(default)]
        options: Option<AssetArgs>,
    },
    Localize { name: String, data: Value },
}

impl Manifest {
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        serde_json::from_str(json).map_err(|e| CoreError::Manifest(e.to_string()))
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CoreError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Replay every directive into `loader`, stopping at the first failure.
    pub fn apply(&self, loader: &mut AssetLoader) -> Result<(), CoreError> {
        for (index, directive) in self.directives.iter().enumerate() {
            directive.apply(loader).map_err(|e| match e {
                CoreError::InvalidDefinition(msg) => {
                    CoreError::InvalidDefinition(format!("directive #{index}: {msg}"))
                }
                other => other,
            })?;
        }
        Ok(())
    }
}

impl Directive {
    fn apply(&self, loader: &mut AssetLoader) -> Result<(), CoreError> {
        match self {
            Directive::Register {
                asset_type,
                name,
                options,
            } => {
                let options = options.clone().map(AssetOptions::from).unwrap_or_default();
                loader.register(*asset_type, name, options)?;
            }
            Directive::Load {
                asset_type,
                name,
                options,
            } => {
                loader.load(*asset_type, name, options.clone().map(AssetOptions::from))?;
            }
            Directive::Localize { name, data } => loader.localize(name, data.clone())?,
        }
        Ok(())
    }
}
