//! Localization store: named data bindings for scripts and stylesheets.
//!
//! Scripts receive each entry as a global variable. Stylesheets reference
//! string leaves through `[[name.key.sub]]` placeholders.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

/// Matches `[[dotted.path]]` placeholders in stylesheet sources.
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\[\]]+)\]\]").expect("valid regex"));

/// A named data binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalizationEntry {
    pub name: String,
    pub data: Value,
}

impl LocalizationEntry {
    /// Render the entry as a script statement declaring a global variable.
    ///
    /// `</` is escaped so the statement can sit inside an inline `<script>`.
    pub fn script_statement(&self) -> String {
        let json = self.data.to_string().replace("</", "<\\/");
        format!("var {} = {json};", self.name)
    }
}

/// Ordered collection of localization entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalizationStore {
    entries: Vec<LocalizationEntry>,
}

impl LocalizationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binding. The name becomes a script identifier, so it must be a
    /// valid one (letters, digits, `_`, `$`; not starting with a digit).
    pub fn localize(&mut self, name: &str, data: Value) -> Result<(), CoreError> {
        validate_identifier(name)?;
        self.entries.push(LocalizationEntry {
            name: name.to_string(),
            data,
        });
        Ok(())
    }

    pub fn entries(&self) -> &[LocalizationEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries as script statements, one per line.
    pub fn script_preamble(&self) -> String {
        self.entries
            .iter()
            .map(LocalizationEntry::script_statement)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<Vec<LocalizationEntry>> for LocalizationStore {
    fn from(entries: Vec<LocalizationEntry>) -> Self {
        Self { entries }
    }
}

fn validate_identifier(name: &str) -> Result<(), CoreError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$');
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$') {
        Ok(())
    } else {
        Err(CoreError::InvalidDefinition(format!(
            "Localization name '{name}' is not a valid script identifier"
        )))
    }
}

// ---------------------------------------------------------------------------
// Stylesheet placeholders
// ---------------------------------------------------------------------------

/// Collect string leaves of `value` under `prefix`, extending the prefix
/// with `.key` (or `.index` for arrays) at each nesting level.
fn collect_string_leaves(prefix: &str, value: &Value, out: &mut HashMap<String, String>) {
    let children: Vec<(String, &Value)> = match value {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => return,
    };

    for (key, child) in children {
        let path = format!("{prefix}.{key}");
        match child {
            Value::String(s) => {
                out.entry(path).or_insert_with(|| s.clone());
            }
            other => collect_string_leaves(&path, other, out),
        }
    }
}

/// Replace `[[name.key]]` placeholders in stylesheet text.
///
/// Entries apply in order, so when two entries provide the same key the
/// earlier one wins. Only string leaves are substituted; placeholders
/// naming numbers, booleans, nulls or containers, and unknown placeholders,
/// are left as they are.
pub fn substitute_placeholders(css: &str, entries: &[LocalizationEntry]) -> String {
    if entries.is_empty() || !css.contains("[[") {
        return css.to_string();
    }

    let mut values = HashMap::new();
    for entry in entries {
        collect_string_leaves(&entry.name, &entry.data, &mut values);
    }

    PLACEHOLDER_RE
        .replace_all(css, |caps: &Captures<'_>| match values.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}
