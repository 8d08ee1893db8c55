//! Page context and the page-match predicate.
//!
//! A [`PageContext`] describes the page being rendered; a [`PageRule`] on an
//! asset definition decides whether the asset applies to that page.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::registry::AssetDefinition;
use crate::types::Scope;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Frontend page kinds a rule may name. A rule naming one of these matches
/// when the corresponding flag is set on the page context.
pub const PAGE_KINDS: &[&str] = &[
    "404",
    "admin",
    "archive",
    "attachment",
    "author",
    "category",
    "comments_popup",
    "customize_preview",
    "date",
    "day",
    "feed",
    "front_page",
    "home",
    "month",
    "page",
    "page_template",
    "paged",
    "preview",
    "search",
    "single",
    "singular",
    "sticky",
    "tag",
    "tax",
    "time",
    "trackback",
    "year",
];

/// Returns `true` if `name` is part of the fixed page-kind vocabulary.
pub fn is_page_kind(name: &str) -> bool {
    PAGE_KINDS.contains(&name)
}

// ---------------------------------------------------------------------------
// Page context
// ---------------------------------------------------------------------------

/// Read-only description of the page currently being rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContext {
    /// Whether the request renders an admin-area page.
    #[serde(default)]
    pub is_admin_area: bool,
    /// Screen identifier of the page (e.g. `plugins.php`). Numeric
    /// identifiers are accepted and kept in their decimal form.
    #[serde(default, deserialize_with = "string_or_number")]
    pub page_identifier: String,
    #[serde(default)]
    pub post_id: Option<i64>,
    #[serde(default)]
    pub post_type: Option<String>,
    /// Page-kind predicates that hold for this page (`single`, `author`, ...).
    #[serde(default)]
    pub page_kind_flags: BTreeSet<String>,
}

impl PageContext {
    pub fn has_flag(&self, kind: &str) -> bool {
        self.page_kind_flags.contains(kind)
    }
}

/// Supplies the [`PageContext`] once per page render.
pub trait PageContextProvider {
    fn page_context(&self) -> PageContext;
}

impl PageContextProvider for PageContext {
    fn page_context(&self) -> PageContext {
        self.clone()
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Page rules
// ---------------------------------------------------------------------------

/// Targeting rule deciding which pages an asset applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PageRule {
    /// Applies to every page of the asset's scope.
    Unrestricted,
    /// A specific post id.
    PostId(i64),
    /// An admin screen identifier, or a frontend page-kind name.
    Identifier(String),
    /// A screen object; matched through its suffix.
    Screen { suffix: String },
    /// Matches when any of the contained rules matches.
    AnyOf(Vec<PageRule>),
}

impl Default for PageRule {
    fn default() -> Self {
        PageRule::Unrestricted
    }
}

/// Accepts a boolean on top of the serialized shapes; `true` and `false`
/// both read as [`PageRule::Unrestricted`].
impl<'de> Deserialize<'de> for PageRule {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Unrestricted,
            Flag(bool),
            PostId(i64),
            Identifier(String),
            Screen { suffix: String },
            AnyOf(Vec<PageRule>),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Unrestricted | Raw::Flag(_) => PageRule::Unrestricted,
            Raw::PostId(id) => PageRule::PostId(id),
            Raw::Identifier(s) => PageRule::Identifier(s),
            Raw::Screen { suffix } => PageRule::Screen { suffix },
            Raw::AnyOf(rules) => PageRule::AnyOf(rules),
        })
    }
}

impl PageRule {
    /// Collapse rules that select nothing in particular (`0`, `"0"`, `""`,
    /// `[]`) to [`PageRule::Unrestricted`]. Zero only counts at the top
    /// level; inside a list it stays a post id.
    pub fn normalized(self) -> Self {
        match self {
            PageRule::PostId(0) => PageRule::Unrestricted,
            PageRule::Identifier(s) if s == "0" => PageRule::Unrestricted,
            other => other.without_empty(),
        }
    }

    fn without_empty(self) -> Self {
        match self {
            PageRule::Identifier(s) if s.is_empty() => PageRule::Unrestricted,
            PageRule::AnyOf(rules) if rules.is_empty() => PageRule::Unrestricted,
            PageRule::AnyOf(rules) => {
                PageRule::AnyOf(rules.into_iter().map(PageRule::without_empty).collect())
            }
            other => other,
        }
    }

    fn matches_post_id(&self, post_id: Option<i64>) -> bool {
        let Some(post_id) = post_id else {
            return false;
        };
        match self {
            PageRule::PostId(id) => *id == post_id,
            // Numeric identifiers compare equal to the same post id.
            PageRule::Identifier(s) => s.parse::<i64>().is_ok_and(|id| id == post_id),
            _ => false,
        }
    }

    fn matches_admin(&self, ctx: &PageContext) -> bool {
        match self {
            PageRule::Unrestricted => true,
            PageRule::AnyOf(rules) => rules.iter().any(|r| r.matches_admin(ctx)),
            PageRule::Identifier(s) if *s == ctx.page_identifier => true,
            PageRule::Screen { suffix } => *suffix == ctx.page_identifier,
            rule => rule.matches_post_id(ctx.post_id),
        }
    }

    fn matches_frontend(&self, ctx: &PageContext) -> bool {
        match self {
            PageRule::Unrestricted => true,
            PageRule::AnyOf(rules) => rules.iter().any(|r| r.matches_frontend(ctx)),
            PageRule::Identifier(kind) if is_page_kind(kind) && ctx.has_flag(kind) => true,
            rule => rule.matches_post_id(ctx.post_id),
        }
    }
}

// ---------------------------------------------------------------------------
// Predicate
// ---------------------------------------------------------------------------

/// Post-type filter: unrestricted, or the current post type is listed.
fn post_type_passes(allowed: Option<&[String]>, ctx: &PageContext) -> bool {
    match allowed {
        None => true,
        Some(types) => ctx
            .post_type
            .as_ref()
            .is_some_and(|current| types.iter().any(|t| t == current)),
    }
}

/// Decide whether `def` applies to the page described by `ctx`.
///
/// Admin assets only match in the admin area and frontend assets only on the
/// frontend; within its scope an asset matches when both the post-type
/// filter and the page rule pass.
pub fn page_matches(def: &AssetDefinition, ctx: &PageContext) -> bool {
    let page_ok = match (ctx.is_admin_area, def.scope) {
        (true, Scope::Admin) => def.page.matches_admin(ctx),
        (false, Scope::Frontend) => def.page.matches_frontend(ctx),
        _ => return false,
    };
    page_ok && post_type_passes(def.post_types.as_deref(), ctx)
}
