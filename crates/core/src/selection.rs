//! Selection engine: which loaded assets are enqueued for a page, and in
//! what order.
//!
//! Loaded assets are visited in priority order. Each matching asset pulls
//! in its dependency closure depth-first (dependencies of a dependency come
//! before the dependency, which comes before its dependent) and is then
//! enqueued itself. An asset is never enqueued twice.
//!
//! Dependency resolution uses an explicit stack plus a "visiting" set.
//! A dependency that is still on the stack when it is reached again closes
//! a cycle; that back-edge is skipped, so the member reached first is
//! enqueued after the rest of the cycle.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::ordering::{fingerprint, sort_by_priority};
use crate::page::{page_matches, PageContext};
use crate::registry::{AssetDefinition, AssetRegistry};
use crate::types::{AssetType, PerType, MEDIA_LIBRARY_SENTINEL};

/// Result of selection for one asset type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnqueuedSet {
    /// Enqueued assets in delivery order.
    pub assets: Vec<AssetDefinition>,
    /// Dependency names with no registered, sourced asset of this type.
    /// Forwarded to the tag emitter as external handles.
    pub unresolved: Vec<String>,
    /// Whether some enqueued asset depends on the host's media library.
    pub media_requested: bool,
}

impl EnqueuedSet {
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.assets.iter().map(|a| a.name.as_str()).collect()
    }

    /// Fingerprint of the contributing source paths, `None` when empty.
    pub fn fingerprint(&self) -> Option<String> {
        fingerprint(&self.assets)
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Selection<'a> {
    enqueued: Vec<&'a AssetDefinition>,
    enqueued_names: HashSet<&'a str>,
    unresolved: Vec<String>,
    media_requested: bool,
}

impl<'a> Selection<'a> {
    fn is_enqueued(&self, name: &str) -> bool {
        self.enqueued_names.contains(name)
    }

    fn enqueue(&mut self, def: &'a AssetDefinition) {
        if self.enqueued_names.insert(def.name.as_str()) {
            self.enqueued.push(def);
        }
    }

    fn record_unresolved(&mut self, name: &str) {
        if !self.unresolved.iter().any(|n| n == name) {
            self.unresolved.push(name.to_string());
        }
    }

    fn finish(self) -> EnqueuedSet {
        EnqueuedSet {
            assets: self.enqueued.into_iter().cloned().collect(),
            unresolved: self.unresolved,
            media_requested: self.media_requested,
        }
    }
}

struct Frame<'a> {
    def: &'a AssetDefinition,
    next_dep: usize,
}

/// Enqueue `root` after its dependency closure.
fn enqueue_with_dependencies<'a>(
    registry: &'a AssetRegistry,
    root: &'a AssetDefinition,
    selection: &mut Selection<'a>,
) {
    let asset_type = root.asset_type;
    let mut stack = vec![Frame { def: root, next_dep: 0 }];
    let mut visiting: HashSet<&'a str> = HashSet::from([root.name.as_str()]);

    while let Some(frame) = stack.last_mut() {
        let def: &'a AssetDefinition = frame.def;
        let Some(dep) = def.dependencies.get(frame.next_dep) else {
            stack.pop();
            visiting.remove(def.name.as_str());
            selection.enqueue(def);
            continue;
        };
        frame.next_dep += 1;

        if selection.is_enqueued(dep) {
            continue;
        }
        if visiting.contains(dep.as_str()) {
            tracing::debug!(
                %asset_type,
                asset = %def.name,
                dependency = %dep,
                "Skipping circular dependency",
            );
            continue;
        }

        match registry.get(asset_type, dep) {
            Some(dep_def) if dep_def.has_sources() => {
                visiting.insert(dep_def.name.as_str());
                stack.push(Frame { def: dep_def, next_dep: 0 });
            }
            _ if dep == MEDIA_LIBRARY_SENTINEL => selection.media_requested = true,
            _ => selection.record_unresolved(dep),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Select the enqueued assets of one type for the page described by `ctx`.
pub fn select_enqueued(
    registry: &AssetRegistry,
    asset_type: AssetType,
    ctx: &PageContext,
) -> EnqueuedSet {
    let mut loaded = registry.loaded(asset_type);
    sort_by_priority(&mut loaded, |def| def.priority);

    let mut selection = Selection::default();
    for def in loaded {
        if selection.is_enqueued(&def.name) || !page_matches(def, ctx) {
            continue;
        }
        enqueue_with_dependencies(registry, def, &mut selection);
    }

    let set = selection.finish();
    tracing::debug!(
        %asset_type,
        enqueued = ?set.names(),
        unresolved = ?set.unresolved,
        "Selected assets",
    );
    set
}

/// Run selection for both asset types.
pub fn select_all(registry: &AssetRegistry, ctx: &PageContext) -> PerType<EnqueuedSet> {
    PerType {
        scripts: select_enqueued(registry, AssetType::Script, ctx),
        styles: select_enqueued(registry, AssetType::Style, ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::AssetOptions;

    fn admin_page() -> PageContext {
        PageContext {
            is_admin_area: true,
            page_identifier: "index.php".to_string(),
            ..Default::default()
        }
    }

    fn register(reg: &mut AssetRegistry, name: &str, deps: &[&str]) {
        reg.register(
            AssetType::Script,
            name,
            AssetOptions::from_src(format!("{name}.js")).with_deps(deps.iter().copied()),
        )
        .expect("register");
    }

    fn load(reg: &mut AssetRegistry, name: &str, options: AssetOptions) {
        reg.load(AssetType::Script, name, Some(options)).expect("load");
    }

    fn selected(reg: &AssetRegistry) -> Vec<String> {
        select_enqueued(reg, AssetType::Script, &admin_page())
            .names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn lower_priority_value_is_enqueued_first() {
        let mut reg = AssetRegistry::new(".");
        load(&mut reg, "fifty", AssetOptions::from_src("50.js").with_priority(50));
        load(&mut reg, "ten", AssetOptions::from_src("10.js").with_priority(10));
        assert_eq!(selected(&reg), vec!["ten", "fifty"]);
    }

    #[test]
    fn equal_priorities_keep_load_order() {
        let mut reg = AssetRegistry::new(".");
        for name in ["c", "a", "b"] {
            load(&mut reg, name, AssetOptions::from_src(format!("{name}.js")));
        }
        load(&mut reg, "first", AssetOptions::from_src("0.js").with_priority(0));
        assert_eq!(selected(&reg), vec!["first", "c", "a", "b"]);
    }

    #[test]
    fn dependency_precedes_dependent_exactly_once() {
        let mut reg = AssetRegistry::new(".");
        register(&mut reg, "b", &[]);
        load(&mut reg, "a1", AssetOptions::from_src("a1.js").with_deps(["b"]));
        load(&mut reg, "a2", AssetOptions::from_src("a2.js").with_deps(["b"]));
        assert_eq!(selected(&reg), vec!["b", "a1", "a2"]);
    }

    #[test]
    fn nested_dependencies_are_depth_first() {
        let mut reg = AssetRegistry::new(".");
        register(&mut reg, "dep_a", &[]);
        register(&mut reg, "dep_b", &["dep_a"]);
        register(&mut reg, "side", &[]);
        load(&mut reg, "main", AssetOptions::from_src("main.js").with_deps(["dep_b", "side"]));
        assert_eq!(selected(&reg), vec!["dep_a", "dep_b", "side", "main"]);
    }

    #[test]
    fn diamond_collapses_to_single_entry() {
        let mut reg = AssetRegistry::new(".");
        register(&mut reg, "base", &[]);
        register(&mut reg, "left", &["base"]);
        register(&mut reg, "right", &["base"]);
        load(&mut reg, "top", AssetOptions::from_src("top.js").with_deps(["left", "right"]));
        assert_eq!(selected(&reg), vec!["base", "left", "right", "top"]);
    }

    #[test]
    fn cycles_terminate_by_skipping_back_edges() {
        let mut reg = AssetRegistry::new(".");
        register(&mut reg, "x", &["y"]);
        register(&mut reg, "y", &["z"]);
        register(&mut reg, "z", &["x"]);
        load(&mut reg, "x", AssetOptions::default());
        assert_eq!(selected(&reg), vec!["z", "y", "x"]);
    }

    #[test]
    fn cycle_through_loaded_root_is_skipped() {
        let mut reg = AssetRegistry::new(".");
        register(&mut reg, "helper", &["root"]);
        load(&mut reg, "root", AssetOptions::from_src("root.js").with_deps(["helper"]));
        assert_eq!(selected(&reg), vec!["helper", "root"]);
    }

    #[test]
    fn dependency_already_loaded_later_is_not_duplicated() {
        let mut reg = AssetRegistry::new(".");
        load(&mut reg, "main", AssetOptions::from_src("main.js").with_deps(["lib"]));
        load(&mut reg, "lib", AssetOptions::from_src("lib.js"));
        assert_eq!(selected(&reg), vec!["lib", "main"]);
    }

    #[test]
    fn unregistered_dependencies_are_unresolved() {
        let mut reg = AssetRegistry::new(".");
        load(
            &mut reg,
            "a",
            AssetOptions::from_src("a.js").with_deps(["imagesloaded", "jquery", "imagesloaded"]),
        );
        let set = select_enqueued(&reg, AssetType::Script, &admin_page());
        assert_eq!(set.names(), vec!["a"]);
        assert_eq!(set.unresolved, vec!["imagesloaded", "jquery"]);
        assert!(!set.media_requested);
    }

    #[test]
    fn media_sentinel_is_signalled_not_unresolved() {
        let mut reg = AssetRegistry::new(".");
        load(&mut reg, "a", AssetOptions::from_src("a.js").with_deps([MEDIA_LIBRARY_SENTINEL]));
        let set = select_enqueued(&reg, AssetType::Script, &admin_page());
        assert!(set.media_requested);
        assert!(set.unresolved.is_empty());
    }

    #[test]
    fn sourceless_dependency_is_treated_as_external() {
        let mut reg = AssetRegistry::new(".");
        reg.register(AssetType::Script, "handle", AssetOptions::default())
            .expect("register");
        load(&mut reg, "a", AssetOptions::from_src("a.js").with_deps(["handle"]));
        let set = select_enqueued(&reg, AssetType::Script, &admin_page());
        assert_eq!(set.names(), vec!["a"]);
        assert_eq!(set.unresolved, vec!["handle"]);
    }

    #[test]
    fn dependencies_resolve_within_the_same_type_only() {
        let mut reg = AssetRegistry::new(".");
        reg.register(AssetType::Style, "shared", AssetOptions::from_src("shared.css"))
            .expect("register");
        load(&mut reg, "a", AssetOptions::from_src("a.js").with_deps(["shared"]));
        let set = select_enqueued(&reg, AssetType::Script, &admin_page());
        assert_eq!(set.unresolved, vec!["shared"]);
    }

    #[test]
    fn non_matching_assets_pull_in_nothing() {
        let mut reg = AssetRegistry::new(".");
        register(&mut reg, "b", &[]);
        let options: AssetOptions = serde_json::from_value(serde_json::json!({
            "src": "a.js",
            "page": "plugins.php",
            "deps": ["b"],
        }))
        .expect("options");
        load(&mut reg, "a", options);
        assert!(selected(&reg).is_empty());
    }

    #[test]
    fn selection_is_idempotent() {
        let mut reg = AssetRegistry::new(".");
        register(&mut reg, "b", &[]);
        load(&mut reg, "a", AssetOptions::from_src("a.js").with_deps(["b"]));
        let first = select_all(&reg, &admin_page());
        let second = select_all(&reg, &admin_page());
        assert_eq!(first, second);
        assert_eq!(first.scripts.fingerprint(), second.scripts.fingerprint());
        assert!(first.styles.is_empty());
    }
}
