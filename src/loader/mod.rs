//! Checklist resolution.
//!
//! [`ChecklistLoader`] finds a checklist by name across override sources and
//! core directories, validates it, resolves its `extends` chain and caches the
//! merged result for the lifetime of the loader.
//!
//! ## Lookup
//!
//! A reference is either a file stem (`story-done`) or `<category>/<stem>`
//! (`story/story-done`). Each directory is searched for `<ref>.yaml` and
//! `<ref>.yml`; bare stems are also looked up one level down in category
//! subdirectories.
//!
//! Enabled override sources are tried first, highest priority first, then the
//! core directories in order. An invalid override document is skipped with a
//! warning; an invalid core document is an error.

mod merge;
mod render;
mod sources;

pub use merge::inherit;
pub use render::render_checklist;
pub use sources::{
    CORE_SOURCE, DirectorySource, OverrideSource, SourceEntry, SourceProvider, SourceRegistry,
};

use crate::config::CheckgateConfig;
use crate::error::{CheckgateError, Result};
use crate::model::{Checklist, ChecklistDefinition};
use crate::schema::{SchemaValidator, is_yaml_file};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// One entry of the checklist catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub name: String,
    pub source: String,
    pub path: PathBuf,
}

/// Names visited along the current `extends` chain, innermost last.
///
/// Each recursion level pushes a new link on the stack, so state from one
/// resolution never leaks into another.
struct Chain<'a> {
    name: &'a str,
    parent: Option<&'a Chain<'a>>,
}

impl Chain<'_> {
    fn contains(&self, name: &str) -> bool {
        self.name == name || self.parent.is_some_and(|p| p.contains(name))
    }

    fn names(&self) -> Vec<String> {
        let mut names = Vec::new();
        let mut link = Some(self);
        while let Some(l) = link {
            names.push(l.name.to_string());
            link = l.parent;
        }
        names.reverse();
        names
    }
}

/// A located, validated source document.
struct Located {
    source: String,
    path: PathBuf,
    document: Value,
    definition: ChecklistDefinition,
}

/// First file in search order that answers a reference, with its parse result.
struct Hit {
    source: String,
    path: PathBuf,
    parsed: Result<(Value, ChecklistDefinition)>,
}

pub struct ChecklistLoader {
    core_dirs: Vec<PathBuf>,
    provider: Option<Arc<dyn SourceProvider>>,
    validator: SchemaValidator,
    cache: RwLock<HashMap<String, Arc<Checklist>>>,
}

impl ChecklistLoader {
    pub fn new(core_dirs: Vec<PathBuf>, validator: SchemaValidator) -> Self {
        Self {
            core_dirs,
            provider: None,
            validator,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn SourceProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Builds a loader from project configuration: core directories, schema
    /// rules and `[[overrides]]` sources.
    pub fn from_config(config: &CheckgateConfig, root: &Path) -> Result<Self> {
        let validator = match config.schema_path(root) {
            Some(path) => SchemaValidator::from_path(&path)?,
            None => SchemaValidator::builtin()?,
        };
        let mut loader = Self::new(config.core_dirs(root), validator);
        if !config.overrides.is_empty() {
            let registry = SourceRegistry::from_settings(&config.overrides, root);
            loader = loader.with_provider(Arc::new(registry));
        }
        Ok(loader)
    }

    pub fn validator(&self) -> &SchemaValidator {
        &self.validator
    }

    /// Resolves a checklist by name, applying its full `extends` chain.
    pub fn load_checklist(&self, name: &str) -> Result<Arc<Checklist>> {
        self.resolve(name, None)
    }

    /// Drops every cached checklist.
    pub fn clear_cache(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        tracing::debug!("Checklist cache cleared");
    }

    pub fn is_cached(&self, name: &str) -> bool {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    pub fn render_checklist(&self, checklist: &Checklist) -> String {
        render_checklist(checklist)
    }

    /// Reports where `name` would be served from: `"core"` or an override
    /// source name.
    pub fn get_checklist_source(&self, name: &str) -> Result<String> {
        Ok(self.locate(name)?.source)
    }

    /// Lists every checklist visible to this loader, ordered by reference
    /// name (`<stem>` or `<category>/<stem>`). Each entry names the source
    /// [`load_checklist`](Self::load_checklist) would serve it from; invalid
    /// core documents stay listed so they fail loudly on load.
    pub fn list_checklists(&self) -> Result<Vec<CatalogEntry>> {
        let mut names = BTreeSet::new();
        for (_, dir) in self.search_order() {
            for path in checklist_files(&dir)? {
                if let Some(name) = reference_name(&dir, &path) {
                    names.insert(name);
                }
            }
        }

        Ok(names
            .into_iter()
            .filter_map(|name| {
                self.first_hit(&name).map(|hit| CatalogEntry {
                    name,
                    source: hit.source,
                    path: hit.path,
                })
            })
            .collect())
    }

    fn resolve(&self, name: &str, chain: Option<&Chain<'_>>) -> Result<Arc<Checklist>> {
        if let Some(cached) = self.cached(name) {
            return Ok(cached);
        }

        if let Some(chain) = chain {
            if chain.contains(name) {
                let mut names = chain.names();
                names.push(name.to_string());
                tracing::error!(chain = %names.join(" -> "), "Circular checklist inheritance");
                return Err(CheckgateError::Inheritance { chain: names });
            }
        }

        let link = Chain {
            name,
            parent: chain,
        };
        let located = self.locate(name)?;
        let mut definition = located.definition.clone();

        let checklist = match definition.extends.take() {
            None => definition.into_checklist(),
            Some(parent_name) => {
                let parent = self.resolve(&parent_name, Some(&link)).map_err(|e| match e {
                    CheckgateError::NotFound(msg) => CheckgateError::NotFound(format!(
                        "{} (extended by '{}')",
                        msg, name
                    )),
                    other => other,
                })?;
                inherit(&parent, definition)
            }
        };

        let checklist = Arc::new(checklist);
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), Arc::clone(&checklist));

        tracing::info!(
            name = %name,
            source = %located.source,
            path = %located.path.display(),
            items = checklist.items.len(),
            "Resolved checklist"
        );

        if located.source != CORE_SOURCE {
            self.notify(&located.source, name, &located.document);
        }

        Ok(checklist)
    }

    fn cached(&self, name: &str) -> Option<Arc<Checklist>> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn notify(&self, source: &str, name: &str, document: &Value) {
        let Some(provider) = &self.provider else {
            return;
        };
        let Some(hook) = provider.get_source(source) else {
            return;
        };
        if let Err(e) = hook.on_checklist_loaded(name, document) {
            tracing::warn!(
                source = %source,
                checklist = %name,
                error = %e,
                "Override source load notification failed"
            );
        }
    }

    /// (source name, directory) pairs in lookup order.
    fn search_order(&self) -> Vec<(String, PathBuf)> {
        let mut order = Vec::new();
        if let Some(provider) = &self.provider {
            for entry in provider.sources() {
                if provider.is_enabled(&entry.name) {
                    order.push((entry.name, entry.directory));
                }
            }
        }
        for dir in &self.core_dirs {
            order.push((CORE_SOURCE.to_string(), dir.clone()));
        }
        order
    }

    /// Walks the search order for `name`. Invalid override documents are
    /// skipped; the first core hit is returned whether or not it is valid.
    fn first_hit(&self, name: &str) -> Option<Hit> {
        for (source, dir) in self.search_order() {
            let Some(path) = find_in_dir(&dir, name) else {
                continue;
            };

            let parsed = self.read_validated(&path);
            if let Err(e) = &parsed {
                if source != CORE_SOURCE {
                    tracing::warn!(
                        name = %name,
                        source = %source,
                        path = %path.display(),
                        error = %e,
                        "Skipping invalid override checklist"
                    );
                    continue;
                }
            }
            return Some(Hit {
                source,
                path,
                parsed,
            });
        }
        None
    }

    fn locate(&self, name: &str) -> Result<Located> {
        if let Some(hit) = self.first_hit(name) {
            let (document, definition) = hit.parsed?;
            tracing::debug!(
                name = %name,
                source = %hit.source,
                path = %hit.path.display(),
                "Located checklist"
            );
            return Ok(Located {
                source: hit.source,
                path: hit.path,
                document,
                definition,
            });
        }

        let available: Vec<String> = self
            .list_checklists()
            .map(|entries| entries.into_iter().map(|e| e.name).collect())
            .unwrap_or_default();
        Err(CheckgateError::NotFound(format!(
            "checklist '{}'. Available: {}",
            name,
            if available.is_empty() {
                "(none)".to_string()
            } else {
                available.join(", ")
            }
        )))
    }

    fn read_validated(&self, path: &Path) -> Result<(Value, ChecklistDefinition)> {
        let content = std::fs::read_to_string(path)?;
        let document: Value = serde_yaml::from_str(&content).map_err(|e| {
            CheckgateError::Validation(vec![format!("{}: invalid YAML: {}", path.display(), e)])
        })?;

        let report = self.validator.validate(&document);
        if !report.is_valid() {
            return Err(CheckgateError::Validation(report.errors));
        }

        let checklist = document
            .get("checklist")
            .cloned()
            .unwrap_or(Value::Null);
        let definition: ChecklistDefinition = serde_json::from_value(checklist)
            .map_err(|e| CheckgateError::Validation(vec![format!("checklist: {}", e)]))?;
        Ok((document, definition))
    }
}

impl std::fmt::Debug for ChecklistLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChecklistLoader")
            .field("core_dirs", &self.core_dirs)
            .field("has_provider", &self.provider.is_some())
            .finish()
    }
}

fn find_in_dir(dir: &Path, name: &str) -> Option<PathBuf> {
    let direct = candidates(dir, name).into_iter().find(|p| p.is_file());
    if direct.is_some() || name.contains('/') {
        return direct;
    }

    let mut subdirs: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    subdirs.sort();
    subdirs
        .iter()
        .flat_map(|sub| candidates(sub, name))
        .find(|p| p.is_file())
}

fn candidates(dir: &Path, name: &str) -> [PathBuf; 2] {
    [
        dir.join(format!("{}.yaml", name)),
        dir.join(format!("{}.yml", name)),
    ]
}

/// Reference name of a file found by [`checklist_files`]: its stem at the top
/// of `dir`, `<category>/<stem>` inside a category subdirectory.
fn reference_name(dir: &Path, path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_string_lossy();
    let parent = path.parent()?;
    if parent == dir {
        return Some(stem.to_string());
    }
    let category = parent.file_name()?.to_string_lossy();
    Some(format!("{}/{}", category, stem))
}

/// YAML files directly in `dir` and one level down.
fn checklist_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    let mut top: Vec<PathBuf> = std::fs::read_dir(dir)?
        .flatten()
        .map(|e| e.path())
        .collect();
    top.sort();

    for path in top {
        if path.is_dir() {
            let mut nested: Vec<PathBuf> = std::fs::read_dir(&path)?
                .flatten()
                .map(|e| e.path())
                .filter(|p| is_yaml_file(p))
                .collect();
            nested.sort();
            files.extend(nested);
        } else if is_yaml_file(&path) {
            files.push(path);
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Severity;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn doc(name: &str, extends: Option<&str>, items: &[(&str, &str, &str)]) -> String {
        let mut out = format!(
            "checklist:\n  name: {}\n  category: story\n  version: 1.0.0\n",
            name
        );
        if let Some(parent) = extends {
            out.push_str(&format!("  extends: {}\n", parent));
        }
        out.push_str("  items:\n");
        for (id, text, severity) in items {
            out.push_str(&format!(
                "    - id: {}\n      text: {}\n      severity: {}\n",
                id, text, severity
            ));
        }
        out
    }

    fn loader(core: &Path) -> ChecklistLoader {
        ChecklistLoader::new(vec![core.to_path_buf()], SchemaValidator::builtin().unwrap())
    }

    #[test]
    fn test_child_extends_base() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "base.yaml",
            &doc("Base", None, &[("item-1", "Base item number one", "high")]),
        );
        write(
            dir.path(),
            "child.yaml",
            &doc(
                "Child",
                Some("base"),
                &[("item-2", "Child item number two", "medium")],
            ),
        );

        let checklist = loader(dir.path()).load_checklist("child").unwrap();
        assert_eq!(checklist.name, "Child");
        assert_eq!(checklist.item_ids(), vec!["item-1", "item-2"]);
        assert_eq!(checklist.items[0].severity, Severity::High);
        assert_eq!(checklist.items[1].severity, Severity::Medium);
    }

    #[test]
    fn test_warm_cache_returns_same_instance() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "story/base.yaml",
            &doc("Base", None, &[("item-1", "Base item number one", "high")]),
        );
        let loader = loader(dir.path());

        let first = loader.load_checklist("base").unwrap();
        let second = loader.load_checklist("base").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        loader.clear_cache();
        let cold = loader.load_checklist("base").unwrap();
        assert!(!Arc::ptr_eq(&first, &cold));
        assert_eq!(*first, *cold);
    }

    #[test]
    fn test_ancestors_are_cached() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "root.yaml",
            &doc("Root", None, &[("r", "Root level item", "low")]),
        );
        write(
            dir.path(),
            "mid.yaml",
            &doc("Mid", Some("root"), &[("m", "Middle level item", "low")]),
        );
        write(
            dir.path(),
            "leaf.yaml",
            &doc("Leaf", Some("mid"), &[("l", "Leaf level item", "low")]),
        );
        let loader = loader(dir.path());

        let leaf = loader.load_checklist("leaf").unwrap();
        assert_eq!(leaf.item_ids(), vec!["r", "m", "l"]);
        assert!(loader.is_cached("mid"));
        assert!(loader.is_cached("root"));
    }

    #[test]
    fn test_two_node_cycle() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "a.yaml",
            &doc("Alpha", Some("b"), &[("x", "Alpha item text", "low")]),
        );
        write(
            dir.path(),
            "b.yaml",
            &doc("Bravo", Some("a"), &[("y", "Bravo item text", "low")]),
        );

        let err = loader(dir.path()).load_checklist("a").unwrap_err();
        match err {
            CheckgateError::Inheritance { chain } => assert_eq!(chain, vec!["a", "b", "a"]),
            other => panic!("expected inheritance error, got {:?}", other),
        }
    }

    #[test]
    fn test_long_cycle_and_nothing_cached() {
        let dir = TempDir::new().unwrap();
        for (file, name, parent, item) in [
            ("a.yaml", "Alpha", "b", "x"),
            ("b.yaml", "Bravo", "c", "y"),
            ("c.yaml", "Charlie", "a", "z"),
        ] {
            write(
                dir.path(),
                file,
                &doc(name, Some(parent), &[(item, "Cycle member item", "low")]),
            );
        }
        let loader = loader(dir.path());

        let err = loader.load_checklist("b").unwrap_err();
        assert!(err.to_string().contains("b -> c -> a -> b"));
        assert!(!loader.is_cached("a"));
        assert!(!loader.is_cached("b"));
    }

    #[test]
    fn test_missing_checklist_lists_available() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "base.yaml",
            &doc("Base", None, &[("x", "Some item text", "low")]),
        );

        let err = loader(dir.path()).load_checklist("nope").unwrap_err();
        assert!(matches!(err, CheckgateError::NotFound(_)));
        assert!(err.to_string().contains("Available: base"));
    }

    #[test]
    fn test_missing_parent_is_not_found() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "child.yaml",
            &doc("Child", Some("ghost"), &[("x", "Some item text", "low")]),
        );

        let err = loader(dir.path()).load_checklist("child").unwrap_err();
        assert!(matches!(err, CheckgateError::NotFound(_)));
        assert!(err.to_string().contains("extended by 'child'"));
    }

    #[test]
    fn test_invalid_core_is_fatal() {
        let dir = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        write(
            dir.path(),
            "gate.yaml",
            &doc("Gate", None, &[("Bad_Id", "short", "urgent")]),
        );
        write(
            second.path(),
            "gate.yaml",
            &doc("Gate", None, &[("ok", "Valid fallback item", "low")]),
        );

        let loader = ChecklistLoader::new(
            vec![dir.path().to_path_buf(), second.path().to_path_buf()],
            SchemaValidator::builtin().unwrap(),
        );
        match loader.load_checklist("gate").unwrap_err() {
            CheckgateError::Validation(errors) => assert_eq!(errors.len(), 3),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    struct Recording {
        name: String,
        loaded: Mutex<Vec<String>>,
        fail: bool,
    }

    impl OverrideSource for Recording {
        fn name(&self) -> &str {
            &self.name
        }

        fn on_checklist_loaded(&self, checklist: &str, _document: &Value) -> Result<()> {
            self.loaded.lock().unwrap().push(checklist.to_string());
            if self.fail {
                return Err(CheckgateError::Config("hook exploded".to_string()));
            }
            Ok(())
        }
    }

    fn register(registry: &SourceRegistry, dir: &Path, name: &str, priority: i32) {
        registry.register(
            SourceEntry {
                directory: dir.to_path_buf(),
                name: name.to_string(),
                priority,
            },
            Arc::new(DirectorySource::new(name)),
            true,
        );
    }

    #[test]
    fn test_priority_wins_and_disable_falls_back() {
        let core = TempDir::new().unwrap();
        let low = TempDir::new().unwrap();
        let high = TempDir::new().unwrap();
        for (dir, name) in [
            (core.path(), "Core Gate"),
            (low.path(), "Low Gate"),
            (high.path(), "High Gate"),
        ] {
            write(dir, "gate.yaml", &doc(name, None, &[("x", "Gate item text", "low")]));
        }

        // Lower priority registered first; priority alone decides the order.
        let registry = Arc::new(SourceRegistry::new());
        register(&registry, low.path(), "low", 10);
        register(&registry, high.path(), "high", 100);
        let loader = loader(core.path()).with_provider(registry.clone());

        assert_eq!(loader.load_checklist("gate").unwrap().name, "High Gate");
        assert_eq!(loader.get_checklist_source("gate").unwrap(), "high");

        registry.set_enabled("high", false).unwrap();
        loader.clear_cache();
        assert_eq!(loader.load_checklist("gate").unwrap().name, "Low Gate");

        registry.set_enabled("low", false).unwrap();
        loader.clear_cache();
        assert_eq!(loader.load_checklist("gate").unwrap().name, "Core Gate");
        assert_eq!(loader.get_checklist_source("gate").unwrap(), CORE_SOURCE);
    }

    #[test]
    fn test_invalid_override_is_skipped() {
        let core = TempDir::new().unwrap();
        let team = TempDir::new().unwrap();
        write(core.path(), "gate.yaml", &core_gate());
        write(team.path(), "gate.yaml", "checklist:\n  name: x\n");

        let registry = Arc::new(SourceRegistry::new());
        register(&registry, team.path(), "team", 10);
        let loader = loader(core.path()).with_provider(registry);

        assert_eq!(loader.load_checklist("gate").unwrap().name, "Core Gate");
        assert_eq!(loader.get_checklist_source("gate").unwrap(), CORE_SOURCE);

        let catalog = loader.list_checklists().unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].source, CORE_SOURCE);
        assert_eq!(catalog[0].path, core.path().join("gate.yaml"));
    }

    #[test]
    fn test_catalog_keeps_invalid_core_entry() {
        let core = TempDir::new().unwrap();
        write(core.path(), "gate.yaml", "checklist:\n  name: x\n");

        let loader = loader(core.path());
        let catalog = loader.list_checklists().unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].name, "gate");
        assert!(matches!(
            loader.load_checklist("gate").unwrap_err(),
            CheckgateError::Validation(_)
        ));
    }

    #[test]
    fn test_override_notification_failure_is_swallowed() {
        let core = TempDir::new().unwrap();
        let team = TempDir::new().unwrap();
        write(
            team.path(),
            "gate.yaml",
            &doc("Team Gate", None, &[("x", "Team item text", "low")]),
        );

        let hook = Arc::new(Recording {
            name: "team".to_string(),
            loaded: Mutex::new(Vec::new()),
            fail: true,
        });
        let registry = Arc::new(SourceRegistry::new());
        registry.register(
            SourceEntry {
                directory: team.path().to_path_buf(),
                name: "team".to_string(),
                priority: 1,
            },
            hook.clone(),
            true,
        );
        let loader = loader(core.path()).with_provider(registry);

        assert_eq!(loader.load_checklist("gate").unwrap().name, "Team Gate");
        assert_eq!(*hook.loaded.lock().unwrap(), vec!["gate".to_string()]);
    }

    fn core_gate() -> String {
        doc("Core Gate", None, &[("x", "Core item text", "low")])
    }

    fn summary(loader: &ChecklistLoader) -> Vec<(String, String)> {
        loader
            .list_checklists()
            .unwrap()
            .into_iter()
            .map(|e| (e.name, e.source))
            .collect()
    }

    #[test]
    fn test_list_checklists_highest_priority_wins() {
        let core = TempDir::new().unwrap();
        let team = TempDir::new().unwrap();
        let zeta = doc("Zeta", None, &[("x", "Zeta item text", "low")]);
        write(core.path(), "story/zeta.yaml", &zeta);
        write(core.path(), "alpha.yml", &doc("Alpha", None, &[("x", "Alpha item text", "low")]));
        write(team.path(), "story/zeta.yaml", &zeta);

        let registry = Arc::new(SourceRegistry::new());
        register(&registry, team.path(), "team", 5);
        let loader = loader(core.path()).with_provider(registry);

        assert_eq!(
            summary(&loader),
            vec![
                ("alpha".to_string(), "core".to_string()),
                ("story/zeta".to_string(), "team".to_string())
            ]
        );
        assert_eq!(loader.get_checklist_source("story/zeta").unwrap(), "team");
    }

    #[test]
    fn test_source_falls_back_past_invalid_override() {
        let core = TempDir::new().unwrap();
        let broken = TempDir::new().unwrap();
        let team = TempDir::new().unwrap();
        write(core.path(), "gate.yaml", &core_gate());
        write(broken.path(), "gate.yaml", "checklist: []\n");
        write(
            team.path(),
            "gate.yaml",
            &doc("Team Gate", None, &[("x", "Team item text", "low")]),
        );

        let registry = Arc::new(SourceRegistry::new());
        register(&registry, team.path(), "team", 10);
        register(&registry, broken.path(), "broken", 50);
        let loader = loader(core.path()).with_provider(registry.clone());

        assert_eq!(loader.get_checklist_source("gate").unwrap(), "team");
        assert_eq!(summary(&loader), vec![("gate".to_string(), "team".to_string())]);

        registry.set_enabled("team", false).unwrap();
        assert_eq!(loader.get_checklist_source("gate").unwrap(), CORE_SOURCE);
        assert_eq!(
            summary(&loader),
            vec![("gate".to_string(), CORE_SOURCE.to_string())]
        );
    }

    #[test]
    fn test_category_qualified_reference() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "story/base.yaml",
            &doc("Story Base", None, &[("x", "Story item text", "low")]),
        );
        write(
            dir.path(),
            "epic/base.yaml",
            &doc("Epic Base", None, &[("x", "Epic item text", "low")]),
        );
        let loader = loader(dir.path());

        assert_eq!(loader.load_checklist("epic/base").unwrap().name, "Epic Base");
        assert_eq!(loader.load_checklist("story/base").unwrap().name, "Story Base");
        // Bare stems search category directories in sorted order.
        assert_eq!(loader.load_checklist("base").unwrap().name, "Epic Base");

        let catalog = loader.list_checklists().unwrap();
        let names: Vec<&str> = catalog.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["epic/base", "story/base"]);
        for entry in &catalog {
            loader.load_checklist(&entry.name).unwrap();
        }

        let err = loader.load_checklist("nope").unwrap_err();
        assert!(err.to_string().contains("Available: epic/base, story/base"));
    }

    #[test]
    fn test_diamond_shares_cached_ancestor() {
        let core = TempDir::new().unwrap();
        let team = TempDir::new().unwrap();
        write(
            team.path(),
            "root.yaml",
            &doc("Root", None, &[("r", "Root level item", "high")]),
        );
        write(
            core.path(),
            "left.yaml",
            &doc("Left", Some("root"), &[("l", "Left branch item", "low")]),
        );
        write(
            core.path(),
            "right.yaml",
            &doc("Right", Some("root"), &[("g", "Right branch item", "low")]),
        );

        let hook = Arc::new(Recording {
            name: "team".to_string(),
            loaded: Mutex::new(Vec::new()),
            fail: false,
        });
        let registry = Arc::new(SourceRegistry::new());
        registry.register(
            SourceEntry {
                directory: team.path().to_path_buf(),
                name: "team".to_string(),
                priority: 1,
            },
            hook.clone(),
            true,
        );
        let loader = loader(core.path()).with_provider(registry);

        let left = loader.load_checklist("left").unwrap();
        let root = loader.load_checklist("root").unwrap();
        let right = loader.load_checklist("right").unwrap();

        assert_eq!(left.item_ids(), vec!["r", "l"]);
        assert_eq!(right.item_ids(), vec!["r", "g"]);
        assert!(Arc::ptr_eq(&root, &loader.load_checklist("root").unwrap()));
        assert_eq!(*hook.loaded.lock().unwrap(), vec!["root".to_string()]);
    }

    #[test]
    fn test_render_is_stable() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "base.yaml",
            &doc("Base", None, &[("x", "Some item text", "high")]),
        );
        let loader = loader(dir.path());

        let first = loader.render_checklist(&loader.load_checklist("base").unwrap());
        loader.clear_cache();
        let second = loader.render_checklist(&loader.load_checklist("base").unwrap());
        assert_eq!(first, second);
        assert_eq!(first, "# Base\n\n- [ ] **[HIGH]** Some item text\n");
    }

    #[test]
    fn test_loader_is_shareable_across_threads() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "base.yaml",
            &doc("Base", None, &[("x", "Some item text", "low")]),
        );
        let loader = Arc::new(loader(dir.path()));
        let resolved = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let loader = Arc::clone(&loader);
                let resolved = Arc::clone(&resolved);
                std::thread::spawn(move || {
                    let checklist = loader.load_checklist("base").unwrap();
                    assert_eq!(checklist.item_ids(), vec!["x"]);
                    resolved.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(resolved.load(Ordering::SeqCst), 4);
    }
}
