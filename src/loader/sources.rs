//! Override sources: priority-ranked directories that can supersede core
//! checklist definitions by name.

use crate::config::OverrideSettings;
use crate::error::{CheckgateError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// Name reported for checklists served from the core directories.
pub const CORE_SOURCE: &str = "core";

/// A directory contributed by an override source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceEntry {
    pub directory: PathBuf,
    pub name: String,
    pub priority: i32,
}

/// Callback surface of an override source.
pub trait OverrideSource: Send + Sync {
    fn name(&self) -> &str;

    /// Called after a checklist served from this source has been resolved.
    fn on_checklist_loaded(&self, checklist: &str, document: &serde_json::Value) -> Result<()>;
}

/// Supplies override sources to the loader.
pub trait SourceProvider: Send + Sync {
    /// All known sources, highest priority first.
    fn sources(&self) -> Vec<SourceEntry>;

    fn is_enabled(&self, name: &str) -> bool;

    fn get_source(&self, name: &str) -> Option<Arc<dyn OverrideSource>>;
}

/// Override source backed by a plain directory with no load behavior.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    name: String,
}

impl DirectorySource {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl OverrideSource for DirectorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_checklist_loaded(&self, checklist: &str, _document: &serde_json::Value) -> Result<()> {
        tracing::debug!(source = %self.name, checklist = %checklist, "Override checklist loaded");
        Ok(())
    }
}

struct Registered {
    entry: SourceEntry,
    enabled: bool,
    source: Arc<dyn OverrideSource>,
}

/// In-process [`SourceProvider`] with runtime enable/disable.
#[derive(Default)]
pub struct SourceRegistry {
    entries: RwLock<Vec<Registered>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from `[[overrides]]` config sections. Relative
    /// directories resolve against `root`.
    pub fn from_settings(settings: &[OverrideSettings], root: &Path) -> Self {
        let registry = Self::new();
        for s in settings {
            let directory = root.join(&s.directory);
            registry.register(
                SourceEntry {
                    directory,
                    name: s.name.clone(),
                    priority: s.priority,
                },
                Arc::new(DirectorySource::new(&s.name)),
                s.enabled,
            );
        }
        registry
    }

    /// Registers a source. A source with the same name is replaced.
    pub fn register(&self, entry: SourceEntry, source: Arc<dyn OverrideSource>, enabled: bool) {
        tracing::debug!(
            source = %entry.name,
            priority = entry.priority,
            enabled,
            "Registering override source"
        );
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|r| r.entry.name != entry.name);
        entries.push(Registered {
            entry,
            enabled,
            source,
        });
    }

    pub fn set_enabled(&self, name: &str, enabled: bool) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let registered = entries
            .iter_mut()
            .find(|r| r.entry.name == name)
            .ok_or_else(|| CheckgateError::NotFound(format!("override source '{}'", name)))?;
        registered.enabled = enabled;
        tracing::info!(source = %name, enabled, "Override source toggled");
        Ok(())
    }
}

impl SourceProvider for SourceRegistry {
    fn sources(&self) -> Vec<SourceEntry> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut sources: Vec<SourceEntry> = entries.iter().map(|r| r.entry.clone()).collect();
        // Stable sort keeps registration order among equal priorities.
        sources.sort_by(|a, b| b.priority.cmp(&a.priority));
        sources
    }

    fn is_enabled(&self, name: &str) -> bool {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .any(|r| r.entry.name == name && r.enabled)
    }

    fn get_source(&self, name: &str) -> Option<Arc<dyn OverrideSource>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .find(|r| r.entry.name == name)
            .map(|r| Arc::clone(&r.source))
    }
}
