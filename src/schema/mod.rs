//! Structural validation of checklist documents.
//!
//! A [`SchemaValidator`] is built once from a declarative rule set (see
//! `schema/checklist-rules.yml`) and then checks parsed documents against it.
//! Validation never fails on a bad document; every violation is collected as a
//! `"<path>: <message>"` string in a [`ValidationReport`].

mod rules;

pub use rules::{BUILTIN_RULES, RuleSet};

use crate::error::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Outcome of validating one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn push(&mut self, path: &str, message: impl AsRef<str>) {
        self.errors.push(format!("{}: {}", path, message.as_ref()));
    }
}

pub struct SchemaValidator {
    rules: RuleSet,
}

impl SchemaValidator {
    /// Validator backed by the rule set embedded in the crate.
    pub fn builtin() -> Result<Self> {
        Ok(Self {
            rules: RuleSet::builtin()?,
        })
    }

    /// Loads the rule set at `path`. Missing or malformed rules are an error.
    pub fn from_path(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading schema rules");
        Ok(Self {
            rules: RuleSet::load(path)?,
        })
    }

    pub fn validate(&self, document: &Value) -> ValidationReport {
        let mut report = ValidationReport::default();

        let Some(root) = document.as_object() else {
            report.push("$", "document must be a mapping");
            return report;
        };
        match root.get("checklist") {
            Some(Value::Object(checklist)) => self.check_checklist(checklist, &mut report),
            Some(_) => report.push("checklist", "must be a mapping"),
            None => report.push("$", "missing required field 'checklist'"),
        }

        report
    }

    /// Reads and validates a YAML file. Read and parse failures are reported
    /// as violations rather than errors.
    pub fn validate_file(&self, path: &Path) -> ValidationReport {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                let mut report = ValidationReport::default();
                report.push(&path.display().to_string(), format!("cannot read file: {}", e));
                return report;
            }
        };
        match serde_yaml::from_str::<Value>(&content) {
            Ok(doc) => self.validate(&doc),
            Err(e) => {
                let mut report = ValidationReport::default();
                report.push(&path.display().to_string(), format!("invalid YAML: {}", e));
                report
            }
        }
    }

    /// Validates every `.yml`/`.yaml` file below `dir`.
    pub fn validate_directory(&self, dir: &Path) -> BTreeMap<PathBuf, ValidationReport> {
        let mut results = BTreeMap::new();
        self.walk(dir, &mut results);
        results
    }

    fn walk(&self, dir: &Path, results: &mut BTreeMap<PathBuf, ValidationReport>) {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %dir.display(), error = %e, "Failed to read directory");
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                self.walk(&path, results);
            } else if is_yaml_file(&path) {
                let report = self.validate_file(&path);
                if !report.is_valid() {
                    tracing::debug!(
                        path = %path.display(),
                        errors = report.errors.len(),
                        "Checklist failed validation"
                    );
                }
                results.insert(path, report);
            }
        }
    }

    fn check_checklist(&self, checklist: &Map<String, Value>, report: &mut ValidationReport) {
        let rules = &self.rules;

        if let Some(name) = require_str(checklist, "checklist", "name", report) {
            let len = name.chars().count();
            if len < rules.name.min_length || len > rules.name.max_length {
                report.push(
                    "checklist.name",
                    format!(
                        "length must be between {} and {} characters (got {})",
                        rules.name.min_length, rules.name.max_length, len
                    ),
                );
            }
        }

        if let Some(category) = require_str(checklist, "checklist", "category", report) {
            if !rules.categories.iter().any(|c| c == category) {
                report.push(
                    "checklist.category",
                    format!(
                        "'{}' is not one of: {}",
                        category,
                        rules.categories.join(", ")
                    ),
                );
            }
        }

        if let Some(version) = require_str(checklist, "checklist", "version", report) {
            if !rules.version.is_match(version) {
                report.push(
                    "checklist.version",
                    format!("'{}' is not a semantic version", version),
                );
            }
        }

        optional_str(checklist, "checklist", "description", report);

        if let Some(parent) = optional_str(checklist, "checklist", "extends", report) {
            if !rules.reference.is_match(parent) {
                report.push(
                    "checklist.extends",
                    format!("'{}' is not a valid checklist reference", parent),
                );
            }
        }

        match checklist.get("items") {
            None => report.push("checklist", "missing required field 'items'"),
            Some(Value::Array(items)) => self.check_items(items, report),
            Some(_) => report.push("checklist.items", "must be a list"),
        }

        if let Some(metadata) = checklist.get("metadata") {
            if !metadata.is_object() {
                report.push("checklist.metadata", "must be a mapping");
            }
        }
    }

    fn check_items(&self, items: &[Value], report: &mut ValidationReport) {
        let rules = &self.rules;

        if items.len() < rules.items.min_items {
            report.push(
                "checklist.items",
                format!("must contain at least {} item(s)", rules.items.min_items),
            );
        }
        if items.len() > rules.items.max_items {
            report.push(
                "checklist.items",
                format!("must contain at most {} items", rules.items.max_items),
            );
        }

        let mut seen = HashSet::new();
        for (index, item) in items.iter().enumerate() {
            let path = format!("checklist.items[{}]", index);
            let Some(item) = item.as_object() else {
                report.push(&path, "must be a mapping");
                continue;
            };

            if let Some(id) = require_str(item, &path, "id", report) {
                if !rules.item_id.is_match(id) {
                    report.push(&format!("{}.id", path), format!("'{}' is not kebab-case", id));
                }
                if !seen.insert(id.to_string()) {
                    report.push(&format!("{}.id", path), format!("duplicate item id '{}'", id));
                }
            }

            if let Some(text) = require_str(item, &path, "text", report) {
                if text.chars().count() < rules.item_text_min_length {
                    report.push(
                        &format!("{}.text", path),
                        format!(
                            "must be at least {} characters",
                            rules.item_text_min_length
                        ),
                    );
                }
            }

            if let Some(severity) = require_str(item, &path, "severity", report) {
                if !rules.severities.iter().any(|s| s == severity) {
                    report.push(
                        &format!("{}.severity", path),
                        format!(
                            "'{}' is not one of: {}",
                            severity,
                            rules.severities.join(", ")
                        ),
                    );
                }
            }

            optional_str(item, &path, "category", report);
            optional_str(item, &path, "help_text", report);

            match item.get("references") {
                None => {}
                Some(Value::Array(refs)) => {
                    for (i, r) in refs.iter().enumerate() {
                        if !r.is_string() {
                            report.push(&format!("{}.references[{}]", path, i), "must be a string");
                        }
                    }
                }
                Some(_) => report.push(&format!("{}.references", path), "must be a list"),
            }
        }
    }
}

fn require_str<'a>(
    object: &'a Map<String, Value>,
    parent: &str,
    field: &str,
    report: &mut ValidationReport,
) -> Option<&'a str> {
    match object.get(field) {
        None | Some(Value::Null) => {
            report.push(parent, format!("missing required field '{}'", field));
            None
        }
        Some(Value::String(s)) => Some(s.as_str()),
        Some(_) => {
            report.push(&format!("{}.{}", parent, field), "must be a string");
            None
        }
    }
}

fn optional_str<'a>(
    object: &'a Map<String, Value>,
    parent: &str,
    field: &str,
    report: &mut ValidationReport,
) -> Option<&'a str> {
    match object.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.as_str()),
        Some(_) => {
            report.push(&format!("{}.{}", parent, field), "must be a string");
            None
        }
    }
}

pub(crate) fn is_yaml_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .map(|e| e == "yml" || e == "yaml")
            .unwrap_or(false)
}
