use super::types::Severity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Open key/value metadata attached to checklists and executions.
pub type Metadata = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub text: String,
    pub severity: Severity,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
}

impl ChecklistItem {
    pub fn new(id: impl Into<String>, text: impl Into<String>, severity: Severity) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            severity,
            category: None,
            help_text: None,
            references: Vec::new(),
        }
    }

    pub fn with_help_text(mut self, help_text: impl Into<String>) -> Self {
        self.help_text = Some(help_text.into());
        self
    }
}

/// A fully resolved checklist. Inheritance has already been applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checklist {
    pub name: String,
    pub category: String,
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub items: Vec<ChecklistItem>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
}

impl Checklist {
    pub fn item_ids(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.id.as_str()).collect()
    }
}

/// A checklist as written by its author, before `extends` is resolved.
#[derive(Debug, Clone, Deserialize)]
pub struct ChecklistDefinition {
    pub name: String,
    pub category: String,
    pub version: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub extends: Option<String>,

    pub items: Vec<ChecklistItem>,

    #[serde(default)]
    pub metadata: Metadata,
}

impl ChecklistDefinition {
    /// Converts a definition with no parent into a resolved checklist,
    /// dropping the `extends` reference.
    pub fn into_checklist(self) -> Checklist {
        Checklist {
            name: self.name,
            category: self.category,
            version: self.version,
            description: self.description,
            items: self.items,
            metadata: self.metadata,
        }
    }
}
