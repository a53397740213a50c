use super::{BatchOutcome, ChecklistTracker};
use crate::error::{CheckgateError, Result};
use crate::model::{Metadata, NewExecution, NewItemResult};
use serde::Deserialize;

/// Top-level fields an imported results document must carry.
pub const REQUIRED_IMPORT_FIELDS: [&str; 6] = [
    "checklist_name",
    "checklist_version",
    "artifact_type",
    "artifact_id",
    "executed_by",
    "item_results",
];

#[derive(Debug, Deserialize)]
struct ImportDocument {
    checklist_name: String,
    checklist_version: String,
    artifact_type: String,
    artifact_id: String,
    executed_by: String,
    item_results: Vec<ImportedItem>,
    #[serde(default)]
    epic_num: Option<i64>,
    #[serde(default)]
    story_num: Option<i64>,
    #[serde(default)]
    workflow_id: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    metadata: Metadata,
}

#[derive(Debug, Deserialize)]
struct ImportedItem {
    item_id: String,
    status: String,
    #[serde(default)]
    item_category: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    checked_by: Option<String>,
    #[serde(default)]
    evidence_path: Option<String>,
    #[serde(default)]
    evidence_metadata: Metadata,
}

impl ChecklistTracker {
    /// Records a complete execution from an external JSON document.
    ///
    /// The document is checked for every required field up front; the
    /// recording itself goes through [`ChecklistTracker::track_batch_execution`].
    pub fn import_execution_results(&self, document: &serde_json::Value) -> Result<BatchOutcome> {
        let object = document.as_object().ok_or_else(|| {
            CheckgateError::InvalidArgument("import document must be a JSON object".to_string())
        })?;

        let missing: Vec<&str> = REQUIRED_IMPORT_FIELDS
            .iter()
            .copied()
            .filter(|field| object.get(*field).is_none_or(|v| v.is_null()))
            .collect();
        if !missing.is_empty() {
            return Err(CheckgateError::InvalidArgument(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        let parsed: ImportDocument = serde_json::from_value(document.clone()).map_err(|e| {
            CheckgateError::InvalidArgument(format!("malformed import document: {}", e))
        })?;

        let mut execution = NewExecution::new(
            parsed.checklist_name,
            parsed.checklist_version,
            parsed.artifact_type.parse()?,
            parsed.artifact_id,
            parsed.executed_by,
        )
        .with_metadata(parsed.metadata);
        execution.epic_num = parsed.epic_num;
        execution.story_num = parsed.story_num;
        execution.workflow_id = parsed.workflow_id;

        let items = parsed
            .item_results
            .into_iter()
            .enumerate()
            .map(|(index, item)| -> Result<NewItemResult> {
                let status = item.status.parse().map_err(|e: CheckgateError| {
                    CheckgateError::InvalidArgument(format!("item_results[{}]: {}", index, e))
                })?;
                Ok(NewItemResult {
                    item_id: item.item_id,
                    status,
                    item_category: item.item_category,
                    notes: item.notes,
                    checked_by: item.checked_by,
                    evidence_path: item.evidence_path,
                    evidence_metadata: item.evidence_metadata,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(
            checklist = %execution.checklist_name,
            items = items.len(),
            "Importing execution results"
        );
        self.track_batch_execution(&execution, &items, parsed.notes.as_deref())
    }
}
