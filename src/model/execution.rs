use super::checklist::Metadata;
use super::types::{ArtifactType, ExecutionStatus, ItemStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded run of a checklist against one artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub id: i64,
    pub checklist_name: String,
    pub checklist_version: String,
    pub artifact_type: ArtifactType,
    pub artifact_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epic_num: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_num: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,

    pub executed_by: String,
    pub executed_at: DateTime<Utc>,

    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,

    pub overall_status: ExecutionStatus,

    #[serde(default)]
    pub duration_ms: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default)]
    pub metadata: Metadata,
}

/// Recorded outcome of one checklist item within an execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResult {
    pub id: i64,
    pub execution_id: i64,
    pub item_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_category: Option<String>,

    pub status: ItemStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub checked_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_path: Option<String>,

    #[serde(default)]
    pub evidence_metadata: Metadata,
}

/// Parameters for starting a new execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExecution {
    pub checklist_name: String,
    pub checklist_version: String,
    pub artifact_type: ArtifactType,
    pub artifact_id: String,
    pub executed_by: String,

    #[serde(default)]
    pub epic_num: Option<i64>,

    #[serde(default)]
    pub story_num: Option<i64>,

    #[serde(default)]
    pub workflow_id: Option<String>,

    #[serde(default)]
    pub metadata: Metadata,
}

impl NewExecution {
    pub fn new(
        checklist_name: impl Into<String>,
        checklist_version: impl Into<String>,
        artifact_type: ArtifactType,
        artifact_id: impl Into<String>,
        executed_by: impl Into<String>,
    ) -> Self {
        Self {
            checklist_name: checklist_name.into(),
            checklist_version: checklist_version.into(),
            artifact_type,
            artifact_id: artifact_id.into(),
            executed_by: executed_by.into(),
            epic_num: None,
            story_num: None,
            workflow_id: None,
            metadata: Metadata::new(),
        }
    }

    pub fn with_story(mut self, epic_num: i64, story_num: i64) -> Self {
        self.epic_num = Some(epic_num);
        self.story_num = Some(story_num);
        self
    }

    pub fn with_workflow(mut self, workflow_id: impl Into<String>) -> Self {
        self.workflow_id = Some(workflow_id.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Parameters for recording one item outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItemResult {
    pub item_id: String,
    pub status: ItemStatus,

    #[serde(default)]
    pub item_category: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,

    #[serde(default)]
    pub checked_by: Option<String>,

    #[serde(default)]
    pub evidence_path: Option<String>,

    #[serde(default)]
    pub evidence_metadata: Metadata,
}

impl NewItemResult {
    pub fn new(item_id: impl Into<String>, status: ItemStatus) -> Self {
        Self {
            item_id: item_id.into(),
            status,
            item_category: None,
            notes: None,
            checked_by: None,
            evidence_path: None,
            evidence_metadata: Metadata::new(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_checked_by(mut self, checked_by: impl Into<String>) -> Self {
        self.checked_by = Some(checked_by.into());
        self
    }

    pub fn with_evidence(mut self, path: impl Into<String>, metadata: Metadata) -> Self {
        self.evidence_path = Some(path.into());
        self.evidence_metadata = metadata;
        self
    }
}
