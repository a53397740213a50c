use crate::error::{CheckgateError, Result};
use crate::model::{Execution, ItemResult, Metadata};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, Row};
use std::path::Path;
use std::time::Duration;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS checklist_executions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        checklist_name TEXT NOT NULL,
        checklist_version TEXT NOT NULL,
        artifact_type TEXT NOT NULL
            CHECK(artifact_type IN ('story', 'epic', 'prd', 'architecture', 'code')),
        artifact_id TEXT NOT NULL,
        epic_num INTEGER,
        story_num INTEGER,
        workflow_id TEXT,
        executed_by TEXT NOT NULL,
        executed_at TEXT NOT NULL,
        completed_at TEXT,
        overall_status TEXT NOT NULL DEFAULT 'in_progress'
            CHECK(overall_status IN ('in_progress', 'pass', 'fail', 'partial')),
        duration_ms INTEGER,
        notes TEXT,
        metadata TEXT NOT NULL DEFAULT '{}'
    );

    CREATE TABLE IF NOT EXISTS checklist_results (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        execution_id INTEGER NOT NULL
            REFERENCES checklist_executions(id) ON DELETE CASCADE,
        item_id TEXT NOT NULL,
        item_category TEXT,
        status TEXT NOT NULL CHECK(status IN ('pass', 'fail', 'skip', 'na')),
        notes TEXT,
        checked_at TEXT NOT NULL,
        checked_by TEXT,
        evidence_path TEXT,
        evidence_metadata TEXT NOT NULL DEFAULT '{}'
    );

    CREATE INDEX IF NOT EXISTS idx_executions_checklist ON checklist_executions(checklist_name);
    CREATE INDEX IF NOT EXISTS idx_executions_artifact ON checklist_executions(artifact_type, artifact_id);
    CREATE INDEX IF NOT EXISTS idx_executions_story ON checklist_executions(epic_num, story_num);
    CREATE INDEX IF NOT EXISTS idx_executions_status ON checklist_executions(overall_status);
    CREATE INDEX IF NOT EXISTS idx_executions_executed_at ON checklist_executions(executed_at);
    CREATE INDEX IF NOT EXISTS idx_results_execution_status ON checklist_results(execution_id, status);
";

pub(crate) const EXECUTION_COLUMNS: &str = "id, checklist_name, checklist_version, artifact_type, \
     artifact_id, epic_num, story_num, workflow_id, executed_by, executed_at, completed_at, \
     overall_status, duration_ms, notes, metadata";

pub(crate) const RESULT_COLUMNS: &str = "id, execution_id, item_id, item_category, status, notes, \
     checked_at, checked_by, evidence_path, evidence_metadata";

/// Opens a connection with foreign keys enforced and the given busy timeout.
pub(crate) fn connect(path: &Path, busy_timeout: Duration) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(busy_timeout)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    Ok(conn)
}

/// Creates tables and indexes. Safe to run on every open.
pub(crate) fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Fixed-width UTC timestamps so text ordering matches time ordering.
pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CheckgateError::Parse(format!("Invalid timestamp '{}': {}", value, e)))
}

pub(crate) fn metadata_to_text(metadata: &Metadata) -> Result<String> {
    Ok(serde_json::to_string(metadata)?)
}

fn metadata_from_text(text: &str) -> Result<Metadata> {
    if text.trim().is_empty() {
        return Ok(Metadata::new());
    }
    Ok(serde_json::from_str(text)?)
}

/// Raw execution row, converted to [`Execution`] outside the rusqlite callback.
pub(crate) struct ExecutionRow {
    id: i64,
    checklist_name: String,
    checklist_version: String,
    artifact_type: String,
    artifact_id: String,
    epic_num: Option<i64>,
    story_num: Option<i64>,
    workflow_id: Option<String>,
    executed_by: String,
    executed_at: String,
    completed_at: Option<String>,
    overall_status: String,
    duration_ms: Option<i64>,
    notes: Option<String>,
    metadata: String,
}

impl ExecutionRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            checklist_name: row.get(1)?,
            checklist_version: row.get(2)?,
            artifact_type: row.get(3)?,
            artifact_id: row.get(4)?,
            epic_num: row.get(5)?,
            story_num: row.get(6)?,
            workflow_id: row.get(7)?,
            executed_by: row.get(8)?,
            executed_at: row.get(9)?,
            completed_at: row.get(10)?,
            overall_status: row.get(11)?,
            duration_ms: row.get(12)?,
            notes: row.get(13)?,
            metadata: row.get(14)?,
        })
    }

    pub(crate) fn into_execution(self) -> Result<Execution> {
        Ok(Execution {
            id: self.id,
            checklist_name: self.checklist_name,
            checklist_version: self.checklist_version,
            artifact_type: self.artifact_type.parse()?,
            artifact_id: self.artifact_id,
            epic_num: self.epic_num,
            story_num: self.story_num,
            workflow_id: self.workflow_id,
            executed_by: self.executed_by,
            executed_at: parse_timestamp(&self.executed_at)?,
            completed_at: self
                .completed_at
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
            overall_status: self.overall_status.parse()?,
            duration_ms: self.duration_ms,
            notes: self.notes,
            metadata: metadata_from_text(&self.metadata)?,
        })
    }
}

pub(crate) struct ResultRow {
    id: i64,
    execution_id: i64,
    item_id: String,
    item_category: Option<String>,
    status: String,
    notes: Option<String>,
    checked_at: String,
    checked_by: Option<String>,
    evidence_path: Option<String>,
    evidence_metadata: String,
}

impl ResultRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            execution_id: row.get(1)?,
            item_id: row.get(2)?,
            item_category: row.get(3)?,
            status: row.get(4)?,
            notes: row.get(5)?,
            checked_at: row.get(6)?,
            checked_by: row.get(7)?,
            evidence_path: row.get(8)?,
            evidence_metadata: row.get(9)?,
        })
    }

    pub(crate) fn into_result(self) -> Result<ItemResult> {
        Ok(ItemResult {
            id: self.id,
            execution_id: self.execution_id,
            item_id: self.item_id,
            item_category: self.item_category,
            status: self.status.parse()?,
            notes: self.notes,
            checked_at: parse_timestamp(&self.checked_at)?,
            checked_by: self.checked_by,
            evidence_path: self.evidence_path,
            evidence_metadata: metadata_from_text(&self.evidence_metadata)?,
        })
    }
}
