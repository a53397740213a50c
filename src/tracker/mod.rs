//! Execution tracking.
//!
//! [`ChecklistTracker`] persists checklist executions and their per-item
//! results in a SQLite file. Every operation opens its own connection with
//! foreign keys enforced, so independent trackers (or processes) can share
//! one store.
//!
//! ## Lifecycle
//!
//! ```text
//! track_execution ──► in_progress ──complete_execution──► pass | fail | partial
//!                          ▲
//!               record_item_result (N times)
//! ```
//!
//! [`ChecklistTracker::track_batch_execution`] performs all three steps in one
//! transaction.

mod import;
mod reports;
mod store;

pub use import::REQUIRED_IMPORT_FIELDS;
pub use reports::{
    ChecklistCompliance, ChecklistHistory, ComplianceReport, DateRange, ExecutionResults,
    FailedItemCount, HistoryStats, StatusSummary,
};

use crate::config::CheckgateConfig;
use crate::error::{CheckgateError, Result};
use crate::model::{ExecutionStatus, ItemStatus, NewExecution, NewItemResult};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use store::{connect, initialize_schema, metadata_to_text, parse_timestamp, timestamp};

/// Default wait for a locked store before giving up.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of an all-or-nothing batch recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub execution_id: i64,
    pub status: ExecutionStatus,
    pub item_count: usize,
}

#[derive(Debug, Clone)]
pub struct ChecklistTracker {
    db_path: PathBuf,
    busy_timeout: Duration,
}

impl ChecklistTracker {
    /// Opens (creating if needed) the store at `db_path`.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with_timeout(db_path, DEFAULT_BUSY_TIMEOUT)
    }

    pub fn open_with_timeout(db_path: impl Into<PathBuf>, busy_timeout: Duration) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tracker = Self {
            db_path,
            busy_timeout,
        };
        let conn = tracker.connection()?;
        initialize_schema(&conn)?;
        tracing::debug!(path = %tracker.db_path.display(), "Execution store ready");
        Ok(tracker)
    }

    pub fn from_config(config: &CheckgateConfig, root: &Path) -> Result<Self> {
        Self::open_with_timeout(
            config.database_path(root),
            Duration::from_millis(config.tracker.busy_timeout_ms),
        )
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn connection(&self) -> Result<Connection> {
        connect(&self.db_path, self.busy_timeout)
    }

    /// Starts a new execution in the `in_progress` state and returns its id.
    pub fn track_execution(&self, execution: &NewExecution) -> Result<i64> {
        validate_execution(execution)?;

        let conn = self.connection()?;
        let id = insert_execution(&conn, execution, &timestamp(Utc::now()))?;

        tracing::info!(
            id,
            checklist = %execution.checklist_name,
            artifact_type = %execution.artifact_type,
            artifact_id = %execution.artifact_id,
            "Started checklist execution"
        );
        Ok(id)
    }

    /// Records one item outcome against an in-progress execution.
    ///
    /// The status check and the insert share one immediate transaction, so a
    /// concurrent completion cannot slip in between them.
    pub fn record_item_result(&self, execution_id: i64, result: &NewItemResult) -> Result<i64> {
        validate_item(result)?;

        let mut conn = self.connection()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let status: Option<String> = tx
            .query_row(
                "SELECT overall_status FROM checklist_executions WHERE id = ?1",
                params![execution_id],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(status) = status {
            if status.parse::<ExecutionStatus>()?.is_terminal() {
                return Err(CheckgateError::InvalidArgument(format!(
                    "execution {} is already completed",
                    execution_id
                )));
            }
        }

        // A missing execution is rejected by the foreign key.
        let id = insert_result(&tx, execution_id, result, &timestamp(Utc::now()))?;
        tx.commit()?;

        tracing::debug!(
            execution_id,
            item_id = %result.item_id,
            status = %result.status,
            "Recorded item result"
        );
        Ok(id)
    }

    /// Derives the final status from recorded items and closes the execution.
    pub fn complete_execution(
        &self,
        execution_id: i64,
        notes: Option<&str>,
    ) -> Result<ExecutionStatus> {
        let mut conn = self.connection()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let (executed_at, status): (String, String) = tx
            .query_row(
                "SELECT executed_at, overall_status FROM checklist_executions WHERE id = ?1",
                params![execution_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?
            .ok_or_else(|| CheckgateError::NotFound(format!("execution {}", execution_id)))?;

        if status.parse::<ExecutionStatus>()?.is_terminal() {
            return Err(CheckgateError::InvalidArgument(format!(
                "execution {} is already completed ({})",
                execution_id, status
            )));
        }

        let statuses = item_statuses(&tx, execution_id)?;
        let overall = ExecutionStatus::derive(&statuses).ok_or_else(|| {
            CheckgateError::InvalidArgument(format!(
                "execution {} has no item results recorded",
                execution_id
            ))
        })?;

        let completed_at = Utc::now();
        let duration_ms = (completed_at - parse_timestamp(&executed_at)?)
            .num_milliseconds()
            .max(0);
        tx.execute(
            "UPDATE checklist_executions
             SET overall_status = ?1, completed_at = ?2, duration_ms = ?3,
                 notes = COALESCE(?4, notes)
             WHERE id = ?5",
            params![
                overall.as_str(),
                timestamp(completed_at),
                duration_ms,
                notes,
                execution_id
            ],
        )?;
        tx.commit()?;

        tracing::info!(
            execution_id,
            status = %overall,
            items = statuses.len(),
            duration_ms,
            "Completed checklist execution"
        );
        Ok(overall)
    }

    /// Records an execution, all of its item results and its completion in a
    /// single transaction. Nothing is persisted if any part fails.
    pub fn track_batch_execution(
        &self,
        execution: &NewExecution,
        items: &[NewItemResult],
        notes: Option<&str>,
    ) -> Result<BatchOutcome> {
        validate_execution(execution)?;
        for (index, item) in items.iter().enumerate() {
            validate_item(item).map_err(|e| match e {
                CheckgateError::InvalidArgument(msg) => {
                    CheckgateError::InvalidArgument(format!("item_results[{}]: {}", index, msg))
                }
                other => other,
            })?;
        }
        let statuses: Vec<ItemStatus> = items.iter().map(|i| i.status).collect();
        let overall = ExecutionStatus::derive(&statuses).ok_or_else(|| {
            CheckgateError::InvalidArgument("batch contains no item results".to_string())
        })?;

        let mut conn = self.connection()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        match write_batch(&tx, execution, items, overall, notes) {
            Ok(execution_id) => {
                tx.commit()
                    .map_err(|e| CheckgateError::Rollback(Box::new(e.into())))?;
                tracing::info!(
                    execution_id,
                    checklist = %execution.checklist_name,
                    status = %overall,
                    items = items.len(),
                    "Recorded batch execution"
                );
                Ok(BatchOutcome {
                    execution_id,
                    status: overall,
                    item_count: items.len(),
                })
            }
            Err(e) => {
                tracing::error!(
                    checklist = %execution.checklist_name,
                    error = %e,
                    "Batch execution failed, rolling back"
                );
                if let Err(rollback_err) = tx.rollback() {
                    tracing::error!(error = %rollback_err, "Rollback failed");
                }
                Err(CheckgateError::Rollback(Box::new(e)))
            }
        }
    }
}

fn write_batch(
    tx: &Transaction<'_>,
    execution: &NewExecution,
    items: &[NewItemResult],
    overall: ExecutionStatus,
    notes: Option<&str>,
) -> Result<i64> {
    let started = Utc::now();
    let executed_at = timestamp(started);
    let execution_id = insert_execution(tx, execution, &executed_at)?;

    for item in items {
        insert_result(tx, execution_id, item, &executed_at)?;
    }

    let completed_at = Utc::now();
    let duration_ms = (completed_at - started).num_milliseconds().max(0);
    tx.execute(
        "UPDATE checklist_executions
         SET overall_status = ?1, completed_at = ?2, duration_ms = ?3, notes = ?4
         WHERE id = ?5",
        params![
            overall.as_str(),
            timestamp(completed_at),
            duration_ms,
            notes,
            execution_id
        ],
    )?;
    Ok(execution_id)
}

fn insert_execution(conn: &Connection, execution: &NewExecution, executed_at: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO checklist_executions (
            checklist_name, checklist_version, artifact_type, artifact_id,
            epic_num, story_num, workflow_id, executed_by, executed_at,
            overall_status, metadata
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 'in_progress', ?10)",
        params![
            execution.checklist_name,
            execution.checklist_version,
            execution.artifact_type.as_str(),
            execution.artifact_id,
            execution.epic_num,
            execution.story_num,
            execution.workflow_id,
            execution.executed_by,
            executed_at,
            metadata_to_text(&execution.metadata)?,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn insert_result(
    conn: &Connection,
    execution_id: i64,
    result: &NewItemResult,
    checked_at: &str,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO checklist_results (
            execution_id, item_id, item_category, status, notes,
            checked_at, checked_by, evidence_path, evidence_metadata
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            execution_id,
            result.item_id,
            result.item_category,
            result.status.as_str(),
            result.notes,
            checked_at,
            result.checked_by,
            result.evidence_path,
            metadata_to_text(&result.evidence_metadata)?,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn item_statuses(conn: &Connection, execution_id: i64) -> Result<Vec<ItemStatus>> {
    let mut stmt = conn.prepare(
        "SELECT status FROM checklist_results WHERE execution_id = ?1 ORDER BY checked_at, id",
    )?;
    let raw = stmt
        .query_map(params![execution_id], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    raw.iter().map(|s| s.parse()).collect()
}

fn validate_execution(execution: &NewExecution) -> Result<()> {
    for (field, value) in [
        ("checklist_name", &execution.checklist_name),
        ("checklist_version", &execution.checklist_version),
        ("artifact_id", &execution.artifact_id),
        ("executed_by", &execution.executed_by),
    ] {
        if value.trim().is_empty() {
            return Err(CheckgateError::InvalidArgument(format!(
                "{} cannot be empty",
                field
            )));
        }
    }
    Ok(())
}

fn validate_item(result: &NewItemResult) -> Result<()> {
    if result.item_id.trim().is_empty() {
        return Err(CheckgateError::InvalidArgument(
            "item_id cannot be empty".to_string(),
        ));
    }
    let has_notes = result
        .notes
        .as_deref()
        .is_some_and(|n| !n.trim().is_empty());
    if result.status.requires_notes() && !has_notes {
        return Err(CheckgateError::InvalidArgument(format!(
            "notes are required when status is '{}' (item '{}')",
            result.status, result.item_id
        )));
    }
    Ok(())
}
