//! Read-side queries over recorded executions.

use super::ChecklistTracker;
use super::store::{EXECUTION_COLUMNS, ExecutionRow, RESULT_COLUMNS, ResultRow, timestamp};
use crate::error::{CheckgateError, Result};
use crate::model::{ArtifactType, Execution, ExecutionStatus, ItemResult, ItemStatus};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Number of entries in "top failing" and "lowest compliance" lists.
const TOP_N: usize = 5;

/// Inclusive time window applied to `executed_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub total: usize,
    pub pass: usize,
    pub fail: usize,
    pub skip: usize,
    pub na: usize,
}

impl StatusSummary {
    fn from_items(items: &[ItemResult]) -> Self {
        let mut summary = Self {
            total: items.len(),
            ..Self::default()
        };
        for item in items {
            match item.status {
                ItemStatus::Pass => summary.pass += 1,
                ItemStatus::Fail => summary.fail += 1,
                ItemStatus::Skip => summary.skip += 1,
                ItemStatus::Na => summary.na += 1,
            }
        }
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResults {
    pub execution: Execution,
    pub items: Vec<ItemResult>,
    pub summary: StatusSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedItemCount {
    pub item_id: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistoryStats {
    pub total_executions: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub passed: usize,
    pub failed: usize,
    pub partial: usize,
    /// Percentage of completed executions that passed.
    pub pass_rate: f64,
    /// Mean over completed executions only.
    pub average_duration_ms: Option<f64>,
    pub most_failed_items: Vec<FailedItemCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChecklistHistory {
    pub checklist_name: String,
    pub executions: Vec<Execution>,
    pub stats: HistoryStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChecklistCompliance {
    pub checklist_name: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub partial: usize,
    pub pass_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceReport {
    pub artifact_type: Option<ArtifactType>,
    pub total_executions: usize,
    pub passed: usize,
    pub failed: usize,
    pub partial: usize,
    pub overall_pass_rate: f64,
    pub by_checklist: Vec<ChecklistCompliance>,
    /// Checklists with the lowest pass rate, worst first.
    pub lowest_compliance: Vec<ChecklistCompliance>,
}

fn pass_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let rate = passed as f64 / total as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}

impl ChecklistTracker {
    pub fn get_execution(&self, execution_id: i64) -> Result<Execution> {
        let conn = self.connection()?;
        fetch_execution(&conn, execution_id)
    }

    /// An execution with all of its item results in recorded order.
    pub fn get_execution_results(&self, execution_id: i64) -> Result<ExecutionResults> {
        let conn = self.connection()?;
        let execution = fetch_execution(&conn, execution_id)?;
        let items = fetch_results(&conn, execution_id, None)?;
        let summary = StatusSummary::from_items(&items);
        Ok(ExecutionResults {
            execution,
            items,
            summary,
        })
    }

    /// Executions linked to one story, most recent first.
    pub fn get_story_checklists(&self, epic_num: i64, story_num: i64) -> Result<Vec<Execution>> {
        let conn = self.connection()?;
        query_executions(
            &conn,
            "WHERE epic_num = ?1 AND story_num = ?2 ORDER BY executed_at DESC, id DESC",
            params![epic_num, story_num],
        )
    }

    pub fn get_failed_items(&self, execution_id: i64) -> Result<Vec<ItemResult>> {
        let conn = self.connection()?;
        fetch_execution(&conn, execution_id)?;
        fetch_results(&conn, execution_id, Some(ItemStatus::Fail))
    }

    /// The `limit` most recent executions of a checklist. The statistics,
    /// including the most failed items, cover every recorded execution of the
    /// checklist, not only the listed ones.
    pub fn get_checklist_history(
        &self,
        checklist_name: &str,
        limit: usize,
    ) -> Result<ChecklistHistory> {
        let conn = self.connection()?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let executions = query_executions(
            &conn,
            "WHERE checklist_name = ?1 ORDER BY executed_at DESC, id DESC LIMIT ?2",
            params![checklist_name, limit],
        )?;

        let mut stats = HistoryStats::default();
        let mut stmt = conn.prepare(
            "SELECT overall_status, COUNT(*) FROM checklist_executions
             WHERE checklist_name = ?1 GROUP BY overall_status",
        )?;
        let counts = stmt
            .query_map(params![checklist_name], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for (status, n) in counts {
            let n = n as usize;
            stats.total_executions += n;
            match status.parse::<ExecutionStatus>()? {
                ExecutionStatus::InProgress => stats.in_progress += n,
                ExecutionStatus::Pass => stats.passed += n,
                ExecutionStatus::Fail => stats.failed += n,
                ExecutionStatus::Partial => stats.partial += n,
            }
        }
        stats.completed = stats.total_executions - stats.in_progress;
        stats.pass_rate = pass_rate(stats.passed, stats.completed);

        stats.average_duration_ms = conn
            .query_row(
                "SELECT AVG(duration_ms) FROM checklist_executions
                 WHERE checklist_name = ?1 AND completed_at IS NOT NULL",
                params![checklist_name],
                |row| row.get::<_, Option<f64>>(0),
            )
            .optional()?
            .flatten();

        let mut stmt = conn.prepare(
            "SELECT r.item_id, COUNT(*) AS failures
             FROM checklist_results r
             JOIN checklist_executions e ON e.id = r.execution_id
             WHERE e.checklist_name = ?1 AND r.status = 'fail'
             GROUP BY r.item_id
             ORDER BY failures DESC, r.item_id ASC
             LIMIT ?2",
        )?;
        stats.most_failed_items = stmt
            .query_map(params![checklist_name, TOP_N as i64], |row| {
                Ok(FailedItemCount {
                    item_id: row.get(0)?,
                    count: row.get::<_, i64>(1)? as usize,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(ChecklistHistory {
            checklist_name: checklist_name.to_string(),
            executions,
            stats,
        })
    }

    /// Pass rates of completed executions, per checklist and overall.
    pub fn get_compliance_report(
        &self,
        artifact_type: Option<ArtifactType>,
        date_range: Option<DateRange>,
    ) -> Result<ComplianceReport> {
        if let Some(range) = date_range {
            if range.start > range.end {
                return Err(CheckgateError::InvalidArgument(
                    "date range start is after its end".to_string(),
                ));
            }
        }

        let mut sql = String::from(
            "SELECT checklist_name, overall_status, COUNT(*) FROM checklist_executions
             WHERE overall_status != 'in_progress'",
        );
        let mut values: Vec<String> = Vec::new();
        if let Some(t) = artifact_type {
            values.push(t.as_str().to_string());
            sql.push_str(&format!(" AND artifact_type = ?{}", values.len()));
        }
        if let Some(range) = date_range {
            values.push(timestamp(range.start));
            sql.push_str(&format!(" AND executed_at >= ?{}", values.len()));
            values.push(timestamp(range.end));
            sql.push_str(&format!(" AND executed_at <= ?{}", values.len()));
        }
        sql.push_str(" GROUP BY checklist_name, overall_status");

        let conn = self.connection()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut per_checklist: BTreeMap<String, ChecklistCompliance> = BTreeMap::new();
        for (name, status, n) in rows {
            let n = n as usize;
            let entry = per_checklist
                .entry(name.clone())
                .or_insert_with(|| ChecklistCompliance {
                    checklist_name: name,
                    total: 0,
                    passed: 0,
                    failed: 0,
                    partial: 0,
                    pass_rate: 0.0,
                });
            entry.total += n;
            match status.parse::<ExecutionStatus>()? {
                ExecutionStatus::Pass => entry.passed += n,
                ExecutionStatus::Fail => entry.failed += n,
                ExecutionStatus::Partial => entry.partial += n,
                ExecutionStatus::InProgress => {}
            }
        }

        let mut by_checklist: Vec<ChecklistCompliance> = per_checklist.into_values().collect();
        for c in &mut by_checklist {
            c.pass_rate = pass_rate(c.passed, c.total);
        }

        let total_executions = by_checklist.iter().map(|c| c.total).sum();
        let passed = by_checklist.iter().map(|c| c.passed).sum();
        let failed = by_checklist.iter().map(|c| c.failed).sum();
        let partial = by_checklist.iter().map(|c| c.partial).sum();

        let mut lowest_compliance = by_checklist.clone();
        lowest_compliance.sort_by(|a, b| {
            a.pass_rate
                .total_cmp(&b.pass_rate)
                .then_with(|| a.checklist_name.cmp(&b.checklist_name))
        });
        lowest_compliance.truncate(TOP_N);

        Ok(ComplianceReport {
            artifact_type,
            total_executions,
            passed,
            failed,
            partial,
            overall_pass_rate: pass_rate(passed, total_executions),
            by_checklist,
            lowest_compliance,
        })
    }

    /// Required checklists not yet completed for an artifact, in the order given.
    pub fn get_pending_checklists(
        &self,
        artifact_type: ArtifactType,
        artifact_id: &str,
        required: &[String],
    ) -> Result<Vec<String>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT checklist_name FROM checklist_executions
             WHERE artifact_type = ?1 AND artifact_id = ?2 AND overall_status != 'in_progress'",
        )?;
        let done: HashSet<String> = stmt
            .query_map(params![artifact_type.as_str(), artifact_id], |row| row.get(0))?
            .collect::<rusqlite::Result<_>>()?;

        let mut pending: Vec<String> = Vec::new();
        for name in required {
            if !done.contains(name) && !pending.contains(name) {
                pending.push(name.clone());
            }
        }
        Ok(pending)
    }
}

fn fetch_execution(conn: &Connection, execution_id: i64) -> Result<Execution> {
    let sql = format!(
        "SELECT {} FROM checklist_executions WHERE id = ?1",
        EXECUTION_COLUMNS
    );
    conn.query_row(&sql, params![execution_id], ExecutionRow::from_row)
        .optional()?
        .ok_or_else(|| CheckgateError::NotFound(format!("execution {}", execution_id)))?
        .into_execution()
}

fn query_executions(
    conn: &Connection,
    clause: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<Execution>> {
    let sql = format!(
        "SELECT {} FROM checklist_executions {}",
        EXECUTION_COLUMNS, clause
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params, ExecutionRow::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter().map(ExecutionRow::into_execution).collect()
}

fn fetch_results(
    conn: &Connection,
    execution_id: i64,
    status: Option<ItemStatus>,
) -> Result<Vec<ItemResult>> {
    let rows = match status {
        Some(status) => {
            let sql = format!(
                "SELECT {} FROM checklist_results
                 WHERE execution_id = ?1 AND status = ?2 ORDER BY checked_at, id",
                RESULT_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_map(params![execution_id, status.as_str()], ResultRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?
        }
        None => {
            let sql = format!(
                "SELECT {} FROM checklist_results WHERE execution_id = ?1 ORDER BY checked_at, id",
                RESULT_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_map(params![execution_id], ResultRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?
        }
    };
    rows.into_iter().map(ResultRow::into_result).collect()
}
