use crate::cli::{ArtifactTypeArg, ItemStatusArg};
use crate::model::{ItemStatus, Metadata, NewExecution, NewItemResult};
use anyhow::Result;
use colored::Colorize;

use super::CommandContext;
use super::utils::{format_execution_status, format_item_status};

/// Parameters for starting an execution
pub struct StartParams {
    pub checklist: String,
    pub artifact_type: ArtifactTypeArg,
    pub artifact: String,
    pub by: String,
    pub epic: Option<i64>,
    pub story: Option<i64>,
    pub workflow: Option<String>,
}

pub fn handle_track_start(ctx: &CommandContext, params: StartParams) -> Result<()> {
    // Resolving first pins the version and rejects unknown names.
    let checklist = ctx.loader()?.load_checklist(&params.checklist)?;

    let mut execution = NewExecution::new(
        params.checklist.clone(),
        checklist.version.clone(),
        params.artifact_type.into(),
        params.artifact,
        params.by,
    );
    if let (Some(epic), Some(story)) = (params.epic, params.story) {
        execution = execution.with_story(epic, story);
    }
    if let Some(workflow) = params.workflow {
        execution = execution.with_workflow(workflow);
    }

    let id = ctx.tracker()?.track_execution(&execution)?;
    println!(
        "{} {} {} ({} items)",
        "Started".green(),
        format!("#{}", id).cyan(),
        checklist.name,
        checklist.items.len()
    );
    Ok(())
}

pub fn handle_track_record(
    ctx: &CommandContext,
    id: i64,
    item: String,
    status: ItemStatusArg,
    notes: Option<String>,
    evidence: Option<String>,
) -> Result<()> {
    let status: ItemStatus = status.into();
    let mut result = NewItemResult::new(item.clone(), status);
    if let Some(notes) = notes {
        result = result.with_notes(notes);
    }
    if let Some(path) = evidence {
        result = result.with_evidence(path, Metadata::new());
    }
    if let Ok(user) = std::env::var("CHECKGATE_USER") {
        result = result.with_checked_by(user);
    }

    ctx.tracker()?.record_item_result(id, &result)?;
    println!(
        "{} {} {} on {}",
        "Recorded".green(),
        item,
        format_item_status(status),
        format!("#{}", id).cyan()
    );
    Ok(())
}

pub fn handle_track_complete(ctx: &CommandContext, id: i64, notes: Option<String>) -> Result<()> {
    let status = ctx.tracker()?.complete_execution(id, notes.as_deref())?;
    println!(
        "{} {} is now {}",
        "Completed".green(),
        format!("#{}", id).cyan(),
        format_execution_status(status)
    );
    Ok(())
}
