use crate::model::{Execution, ExecutionStatus, ItemResult, ItemStatus};
use chrono::{DateTime, Utc};
use colored::Colorize;

/// Format execution status with color coding
pub fn format_execution_status(status: ExecutionStatus) -> colored::ColoredString {
    match status {
        ExecutionStatus::InProgress => "in_progress".yellow(),
        ExecutionStatus::Pass => "pass".green(),
        ExecutionStatus::Fail => "fail".red().bold(),
        ExecutionStatus::Partial => "partial".blue(),
    }
}

/// Format item status with color coding
pub fn format_item_status(status: ItemStatus) -> colored::ColoredString {
    match status {
        ItemStatus::Pass => "pass".green(),
        ItemStatus::Fail => "fail".red(),
        ItemStatus::Skip => "skip".yellow(),
        ItemStatus::Na => "na".dimmed(),
    }
}

pub fn format_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

/// Print a single execution with details
pub fn print_execution(execution: &Execution) {
    println!(
        "{} {} {}",
        format!("#{}", execution.id).cyan().bold(),
        execution.checklist_name.bold(),
        format!("v{}", execution.checklist_version).dimmed()
    );
    println!(
        "Artifact: {} {}",
        execution.artifact_type.to_string().blue(),
        execution.artifact_id
    );
    if let (Some(epic), Some(story)) = (execution.epic_num, execution.story_num) {
        println!("Story:    {}.{}", epic, story);
    }
    if let Some(ref workflow) = execution.workflow_id {
        println!("Workflow: {}", workflow);
    }
    println!("Status:   {}", format_execution_status(execution.overall_status));
    println!("By:       {}", execution.executed_by);
    println!("Started:  {}", format_time(execution.executed_at).dimmed());
    if let Some(completed) = execution.completed_at {
        println!("Finished: {}", format_time(completed).dimmed());
    }
    if let Some(ms) = execution.duration_ms {
        println!("Duration: {} ms", ms);
    }
    if let Some(ref notes) = execution.notes {
        println!();
        println!("{}", notes);
    }
}

/// Print a list of executions (compact format)
pub fn print_execution_list(executions: &[Execution]) {
    if executions.is_empty() {
        println!("No executions found.");
        return;
    }

    for execution in executions {
        println!(
            "{} {} {} [{} {}] {}",
            format!("#{}", execution.id).cyan(),
            format_execution_status(execution.overall_status),
            execution.checklist_name,
            execution.artifact_type.to_string().blue(),
            execution.artifact_id,
            format_time(execution.executed_at).dimmed()
        );
    }
}

pub fn print_item_results(items: &[ItemResult]) {
    if items.is_empty() {
        println!("No item results recorded.");
        return;
    }

    for item in items {
        print!("  {} {}", format_item_status(item.status), item.item_id);
        if let Some(ref notes) = item.notes {
            print!(" - {}", notes.dimmed());
        }
        println!();
        if let Some(ref evidence) = item.evidence_path {
            println!("      evidence: {}", evidence);
        }
    }
}
