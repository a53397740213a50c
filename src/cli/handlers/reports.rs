use crate::cli::ArtifactTypeArg;
use crate::model::ArtifactType;
use crate::tracker::{ChecklistCompliance, DateRange};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use colored::Colorize;

use super::CommandContext;
use super::utils::{print_execution, print_execution_list, print_item_results};

pub fn handle_results(ctx: &CommandContext, id: i64, json: bool) -> Result<()> {
    let results = ctx.tracker()?.get_execution_results(id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    print_execution(&results.execution);
    println!();
    print_item_results(&results.items);
    let s = &results.summary;
    println!(
        "\n{} items: {} pass, {} fail, {} skip, {} na",
        s.total,
        s.pass.to_string().green(),
        s.fail.to_string().red(),
        s.skip.to_string().yellow(),
        s.na
    );
    Ok(())
}

pub fn handle_failed(ctx: &CommandContext, id: i64, json: bool) -> Result<()> {
    let failed = ctx.tracker()?.get_failed_items(id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&failed)?);
    } else if failed.is_empty() {
        println!("No failed items in {}.", format!("#{}", id).cyan());
    } else {
        println!("{} failed items in {}:", failed.len(), format!("#{}", id).cyan());
        print_item_results(&failed);
    }
    Ok(())
}

pub fn handle_history(ctx: &CommandContext, name: String, limit: usize, json: bool) -> Result<()> {
    let history = ctx.tracker()?.get_checklist_history(&name, limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }

    let stats = &history.stats;
    println!("{} {}", "History".bold(), name.cyan());
    println!(
        "Executions: {} ({} completed, {} in progress)",
        stats.total_executions, stats.completed, stats.in_progress
    );
    println!(
        "Outcomes:   {} pass, {} fail, {} partial",
        stats.passed.to_string().green(),
        stats.failed.to_string().red(),
        stats.partial
    );
    println!("Pass rate:  {:.1}%", stats.pass_rate);
    if let Some(avg) = stats.average_duration_ms {
        println!("Avg time:   {:.0} ms", avg);
    }
    if !stats.most_failed_items.is_empty() {
        println!("Most failed:");
        for item in &stats.most_failed_items {
            println!("  {} ({})", item.item_id, item.count.to_string().red());
        }
    }
    println!();
    print_execution_list(&history.executions);
    Ok(())
}

pub fn handle_story(ctx: &CommandContext, epic: i64, story: i64, json: bool) -> Result<()> {
    let executions = ctx.tracker()?.get_story_checklists(epic, story)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&executions)?);
    } else {
        println!("{} {}.{}", "Story".bold(), epic, story);
        print_execution_list(&executions);
    }
    Ok(())
}

/// Optional `--since` / `--until` bounds as given on the command line.
pub struct CompliancePeriod {
    pub since: Option<String>,
    pub until: Option<String>,
}

impl CompliancePeriod {
    /// Whole days, inclusive on both ends. An open end defaults to the
    /// epoch or to now.
    fn to_range(&self) -> Result<Option<DateRange>> {
        if self.since.is_none() && self.until.is_none() {
            return Ok(None);
        }
        let start = match &self.since {
            Some(s) => parse_day(s)?
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc())
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            None => DateTime::<Utc>::UNIX_EPOCH,
        };
        let end = match &self.until {
            Some(s) => parse_day(s)?
                .and_hms_micro_opt(23, 59, 59, 999_999)
                .map(|dt| dt.and_utc())
                .unwrap_or_else(Utc::now),
            None => Utc::now(),
        };
        Ok(Some(DateRange { start, end }))
    }
}

fn parse_day(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", value))
}

pub fn handle_compliance(
    ctx: &CommandContext,
    artifact_type: Option<ArtifactTypeArg>,
    period: CompliancePeriod,
    json: bool,
) -> Result<()> {
    let artifact_type: Option<ArtifactType> = artifact_type.map(Into::into);
    let report = ctx
        .tracker()?
        .get_compliance_report(artifact_type, period.to_range()?)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let scope = artifact_type
        .map(|t| t.to_string())
        .unwrap_or_else(|| "all artifacts".to_string());
    println!("{} ({})", "Compliance".bold(), scope);
    println!(
        "Completed: {}  pass {}  fail {}  partial {}  rate {:.1}%",
        report.total_executions,
        report.passed.to_string().green(),
        report.failed.to_string().red(),
        report.partial,
        report.overall_pass_rate
    );

    if report.by_checklist.is_empty() {
        println!("No completed executions.");
        return Ok(());
    }

    println!();
    for c in &report.by_checklist {
        print_compliance_row(c);
    }
    println!("\nLowest compliance:");
    for c in &report.lowest_compliance {
        print_compliance_row(c);
    }
    Ok(())
}

fn print_compliance_row(c: &ChecklistCompliance) {
    let rate = format!("{:5.1}%", c.pass_rate);
    let rate = if c.pass_rate >= 80.0 {
        rate.green()
    } else if c.pass_rate >= 50.0 {
        rate.yellow()
    } else {
        rate.red()
    };
    println!(
        "  {} {} ({}/{} passed)",
        rate,
        c.checklist_name.cyan(),
        c.passed,
        c.total
    );
}

pub fn handle_pending(
    ctx: &CommandContext,
    artifact_type: ArtifactTypeArg,
    artifact_id: String,
    required: Vec<String>,
    json: bool,
) -> Result<()> {
    let pending =
        ctx.tracker()?
            .get_pending_checklists(artifact_type.into(), &artifact_id, &required)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&pending)?);
    } else if pending.is_empty() {
        println!("{} all required checklists completed", "Done:".green());
    } else {
        for name in &pending {
            println!("{} {}", "pending".yellow(), name);
        }
    }
    Ok(())
}
