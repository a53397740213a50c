use anyhow::{Context, Result};
use colored::Colorize;
use std::io::{self, Read};

use super::CommandContext;
use super::utils::format_execution_status;

pub fn handle_import(ctx: &CommandContext, file: String, json: bool) -> Result<()> {
    let content = if file == "-" {
        let mut content = String::new();
        io::stdin().read_to_string(&mut content)?;
        content
    } else {
        std::fs::read_to_string(&file).with_context(|| format!("Failed to read {}", file))?
    };

    let document: serde_json::Value =
        serde_json::from_str(&content).with_context(|| format!("{} is not valid JSON", file))?;
    let outcome = ctx.tracker()?.import_execution_results(&document)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!(
            "{} {} with {} items: {}",
            "Imported".green(),
            format!("#{}", outcome.execution_id).cyan(),
            outcome.item_count,
            format_execution_status(outcome.status)
        );
    }
    Ok(())
}
