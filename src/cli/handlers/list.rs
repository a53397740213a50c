use crate::loader::CORE_SOURCE;
use anyhow::Result;
use colored::Colorize;

use super::CommandContext;

pub fn handle_list(ctx: &CommandContext, json: bool) -> Result<()> {
    let catalog = ctx.loader()?.list_checklists()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    if catalog.is_empty() {
        println!("No checklists found.");
        return Ok(());
    }

    let width = catalog.iter().map(|e| e.name.len()).max().unwrap_or(0);
    for entry in &catalog {
        let source = if entry.source == CORE_SOURCE {
            entry.source.dimmed()
        } else {
            entry.source.magenta()
        };
        println!(
            "{}  [{}]  {}",
            format!("{:width$}", entry.name, width = width).cyan(),
            source,
            entry
                .path
                .strip_prefix(&ctx.root)
                .unwrap_or(&entry.path)
                .display()
        );
    }
    Ok(())
}
