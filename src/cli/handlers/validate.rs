use crate::schema::ValidationReport;
use anyhow::Result;
use colored::Colorize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::CommandContext;

pub fn handle_validate(ctx: &CommandContext, path: Option<PathBuf>, json: bool) -> Result<()> {
    let loader = ctx.loader()?;
    let validator = loader.validator();

    let mut results: BTreeMap<PathBuf, ValidationReport> = BTreeMap::new();
    match path {
        Some(path) if path.is_dir() => results.extend(validator.validate_directory(&path)),
        Some(path) => {
            let report = validator.validate_file(&path);
            results.insert(path, report);
        }
        None => {
            for dir in target_dirs(ctx) {
                if dir.is_dir() {
                    results.extend(validator.validate_directory(&dir));
                }
            }
        }
    }

    let failed = results.values().filter(|r| !r.is_valid()).count();

    if json {
        let output: BTreeMap<String, &Vec<String>> = results
            .iter()
            .map(|(path, report)| (path.display().to_string(), &report.errors))
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for (path, report) in &results {
            let shown = display_path(path, &ctx.root);
            if report.is_valid() {
                println!("{} {}", "ok".green(), shown);
            } else {
                println!("{} {}", "invalid".red(), shown);
                for error in &report.errors {
                    println!("    {}", error.dimmed());
                }
            }
        }
        if results.is_empty() {
            println!("No checklist files found.");
        }
    }

    if failed > 0 {
        anyhow::bail!(
            "{} of {} checklist files failed validation",
            failed,
            results.len()
        );
    }
    Ok(())
}

/// Core directories first, then enabled override directories.
fn target_dirs(ctx: &CommandContext) -> Vec<PathBuf> {
    let mut dirs = ctx.config.core_dirs(&ctx.root);
    dirs.extend(
        ctx.config
            .overrides
            .iter()
            .filter(|o| o.enabled)
            .map(|o| ctx.root.join(&o.directory)),
    );
    dirs
}

fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}
