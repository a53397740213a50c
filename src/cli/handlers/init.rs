use crate::config::{CONFIG_FILE, CheckgateConfig, ChecklistSettings};
use crate::error::CheckgateError;
use anyhow::Result;
use colored::Colorize;
use std::path::Path;

const STARTER_FILE: &str = "story-done.yaml";

const STARTER_CHECKLIST: &str = r#"checklist:
  name: Story Definition of Done
  category: story
  version: "1.0.0"
  description: Gate applied before a story is marked done.
  items:
    - id: acceptance-criteria
      text: All acceptance criteria are met and demonstrated
      severity: critical
    - id: tests-pass
      text: Unit and integration tests pass in CI
      severity: critical
      help_text: Include the CI run link as evidence.
    - id: code-reviewed
      text: Changes were reviewed and approved by a peer
      severity: high
    - id: docs-updated
      text: User-facing documentation reflects the change
      severity: medium
"#;

pub fn handle_init(checklists_dir: String, bare: bool) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let config_path = cwd.join(CONFIG_FILE);

    ensure_uninitialized(&config_path)?;

    let config = CheckgateConfig {
        checklists: ChecklistSettings {
            core_dirs: vec![checklists_dir.clone()],
            schema: None,
        },
        ..Default::default()
    };

    let data_path = cwd.join(&checklists_dir);
    std::fs::create_dir_all(&data_path)?;

    let starter = data_path.join(STARTER_FILE);
    if !bare && !starter.exists() {
        std::fs::write(&starter, STARTER_CHECKLIST)?;
    }

    config.save(&config_path)?;
    tracing::info!(root = %cwd.display(), "Initialized project");

    println!(
        "{} checkgate project in {}",
        "Initialized".green(),
        cwd.display()
    );
    println!("  Config:     {}", config_path.display());
    println!("  Checklists: {}", data_path.display());
    println!("  Store:      {}", config.database_path(&cwd).display());

    Ok(())
}

fn ensure_uninitialized(config_path: &Path) -> crate::error::Result<()> {
    if config_path.exists() {
        return Err(CheckgateError::AlreadyInitialized(
            config_path.display().to_string(),
        ));
    }
    Ok(())
}
