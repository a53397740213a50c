mod import;
mod init;
mod list;
mod reports;
mod show;
mod track;
mod utils;
mod validate;

pub use import::handle_import;
pub use init::handle_init;
pub use list::handle_list;
pub use reports::{
    CompliancePeriod, handle_compliance, handle_failed, handle_history, handle_pending,
    handle_results, handle_story,
};
pub use show::{handle_show, handle_source};
pub use track::{StartParams, handle_track_complete, handle_track_record, handle_track_start};
pub use validate::handle_validate;

use crate::config::CheckgateConfig;
use crate::loader::ChecklistLoader;
use crate::tracker::ChecklistTracker;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Common context passed to all command handlers
pub struct CommandContext {
    pub config: CheckgateConfig,
    pub root: PathBuf,
}

impl CommandContext {
    pub fn new(config: CheckgateConfig, root: PathBuf) -> Self {
        Self { config, root }
    }

    /// Loads the project config, from an explicit file or by searching upward from `cwd`.
    pub fn discover(config_path: Option<&Path>, cwd: &Path) -> Result<Self> {
        let (config, root) = match config_path {
            Some(path) => {
                let config = CheckgateConfig::load_from(path)
                    .with_context(|| format!("Failed to load {}", path.display()))?;
                let root = path
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| cwd.to_path_buf());
                (config, root)
            }
            None => CheckgateConfig::load(cwd).context("Failed to load checkgate configuration")?,
        };
        Ok(Self::new(config, root))
    }

    pub fn loader(&self) -> Result<ChecklistLoader> {
        ChecklistLoader::from_config(&self.config, &self.root)
            .context("Failed to set up checklist loader")
    }

    pub fn tracker(&self) -> Result<ChecklistTracker> {
        ChecklistTracker::from_config(&self.config, &self.root)
            .context("Failed to open execution store")
    }
}
