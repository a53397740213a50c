use crate::error::{CheckgateError, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = "checkgate.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckgateConfig {
    #[serde(default)]
    pub checklists: ChecklistSettings,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<OverrideSettings>,

    #[serde(default)]
    pub tracker: TrackerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistSettings {
    /// Core checklist directories, searched in order.
    #[serde(default = "default_core_dirs")]
    pub core_dirs: Vec<String>,

    /// Custom schema rule file. The built-in rules are used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

fn default_core_dirs() -> Vec<String> {
    vec!["checklists".to_string()]
}

impl Default for ChecklistSettings {
    fn default() -> Self {
        Self {
            core_dirs: default_core_dirs(),
            schema: None,
        }
    }
}

/// An override source directory, ranked by priority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideSettings {
    pub name: String,
    pub directory: String,

    #[serde(default)]
    pub priority: i32,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerSettings {
    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_database() -> String {
    ".checkgate/executions.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            database: default_database(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl CheckgateConfig {
    /// Finds and loads the config file by walking up from `start_path`.
    /// Returns the config and the project root (the config file's directory).
    pub fn load(start_path: &Path) -> Result<(Self, PathBuf)> {
        let config_path = Self::find_config_file(start_path)?;
        let config = Self::load_from(&config_path)?;
        let project_root = config_path
            .parent()
            .ok_or_else(|| {
                CheckgateError::Config("Config file has no parent directory".to_string())
            })?
            .to_path_buf();
        Ok((config, project_root))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CheckgateConfig = toml::from_str(&content)?;
        config.check()?;
        Ok(config)
    }

    pub fn find_config_file(start_path: &Path) -> Result<PathBuf> {
        let mut current = start_path.to_path_buf();
        loop {
            let config_path = current.join(CONFIG_FILE);
            if config_path.exists() {
                return Ok(config_path);
            }
            if !current.pop() {
                return Err(CheckgateError::NotInitialized);
            }
        }
    }

    fn check(&self) -> Result<()> {
        if self.checklists.core_dirs.is_empty() {
            return Err(CheckgateError::Config(
                "checklists.core_dirs must list at least one directory".to_string(),
            ));
        }
        let mut names = std::collections::HashSet::new();
        for o in &self.overrides {
            if o.name.trim().is_empty() {
                return Err(CheckgateError::Config(
                    "override source name cannot be empty".to_string(),
                ));
            }
            if o.name == crate::loader::CORE_SOURCE {
                return Err(CheckgateError::Config(format!(
                    "override source name '{}' is reserved",
                    o.name
                )));
            }
            if !names.insert(o.name.as_str()) {
                return Err(CheckgateError::Config(format!(
                    "duplicate override source '{}'",
                    o.name
                )));
            }
        }
        Ok(())
    }

    pub fn core_dirs(&self, project_root: &Path) -> Vec<PathBuf> {
        self.checklists
            .core_dirs
            .iter()
            .map(|d| project_root.join(d))
            .collect()
    }

    pub fn schema_path(&self, project_root: &Path) -> Option<PathBuf> {
        self.checklists
            .schema
            .as_ref()
            .map(|s| project_root.join(s))
    }

    pub fn database_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.tracker.database)
    }

    /// Writes the config atomically: temp file in the same directory, then rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CheckgateError::Config(format!("Failed to serialize config: {}", e)))?;
        let dir = path
            .parent()
            .ok_or_else(|| CheckgateError::Config("Config path has no parent".to_string()))?;

        let mut temp_file = NamedTempFile::new_in(dir)?;
        temp_file.write_all(content.as_bytes())?;
        temp_file.as_file().sync_all()?;
        temp_file
            .persist(path)
            .map_err(|e| CheckgateError::Config(format!("Failed to persist config: {}", e)))?;
        Ok(())
    }
}
