use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScripError};
use crate::gateway::IN_MEMORY;

/// Default data directory, relative to the working directory.
pub const DATA_DIR: &str = ".scrip";
const CONFIG_FILE: &str = "config.yaml";

/// Settings read from `config.yaml` in the data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database file, relative to the data directory, or `:memory:`.
    pub database: String,
    /// How long a note edit waits before it is written.
    pub autosave_delay_ms: u64,
    /// Suggested file name when exporting.
    pub export_file_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: "main.db".to_string(),
            autosave_delay_ms: 10_000,
            export_file_name: "streak_data_export.json".to_string(),
        }
    }
}

impl Config {
    /// Load `config.yaml` from `data_dir`, falling back to defaults when absent.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(&path)?;
        serde_yaml::from_str(&text)
            .map_err(|e| ScripError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Write this config to `data_dir/config.yaml`.
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let text = serde_yaml::to_string(self).map_err(|e| ScripError::Config(e.to_string()))?;
        fs::write(data_dir.join(CONFIG_FILE), text)?;
        Ok(())
    }

    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }

    /// Connection target for the gateway.
    pub fn database_target(&self, data_dir: &Path) -> String {
        if self.database == IN_MEMORY {
            return self.database.clone();
        }
        let path = PathBuf::from(&self.database);
        if path.is_absolute() {
            path.to_string_lossy().into_owned()
        } else {
            data_dir.join(path).to_string_lossy().into_owned()
        }
    }
}
