//! Export and import of the raw `scrips` rows as a JSON file.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::row::ScripRow;

/// Extension offered by the file pickers.
pub const EXPORT_EXTENSION: &str = "json";

/// Something that lets the user choose a file. `None` means the user cancelled.
pub trait PathPicker: Send + Sync {
    fn pick_save_path(&self, default_name: &str, extension: &str) -> Option<PathBuf>;
    fn pick_open_path(&self, extension: &str) -> Option<PathBuf>;
}

/// Picker with a path decided up front, e.g. from a command-line flag.
#[derive(Debug, Clone, Default)]
pub struct PresetPicker {
    path: Option<PathBuf>,
}

impl PresetPicker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A picker that always reports cancellation.
    pub fn cancelled() -> Self {
        Self { path: None }
    }
}

impl PathPicker for PresetPicker {
    fn pick_save_path(&self, _default_name: &str, _extension: &str) -> Option<PathBuf> {
        self.path.clone()
    }

    fn pick_open_path(&self, _extension: &str) -> Option<PathBuf> {
        self.path.clone()
    }
}

pub(crate) async fn write_rows(path: &Path, rows: &[ScripRow]) -> Result<()> {
    let text = serde_json::to_string_pretty(rows)?;
    tokio::fs::write(path, text).await?;
    Ok(())
}

/// Read a transfer file as a JSON array without interpreting its items.
///
/// Items are checked one by one while they are inserted, so a bad item only
/// fails the import after the rows before it are already in the table.
pub(crate) async fn read_items(path: &Path) -> Result<Vec<serde_json::Value>> {
    let text = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&text)?)
}
