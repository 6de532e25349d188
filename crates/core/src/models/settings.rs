use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::CoreError;

/// Board configuration. Every key is optional in the settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardSettings {
    /// Folder that holds the data tree (directories of JSON files).
    pub data_root: PathBuf,

    /// Reserved folder name whose files make up the "All Data" view.
    pub master_directory: String,

    /// Extension of data files, without the dot.
    pub data_extension: String,

    /// Rows per table page.
    pub page_size: usize,

    /// At or below this many pages, every page number is shown.
    pub page_window_threshold: usize,

    /// Number of chat messages fetched when the room opens.
    pub chat_history_limit: usize,

    /// Where the display name is remembered between runs.
    pub preferences_path: Option<PathBuf>,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("public/data"),
            master_directory: "master".to_string(),
            data_extension: "json".to_string(),
            page_size: 20,
            page_window_threshold: 7,
            chat_history_limit: 100,
            preferences_path: None,
        }
    }
}

impl BoardSettings {
    /// Parse settings JSON; missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let settings: BoardSettings = serde_json::from_str(json)
            .map_err(|e| CoreError::Config(format!("Failed to parse settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.page_size == 0 {
            return Err(CoreError::Config("page_size must be at least 1".into()));
        }
        if self.master_directory.trim().is_empty() {
            return Err(CoreError::Config("master_directory must not be empty".into()));
        }
        let ext = self.data_extension.trim_start_matches('.');
        if ext.is_empty() {
            return Err(CoreError::Config("data_extension must not be empty".into()));
        }
        Ok(())
    }

    /// `.json`-style suffix used when filtering file names.
    pub fn file_suffix(&self) -> String {
        format!(".{}", self.data_extension.trim_start_matches('.'))
    }
}
