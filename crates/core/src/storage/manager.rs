use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::CoreError;
use crate::models::settings::BoardSettings;

/// On-disk shape of the client preference file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Preferences {
    #[serde(default)]
    user_name: Option<String>,
}

/// File-backed persistence for settings and the remembered display name.
pub struct StorageManager;

impl StorageManager {
    /// Load board settings from a JSON file.
    pub fn load_settings(path: impl AsRef<Path>) -> Result<BoardSettings, CoreError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!("Failed to read settings {}: {e}", path.display()))
        })?;
        BoardSettings::from_json(&json)
    }

    /// Read the remembered display name. A missing file is not an error.
    pub fn load_display_name(path: impl AsRef<Path>) -> Result<Option<String>, CoreError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(path)?;
        let prefs: Preferences = serde_json::from_str(&json)?;
        Ok(prefs.user_name.filter(|n| !n.trim().is_empty()))
    }

    /// Remember the display name, creating parent folders as needed.
    pub fn save_display_name(path: impl AsRef<Path>, name: &str) -> Result<(), CoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let prefs = Preferences {
            user_name: Some(name.to_string()),
        };
        let json = serde_json::to_string_pretty(&prefs)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize preferences: {e}")))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
