use std::path::PathBuf;

use crate::errors::CoreError;
use crate::storage::manager::StorageManager;

/// The local user's identity for chat and suggestions.
///
/// Passed explicitly into the collaboration services. The display name is
/// written back to the preference file every time the user posts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    display_name: String,
    preferences_path: Option<PathBuf>,
}

impl Session {
    /// An in-memory session that never touches disk.
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            preferences_path: None,
        }
    }

    /// Restore the name remembered at `path`. An unreadable file yields an
    /// empty name rather than an error.
    pub fn restore(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let display_name = match StorageManager::load_display_name(&path) {
            Ok(name) => name.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not read preferences");
                String::new()
            }
        };
        Self {
            display_name,
            preferences_path: Some(path),
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn set_display_name(&mut self, name: impl Into<String>) {
        self.display_name = name.into();
    }

    /// True when a non-blank name has been entered.
    pub fn has_name(&self) -> bool {
        !self.display_name.trim().is_empty()
    }

    /// Name to post under, or a validation error if it is blank.
    pub fn require_name(&self) -> Result<&str, CoreError> {
        if self.has_name() {
            Ok(&self.display_name)
        } else {
            Err(CoreError::ValidationError("Display name must not be empty".into()))
        }
    }

    /// Persist the current name. Failures are logged and swallowed.
    pub fn remember(&self) {
        let Some(path) = &self.preferences_path else {
            return;
        };
        if let Err(e) = StorageManager::save_display_name(path, &self.display_name) {
            tracing::warn!(path = %path.display(), error = %e, "could not save display name");
        }
    }
}
