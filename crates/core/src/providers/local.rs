use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use super::traits::DataFileProvider;
use crate::errors::CoreError;
use crate::models::directory::DirectoryNode;
use crate::models::settings::BoardSettings;
use crate::services::scanner_service::ScannerService;

/// Serves data files straight from a folder on disk.
pub struct LocalFileProvider {
    root: PathBuf,
    scanner: Arc<ScannerService>,
}

impl LocalFileProvider {
    pub fn new(settings: &BoardSettings) -> Self {
        Self {
            root: settings.data_root.clone(),
            scanner: Arc::new(ScannerService::new(settings)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join a relative data path onto the root, refusing `..` and absolute paths.
    fn resolve(&self, path: &str) -> Result<PathBuf, CoreError> {
        let relative = Path::new(path.trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(CoreError::DataFile {
                path: path.to_string(),
                message: "path escapes the data root".into(),
            });
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl DataFileProvider for LocalFileProvider {
    fn name(&self) -> &str {
        "local"
    }

    async fn list_directories(&self) -> Result<Vec<DirectoryNode>, CoreError> {
        let scanner = Arc::clone(&self.scanner);
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || scanner.scan(&root))
            .await
            .map_err(|e| CoreError::Scan {
                root: self.root.display().to_string(),
                message: format!("scan task failed: {e}"),
            })?
    }

    async fn fetch(&self, path: &str) -> Result<String, CoreError> {
        let full = self.resolve(path)?;
        tokio::fs::read_to_string(&full)
            .await
            .map_err(|e| CoreError::DataFile {
                path: path.to_string(),
                message: e.to_string(),
            })
    }
}
