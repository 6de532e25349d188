use std::fs;
use std::path::Path;

use crate::errors::CoreError;
use crate::models::directory::{find_directory, DirectoryListing, DirectoryNode, MasterSource};
use crate::models::settings::BoardSettings;

use super::collation::locale_compare;

/// Walks the data root and builds the folder tree shown in the sidebar.
///
/// Read-only, no caching: every call re-reads the filesystem.
pub struct ScannerService {
    suffix: String,
    master_directory: String,
}

impl ScannerService {
    pub fn new(settings: &BoardSettings) -> Self {
        Self {
            suffix: settings.file_suffix(),
            master_directory: settings.master_directory.clone(),
        }
    }

    /// Scan `root` into a tree of folders that (transitively) contain data files.
    ///
    /// A missing root yields an empty tree. Any other I/O failure is a
    /// [`CoreError::Scan`]; no partial tree is returned.
    /// Symbolic links to directories are not followed; such folders are left out.
    pub fn scan(&self, root: &Path) -> Result<Vec<DirectoryNode>, CoreError> {
        if !root.exists() {
            tracing::debug!(root = %root.display(), "data root missing, empty tree");
            return Ok(Vec::new());
        }
        let nodes = self.scan_children(root, "").map_err(|e| CoreError::Scan {
            root: root.display().to_string(),
            message: e.to_string(),
        })?;
        tracing::debug!(root = %root.display(), directories = nodes.len(), "scanned data root");
        Ok(nodes)
    }

    /// Scan and wrap in the listing endpoint payload.
    pub fn listing(&self, root: &Path) -> Result<DirectoryListing, CoreError> {
        Ok(DirectoryListing {
            directories: self.scan(root)?,
        })
    }

    /// Locate the master folder in a scanned tree.
    pub fn find_master<'a>(&self, nodes: &'a [DirectoryNode]) -> Option<&'a DirectoryNode> {
        find_directory(nodes, &self.master_directory)
    }

    /// The "All Data" source, if the master folder exists and has files.
    pub fn master_source(&self, nodes: &[DirectoryNode]) -> Option<MasterSource> {
        self.find_master(nodes).and_then(MasterSource::from_node)
    }

    fn scan_children(&self, dir: &Path, base: &str) -> std::io::Result<Vec<DirectoryNode>> {
        let mut result = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = if base.is_empty() {
                name.clone()
            } else {
                format!("{base}/{name}")
            };

            let full_path = entry.path();
            let subdirectories = self.scan_children(&full_path, &path)?;
            let files = self.data_files(&full_path)?;

            if !files.is_empty() || !subdirectories.is_empty() {
                result.push(DirectoryNode {
                    name,
                    path,
                    files,
                    subdirectories,
                });
            }
        }

        result.sort_by(|a, b| locale_compare(&a.name, &b.name));
        Ok(result)
    }

    fn data_files(&self, dir: &Path) -> std::io::Result<Vec<String>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(&self.suffix) {
                files.push(name);
            }
        }
        files.sort();
        Ok(files)
    }
}
