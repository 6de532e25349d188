use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::directory::DirectoryNode;

/// Where data files and the directory listing come from.
///
/// The board only ever asks two things of a source: "what folders and files
/// exist" and "give me the raw text of this file". Local disk and a static
/// web host both implement it; tests plug in their own.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait DataFileProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// The folder tree under the data root. Empty if the root is absent.
    async fn list_directories(&self) -> Result<Vec<DirectoryNode>, CoreError>;

    /// Raw contents of one data file, addressed as `<directory path>/<file>`.
    async fn fetch(&self, path: &str) -> Result<String, CoreError>;
}
