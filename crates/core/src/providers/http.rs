use async_trait::async_trait;
use reqwest::Client;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use super::traits::DataFileProvider;
use crate::errors::CoreError;
use crate::models::directory::{DirectoryListing, DirectoryNode};

/// Reads data files from the static host that serves the dashboard.
///
/// - **Listing**: `GET {base}/api/files` → `{"directories": [...]}`
/// - **Files**: `GET {base}/data/{directory}/{file}`
pub struct HttpFileProvider {
    client: Client,
    base_url: String,
}

impl HttpFileProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn listing_url(&self) -> String {
        format!("{}/api/files", self.base_url)
    }

    pub fn file_url(&self, path: &str) -> String {
        format!("{}/data/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl DataFileProvider for HttpFileProvider {
    fn name(&self) -> &str {
        "http"
    }

    async fn list_directories(&self) -> Result<Vec<DirectoryNode>, CoreError> {
        let url = self.listing_url();
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(CoreError::Scan {
                root: url,
                message: format!("listing endpoint returned {}", resp.status()),
            });
        }
        let listing: DirectoryListing = resp.json().await.map_err(|e| CoreError::Scan {
            root: self.listing_url(),
            message: format!("Failed to parse listing: {e}"),
        })?;
        Ok(listing.directories)
    }

    async fn fetch(&self, path: &str) -> Result<String, CoreError> {
        let resp = self.client.get(self.file_url(path)).send().await?;
        if !resp.status().is_success() {
            return Err(CoreError::DataFile {
                path: path.to_string(),
                message: format!("HTTP {}", resp.status()),
            });
        }
        Ok(resp.text().await?)
    }
}
