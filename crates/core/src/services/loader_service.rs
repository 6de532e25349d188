use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::directory::{DirectoryNode, MasterSource};
use crate::models::stock::StockRecord;
use crate::providers::traits::DataFileProvider;

/// What the table is currently showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSelection {
    /// A single file picked in the sidebar
    File { directory: String, file: String },
    /// The "All Data" aggregate built from the master folder
    Master(MasterSource),
    /// No file selected and no master folder available
    Empty,
}

impl DataSelection {
    /// Header label for the data view.
    pub fn label(&self) -> String {
        match self {
            DataSelection::File { directory, file } => format!("{directory}/{file}"),
            DataSelection::Master(master) => {
                let n = master.files.len();
                let noun = if n == 1 { "file" } else { "files" };
                format!("All Data ({n} {noun})")
            }
            DataSelection::Empty => "No data available".to_string(),
        }
    }
}

/// Ticket identifying one load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadToken(u64);

impl LoadToken {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Hands out increasing generations so that only the newest load is applied.
///
/// Loads are never cancelled; a result whose token is no longer current
/// is simply dropped when it arrives.
#[derive(Debug, Default)]
pub struct LoadTracker {
    current: AtomicU64,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new load, superseding every earlier one.
    pub fn begin(&self) -> LoadToken {
        LoadToken(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, token: LoadToken) -> bool {
        self.current.load(Ordering::SeqCst) == token.0
    }
}

/// Fetches data files and turns them into one flat list of records.
///
/// Every file is fail-soft: a missing or malformed file is logged and
/// contributes nothing, so one bad file never blanks the whole view.
#[derive(Clone)]
pub struct LoaderService {
    provider: Arc<dyn DataFileProvider>,
}

impl LoaderService {
    pub fn new(provider: Arc<dyn DataFileProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<dyn DataFileProvider> {
        &self.provider
    }

    /// Load one file. Errors are logged and produce an empty list.
    pub async fn load_file(&self, path: &str) -> Vec<StockRecord> {
        let result = match self.provider.fetch(path).await {
            Ok(text) => parse_records(&text).map_err(|e| CoreError::DataFile {
                path: path.to_string(),
                message: e.to_string(),
            }),
            Err(e) => Err(e),
        };
        match result {
            Ok(records) => {
                tracing::debug!(path, records = records.len(), provider = self.provider.name(), "loaded data file");
                records
            }
            Err(e) => {
                tracing::warn!(path, error = %e, "error loading data file");
                Vec::new()
            }
        }
    }

    /// Load one file from a folder and stamp each record's `source_file`.
    pub async fn load_single(&self, directory: &str, file: &str) -> Vec<StockRecord> {
        let source = format!("{directory}/{file}");
        let mut records = self.load_file(&source).await;
        for record in &mut records {
            record.source_file = Some(source.clone());
        }
        records
    }

    /// Load several files under `base_path`, one after another, concatenated
    /// in input order. Records keep whatever `source_file` the file carried.
    pub async fn load_many(&self, files: &[String], base_path: &str) -> Vec<StockRecord> {
        let mut all = Vec::new();
        for file in files {
            let path = format!("{base_path}/{file}");
            all.extend(self.load_file(&path).await);
        }
        all
    }

    /// Load every file of a tree in pre-order (folder files, then subfolders),
    /// stamping `source_file` with the folder path.
    pub async fn load_tree(&self, nodes: &[DirectoryNode]) -> Vec<StockRecord> {
        let mut all = Vec::new();
        let mut stack: Vec<&DirectoryNode> = nodes.iter().rev().collect();
        while let Some(node) = stack.pop() {
            for file in &node.files {
                all.extend(self.load_single(&node.path, file).await);
            }
            stack.extend(node.subdirectories.iter().rev());
        }
        all
    }

    pub async fn load_selection(&self, selection: &DataSelection) -> Vec<StockRecord> {
        match selection {
            DataSelection::File { directory, file } => self.load_single(directory, file).await,
            DataSelection::Master(master) => self.load_many(&master.files, &master.path).await,
            DataSelection::Empty => Vec::new(),
        }
    }
}

/// A load that has been issued but not yet run.
///
/// Owns everything it needs, so it can be moved into a spawned task while
/// the board keeps handling input.
pub struct LoadRequest {
    token: LoadToken,
    selection: DataSelection,
    loader: LoaderService,
}

impl LoadRequest {
    pub fn new(token: LoadToken, selection: DataSelection, loader: LoaderService) -> Self {
        Self {
            token,
            selection,
            loader,
        }
    }

    pub fn token(&self) -> LoadToken {
        self.token
    }

    pub fn selection(&self) -> &DataSelection {
        &self.selection
    }

    pub async fn execute(self) -> LoadOutcome {
        let records = self.loader.load_selection(&self.selection).await;
        LoadOutcome {
            token: self.token,
            selection: self.selection,
            records,
        }
    }
}

/// Result of a finished [`LoadRequest`].
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub token: LoadToken,
    pub selection: DataSelection,
    pub records: Vec<StockRecord>,
}

/// Decode a data file body. A lone object counts as a one-element list;
/// array elements that are not stock records are skipped.
pub fn parse_records(text: &str) -> Result<Vec<StockRecord>, CoreError> {
    let value: Value = serde_json::from_str(text)?;
    let items = match value {
        Value::Array(items) => items,
        other => vec![other],
    };

    let total = items.len();
    let records: Vec<StockRecord> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<StockRecord>(item) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed record");
                None
            }
        })
        .collect();

    if records.is_empty() && total > 0 {
        return Err(CoreError::Deserialization(format!(
            "none of the {total} entries is a stock record"
        )));
    }
    Ok(records)
}
