pub mod errors;
pub mod logging;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use std::collections::HashSet;
use std::sync::Arc;

use errors::CoreError;
use models::{
    directory::{DirectoryNode, MasterSource},
    pick::{PickToggle, PickedStock},
    settings::BoardSettings,
    stock::StockRecord,
    table::{TableView, ALL_SIGNALS},
};
use providers::traits::DataFileProvider;
use services::{
    loader_service::{DataSelection, LoadOutcome, LoadRequest, LoadTracker, LoaderService},
    picks_service::PicksService,
    scanner_service::ScannerService,
    table_service::TableService,
};
use storage::traits::RealtimeStore;

/// A file chosen in the sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSelection {
    pub directory: String,
    pub file: String,
}

/// Main entry point for the Signal Board core library.
///
/// Owns the directory tree, the loaded records and table state, and the
/// picks cache. Chat and suggestions are independent
/// ([`services::chat_service::ChatService`],
/// [`services::suggestion_service::SuggestionService`]) and only share the
/// store handed out by [`SignalBoard::store`].
#[must_use]
pub struct SignalBoard {
    settings: BoardSettings,
    scanner: ScannerService,
    loader: LoaderService,
    table: TableService,
    picks: PicksService,
    store: Arc<dyn RealtimeStore>,
    directories: Vec<DirectoryNode>,
    master: Option<MasterSource>,
    selected_file: Option<FileSelection>,
    tracker: Arc<LoadTracker>,
    pending_load: bool,
    expanded_directories: HashSet<String>,
}

impl std::fmt::Debug for SignalBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalBoard")
            .field("directories", &self.directories.len())
            .field("records", &self.table.records().len())
            .field("picks", &self.picks.len())
            .field("selection", &self.selection().label())
            .field("loading", &self.pending_load)
            .finish()
    }
}

impl SignalBoard {
    /// Create a board over the given data source and realtime store.
    pub fn new(
        settings: BoardSettings,
        provider: Arc<dyn DataFileProvider>,
        store: Arc<dyn RealtimeStore>,
    ) -> Result<Self, CoreError> {
        settings.validate()?;
        Ok(Self {
            scanner: ScannerService::new(&settings),
            loader: LoaderService::new(provider),
            table: TableService::from_settings(&settings),
            picks: PicksService::new(Arc::clone(&store)),
            store,
            settings,
            directories: Vec::new(),
            master: None,
            selected_file: None,
            tracker: Arc::new(LoadTracker::new()),
            pending_load: false,
            expanded_directories: HashSet::new(),
        })
    }

    /// Board reading files from `settings.data_root` on local disk.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn with_local_files(
        settings: BoardSettings,
        store: Arc<dyn RealtimeStore>,
    ) -> Result<Self, CoreError> {
        let provider = Arc::new(providers::local::LocalFileProvider::new(&settings));
        Self::new(settings, provider, store)
    }

    #[must_use]
    pub fn settings(&self) -> &BoardSettings {
        &self.settings
    }

    /// Shared store handle, for the chat and suggestion services.
    #[must_use]
    pub fn store(&self) -> Arc<dyn RealtimeStore> {
        Arc::clone(&self.store)
    }

    // ── Directory tree ──────────────────────────────────────────────

    /// Re-read the folder tree and locate the master folder.
    ///
    /// On failure the tree is emptied (the board keeps working with no
    /// data) and the error is returned for display.
    pub async fn refresh_directories(&mut self) -> Result<(), CoreError> {
        match self.loader.provider().list_directories().await {
            Ok(directories) => {
                self.master = self.scanner.master_source(&directories);
                tracing::info!(
                    directories = directories.len(),
                    master_files = self.master.as_ref().map_or(0, |m| m.files.len()),
                    "directory tree refreshed"
                );
                self.directories = directories;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "error loading directories");
                self.directories.clear();
                self.master = None;
                Err(e)
            }
        }
    }

    #[must_use]
    pub fn directories(&self) -> &[DirectoryNode] {
        &self.directories
    }

    /// Top-level folders for the sidebar; the master folder is hidden.
    #[must_use]
    pub fn browsable_directories(&self) -> Vec<&DirectoryNode> {
        self.directories
            .iter()
            .filter(|d| d.name != self.settings.master_directory)
            .collect()
    }

    #[must_use]
    pub fn master(&self) -> Option<&MasterSource> {
        self.master.as_ref()
    }

    pub fn toggle_directory(&mut self, path: &str) {
        if !self.expanded_directories.remove(path) {
            self.expanded_directories.insert(path.to_string());
        }
    }

    #[must_use]
    pub fn is_directory_expanded(&self, path: &str) -> bool {
        self.expanded_directories.contains(path)
    }

    // ── Selection ───────────────────────────────────────────────────

    /// What the data view currently shows.
    #[must_use]
    pub fn selection(&self) -> DataSelection {
        match (&self.selected_file, &self.master) {
            (Some(sel), _) => DataSelection::File {
                directory: sel.directory.clone(),
                file: sel.file.clone(),
            },
            (None, Some(master)) => DataSelection::Master(master.clone()),
            (None, None) => DataSelection::Empty,
        }
    }

    #[must_use]
    pub fn selected_file(&self) -> Option<&FileSelection> {
        self.selected_file.as_ref()
    }

    #[must_use]
    pub fn is_file_selected(&self, directory: &str, file: &str) -> bool {
        self.selected_file
            .as_ref()
            .is_some_and(|s| s.directory == directory && s.file == file)
    }

    /// Select a file; selecting the current file again goes back to All Data.
    /// Any change resets the signal-type filter. Call a load afterwards.
    pub fn select_file(&mut self, directory: &str, file: &str) -> DataSelection {
        let next = if self.is_file_selected(directory, file) {
            None
        } else {
            Some(FileSelection {
                directory: directory.to_string(),
                file: file.to_string(),
            })
        };
        self.set_selected_file(next);
        self.selection()
    }

    /// Switch back to the All Data view.
    pub fn select_all_data(&mut self) -> DataSelection {
        self.set_selected_file(None);
        self.selection()
    }

    fn set_selected_file(&mut self, next: Option<FileSelection>) {
        if self.selected_file != next {
            self.selected_file = next;
            self.table.set_signal_type(ALL_SIGNALS);
        }
    }

    // ── Loading ─────────────────────────────────────────────────────

    /// Issue a load for the current selection. Any load issued earlier
    /// becomes stale and will be ignored by [`finish_load`](Self::finish_load).
    pub fn begin_load(&mut self) -> LoadRequest {
        let token = self.tracker.begin();
        self.pending_load = true;
        tracing::debug!(generation = token.generation(), selection = %self.selection().label(), "load issued");
        LoadRequest::new(token, self.selection(), self.loader.clone())
    }

    /// Apply a finished load if it is still the newest one.
    /// Returns `false` (and changes nothing) for a superseded load.
    pub fn finish_load(&mut self, outcome: LoadOutcome) -> bool {
        if !self.tracker.is_current(outcome.token) {
            tracing::debug!(generation = outcome.token.generation(), "discarding stale load");
            return false;
        }
        tracing::info!(
            records = outcome.records.len(),
            selection = %outcome.selection.label(),
            "data loaded"
        );
        self.table.set_records(outcome.records);
        self.pending_load = false;
        true
    }

    /// Load the current selection and apply it.
    pub async fn reload_data(&mut self) {
        let outcome = self.begin_load().execute().await;
        self.finish_load(outcome);
    }

    /// Refresh button: re-scan the tree, then reload data. The data is
    /// reloaded even if the scan failed; the scan error is returned.
    pub async fn refresh(&mut self) -> Result<(), CoreError> {
        let scanned = self.refresh_directories().await;
        self.reload_data().await;
        scanned
    }

    /// True while the newest issued load has not been applied.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.pending_load
    }

    // ── Table ───────────────────────────────────────────────────────

    #[must_use]
    pub fn table(&self) -> &TableService {
        &self.table
    }

    /// Filter, sort and page controls.
    pub fn table_mut(&mut self) -> &mut TableService {
        &mut self.table
    }

    /// Current table page with pick flags joined in.
    #[must_use]
    pub fn view(&self) -> TableView {
        self.table.view(self.picks.index())
    }

    // ── Picks ───────────────────────────────────────────────────────

    /// Load picks and start following store changes.
    pub async fn mount(&mut self) -> Result<(), CoreError> {
        self.picks.mount().await
    }

    /// Stop following pick changes.
    pub async fn unmount(&mut self) {
        self.picks.unmount().await;
    }

    /// Apply any pick changes pushed by the store.
    pub async fn sync_picks(&mut self) -> Result<bool, CoreError> {
        self.picks.sync().await
    }

    #[must_use]
    pub fn picks(&self) -> &[PickedStock] {
        self.picks.picks()
    }

    #[must_use]
    pub fn picks_service(&self) -> &PicksService {
        &self.picks
    }

    pub async fn toggle_pick(&mut self, record: &StockRecord) -> Result<PickToggle, CoreError> {
        self.picks.toggle(record).await
    }

    /// Set a pick's priority from user text ("high", "moderate", "low").
    pub async fn set_pick_priority(&mut self, pick_id: &str, level: &str) -> Result<(), CoreError> {
        self.picks.set_priority_str(pick_id, level).await
    }

    pub async fn remove_pick(&mut self, pick_id: &str) -> Result<(), CoreError> {
        self.picks.remove(pick_id).await
    }
}
