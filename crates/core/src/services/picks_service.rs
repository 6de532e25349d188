use serde_json::json;
use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::pick::{NewPick, PickIndex, PickToggle, PickedStock, Priority};
use crate::models::stock::StockRecord;
use crate::storage::feed::LiveFeed;
use crate::storage::traits::{decode_rows, Collection, EventMask, Filter, Query, RealtimeStore};

const PICKS: Collection = Collection::PickedStocks;

/// Client-side registry of picked stocks.
///
/// The store is authoritative. Every mutation is sent to the store first and
/// the local cache is only rebuilt (by a full reload) once the store
/// confirms; on failure the cache stays exactly as it was. A confirmed
/// write is a success even if the reload after it fails: the cache is then
/// marked stale and refreshed by the next [`sync`](Self::sync).
pub struct PicksService {
    store: Arc<dyn RealtimeStore>,
    picks: Vec<PickedStock>,
    index: PickIndex,
    feed: LiveFeed,
    stale: bool,
}

impl PicksService {
    pub fn new(store: Arc<dyn RealtimeStore>) -> Self {
        Self {
            store,
            picks: Vec::new(),
            index: PickIndex::new(),
            feed: LiveFeed::new(),
            stale: false,
        }
    }

    /// Picks, newest first.
    pub fn picks(&self) -> &[PickedStock] {
        &self.picks
    }

    pub fn index(&self) -> &PickIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.picks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }

    /// The pick sharing the record's (ticker, signal type, date), if any.
    pub fn find(&self, record: &StockRecord) -> Option<&PickedStock> {
        self.picks.iter().find(|p| p.matches(record))
    }

    pub fn is_picked(&self, record: &StockRecord) -> bool {
        self.index.contains(record)
    }

    // ── Store sync ──────────────────────────────────────────────────

    /// Refetch every pick and swap the cache in one go.
    pub async fn reload(&mut self) -> Result<(), CoreError> {
        let query = Query::all().order_by("created_at", false);
        let rows = match self.store.select(PICKS, &query).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(error = %e, "error loading picked stocks");
                self.stale = true;
                return Err(e);
            }
        };
        let picks: Vec<PickedStock> = decode_rows(PICKS, rows);
        self.index = PickIndex::from_picks(&picks);
        self.picks = picks;
        self.stale = false;
        Ok(())
    }

    /// The cache missed at least one reload and may not match the store.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Start following store changes and load the current state.
    pub async fn mount(&mut self) -> Result<(), CoreError> {
        self.feed.attach(self.store.as_ref(), PICKS, EventMask::ALL).await?;
        self.reload().await
    }

    /// Stop following store changes.
    pub async fn unmount(&mut self) {
        self.feed.detach(self.store.as_ref()).await;
    }

    pub fn is_mounted(&self) -> bool {
        self.feed.is_attached()
    }

    /// Apply queued change notifications, or retry a reload that failed.
    /// Returns `true` if a reload happened.
    pub async fn sync(&mut self) -> Result<bool, CoreError> {
        let pending = self.feed.take_pending();
        if pending == 0 && !self.stale {
            return Ok(false);
        }
        self.reload().await?;
        Ok(true)
    }

    // ── Mutations ───────────────────────────────────────────────────

    /// Pick the record, or un-pick it if its natural key is already picked.
    ///
    /// The decision is made against fresh store state: queued notifications
    /// are applied first, and an unmounted service reloads outright.
    pub async fn toggle(&mut self, record: &StockRecord) -> Result<PickToggle, CoreError> {
        if self.is_mounted() {
            self.sync().await?;
        } else {
            self.reload().await?;
        }

        let outcome = match self.find(record) {
            Some(existing) => {
                let id = existing.id.clone();
                self.store
                    .delete(PICKS, &Filter::eq("id", id))
                    .await
                    .map_err(|e| log_failure("removing picked stock", e))?;
                PickToggle::Removed
            }
            None => {
                let payload = serde_json::to_value(NewPick::from_record(record))
                    .map_err(|e| CoreError::Serialization(e.to_string()))?;
                self.store
                    .insert(PICKS, payload)
                    .await
                    .map_err(|e| log_failure("adding picked stock", e))?;
                PickToggle::Added
            }
        };
        tracing::info!(ticker = %record.ticker_name, ?outcome, "toggled pick");
        self.refresh_after_write().await;
        Ok(outcome)
    }

    pub async fn set_priority(&mut self, pick_id: &str, priority: Priority) -> Result<(), CoreError> {
        self.store
            .update(PICKS, pick_id, json!({ "priority": priority }))
            .await
            .map_err(|e| log_failure("updating pick priority", e))?;
        self.refresh_after_write().await;
        Ok(())
    }

    /// Like [`set_priority`](Self::set_priority), but from user text.
    /// Anything other than high/moderate/low is rejected before the store is touched.
    pub async fn set_priority_str(&mut self, pick_id: &str, level: &str) -> Result<(), CoreError> {
        let priority: Priority = level.parse()?;
        self.set_priority(pick_id, priority).await
    }

    /// Delete a pick by id, whether or not it is cached.
    pub async fn remove(&mut self, pick_id: &str) -> Result<(), CoreError> {
        self.store
            .delete(PICKS, &Filter::eq("id", pick_id))
            .await
            .map_err(|e| log_failure("removing picked stock", e))?;
        self.refresh_after_write().await;
        Ok(())
    }

    async fn refresh_after_write(&mut self) {
        if self.reload().await.is_err() {
            tracing::warn!("pick change saved, cache stale until next sync");
        }
    }
}

fn log_failure(action: &str, e: CoreError) -> CoreError {
    tracing::warn!(error = %e, "error {action}");
    e
}
