// ═══════════════════════════════════════════════════════════════════
// Picks Tests — PicksService toggle/priority/remove, store failures,
// live-update subscriptions
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use signal_board_core::errors::CoreError;
use signal_board_core::models::pick::{PickToggle, Priority};
use signal_board_core::models::stock::StockRecord;
use signal_board_core::services::picks_service::PicksService;
use signal_board_core::storage::memory::MemoryStore;
use signal_board_core::storage::traits::{
    Collection, EventMask, Filter, Query, RealtimeStore, Subscription,
};

// ═══════════════════════════════════════════════════════════════════
// Mock Store
// ═══════════════════════════════════════════════════════════════════

/// Delegates to a [`MemoryStore`] but can be told to reject writes or reads.
struct FlakyStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl FlakyStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_writes: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
        }
    }

    fn set_reads_failing(&self, failing: bool) {
        self.fail_reads.store(failing, Ordering::SeqCst);
    }

    fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    fn check(&self, collection: Collection, operation: &str) -> Result<(), CoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CoreError::store(collection.as_str(), operation, "simulated outage"));
        }
        Ok(())
    }
}

#[async_trait]
impl RealtimeStore for FlakyStore {
    fn name(&self) -> &str {
        "FlakyStore"
    }

    async fn select(&self, collection: Collection, query: &Query) -> Result<Vec<Value>, CoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CoreError::store(collection.as_str(), "select", "simulated outage"));
        }
        self.inner.select(collection, query).await
    }

    async fn insert(&self, collection: Collection, record: Value) -> Result<Value, CoreError> {
        self.check(collection, "insert")?;
        self.inner.insert(collection, record).await
    }

    async fn update(&self, collection: Collection, id: &str, patch: Value) -> Result<Value, CoreError> {
        self.check(collection, "update")?;
        self.inner.update(collection, id, patch).await
    }

    async fn delete(&self, collection: Collection, filter: &Filter) -> Result<usize, CoreError> {
        self.check(collection, "delete")?;
        self.inner.delete(collection, filter).await
    }

    async fn subscribe(&self, collection: Collection, mask: EventMask) -> Result<Subscription, CoreError> {
        self.inner.subscribe(collection, mask).await
    }

    async fn unsubscribe(&self, subscription: Subscription) {
        self.inner.unsubscribe(subscription).await
    }
}

fn nvda() -> StockRecord {
    let mut record = StockRecord::new("NVDA", "Buy", "880.50", "2024-03-02");
    record.source_file = Some("daily/mon.json".into());
    record
}

fn aapl() -> StockRecord {
    StockRecord::new("AAPL", "Sell", "190.25", "2024-03-01")
}

fn service() -> (PicksService, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (PicksService::new(store.clone()), store)
}

// ═══════════════════════════════════════════════════════════════════
// Toggle
// ═══════════════════════════════════════════════════════════════════

mod toggle {
    use super::*;

    #[tokio::test]
    async fn toggle_twice_round_trips_to_empty() {
        let (mut picks, store) = service();
        let record = nvda();

        assert_eq!(picks.toggle(&record).await.unwrap(), PickToggle::Added);
        assert_eq!(picks.len(), 1);
        assert_eq!(picks.picks()[0].priority, Priority::Moderate);
        assert!(picks.is_picked(&record));

        assert_eq!(picks.toggle(&record).await.unwrap(), PickToggle::Removed);
        assert!(picks.is_empty());
        assert!(!picks.is_picked(&record));
        assert_eq!(store.len(Collection::PickedStocks).await, 0);
    }

    #[tokio::test]
    async fn unsynced_notification_still_toggles_off() {
        let store = Arc::new(MemoryStore::new());
        let mut first = PicksService::new(store.clone());
        let mut second = PicksService::new(store.clone());
        first.mount().await.unwrap();
        second.mount().await.unwrap();

        assert_eq!(first.toggle(&nvda()).await.unwrap(), PickToggle::Added);

        // `second` has not synced, yet must see the pick and remove it.
        assert_eq!(second.toggle(&nvda()).await.unwrap(), PickToggle::Removed);
        assert_eq!(store.len(Collection::PickedStocks).await, 0);
        assert!(!second.is_picked(&nvda()));
    }

    #[tokio::test]
    async fn unmounted_service_checks_the_store_before_toggling() {
        let store = Arc::new(MemoryStore::new());
        let mut first = PicksService::new(store.clone());
        let mut second = PicksService::new(store.clone());

        first.toggle(&nvda()).await.unwrap();
        assert_eq!(second.toggle(&nvda()).await.unwrap(), PickToggle::Removed);
        assert_eq!(store.len(Collection::PickedStocks).await, 0);

        // Natural key stays unique whichever client toggles.
        first.toggle(&nvda()).await.unwrap();
        second.toggle(&aapl()).await.unwrap();
        assert_eq!(first.toggle(&aapl()).await.unwrap(), PickToggle::Removed);
        assert_eq!(store.len(Collection::PickedStocks).await, 1);
    }

    #[tokio::test]
    async fn new_pick_snapshots_the_record() {
        let (mut picks, _) = service();
        picks.toggle(&nvda()).await.unwrap();

        let pick = &picks.picks()[0];
        assert!(!pick.id.is_empty());
        assert!(!pick.created_at.is_empty());
        assert_eq!(pick.ticker_name, "NVDA");
        assert_eq!(pick.signal_type, "Buy");
        assert_eq!(pick.stock_price, "880.50");
        assert_eq!(pick.date, "2024-03-02");
        assert_eq!(pick.source_file.as_deref(), Some("daily/mon.json"));
    }

    #[tokio::test]
    async fn natural_key_ignores_price_and_source() {
        let (mut picks, _) = service();
        picks.toggle(&nvda()).await.unwrap();

        let mut same_key = StockRecord::new("NVDA", "Buy", "1.00", "2024-03-02");
        same_key.source_file = Some("other/file.json".into());
        assert!(picks.is_picked(&same_key));
        assert_eq!(picks.toggle(&same_key).await.unwrap(), PickToggle::Removed);
        assert!(picks.is_empty());
    }

    #[tokio::test]
    async fn different_signal_is_a_different_pick() {
        let (mut picks, _) = service();
        picks.toggle(&nvda()).await.unwrap();
        picks
            .toggle(&StockRecord::new("NVDA", "Sell", "880.50", "2024-03-02"))
            .await
            .unwrap();
        assert_eq!(picks.len(), 2);
        assert_eq!(picks.index().len(), 2);
    }

    #[tokio::test]
    async fn picks_are_newest_first() {
        let (mut picks, _) = service();
        picks.toggle(&nvda()).await.unwrap();
        picks.toggle(&aapl()).await.unwrap();

        let tickers: Vec<&str> = picks.picks().iter().map(|p| p.ticker_name.as_str()).collect();
        assert_eq!(tickers, vec!["AAPL", "NVDA"]);
    }

    #[tokio::test]
    async fn find_returns_matching_pick() {
        let (mut picks, _) = service();
        picks.toggle(&aapl()).await.unwrap();
        assert_eq!(picks.find(&aapl()).unwrap().ticker_name, "AAPL");
        assert!(picks.find(&nvda()).is_none());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Priority & removal
// ═══════════════════════════════════════════════════════════════════

mod priority {
    use super::*;

    #[tokio::test]
    async fn set_priority_updates_in_place() {
        let (mut picks, _) = service();
        picks.toggle(&nvda()).await.unwrap();
        let id = picks.picks()[0].id.clone();

        picks.set_priority(&id, Priority::High).await.unwrap();
        assert_eq!(picks.picks()[0].priority, Priority::High);
        assert_eq!(picks.picks()[0].id, id);

        picks.set_priority_str(&id, "low").await.unwrap();
        assert_eq!(picks.picks()[0].priority, Priority::Low);
    }

    #[tokio::test]
    async fn invalid_level_is_rejected_before_the_store() {
        let (mut picks, _) = service();
        picks.toggle(&nvda()).await.unwrap();
        let id = picks.picks()[0].id.clone();

        let err = picks.set_priority_str(&id, "urgent").await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
        assert_eq!(picks.picks()[0].priority, Priority::Moderate);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let (mut picks, _) = service();
        let err = picks.set_priority("missing", Priority::High).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn remove_deletes_by_id() {
        let (mut picks, _) = service();
        picks.toggle(&nvda()).await.unwrap();
        picks.toggle(&aapl()).await.unwrap();
        let id = picks.find(&nvda()).unwrap().id.clone();

        picks.remove(&id).await.unwrap();
        assert_eq!(picks.len(), 1);
        assert!(!picks.is_picked(&nvda()));
        assert!(picks.is_picked(&aapl()));
    }

    #[tokio::test]
    async fn removing_an_absent_id_is_harmless() {
        let (mut picks, _) = service();
        picks.toggle(&nvda()).await.unwrap();
        picks.remove("no-such-id").await.unwrap();
        assert_eq!(picks.len(), 1);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Store failures leave the cache untouched
// ═══════════════════════════════════════════════════════════════════

mod store_failures {
    use super::*;

    #[tokio::test]
    async fn failed_insert_keeps_cache() {
        let store = Arc::new(FlakyStore::new());
        let mut picks = PicksService::new(store.clone());
        picks.toggle(&aapl()).await.unwrap();

        store.set_failing(true);
        let err = picks.toggle(&nvda()).await.unwrap_err();
        assert!(matches!(err, CoreError::Store { .. }));
        assert_eq!(picks.len(), 1);
        assert!(!picks.is_picked(&nvda()));
    }

    #[tokio::test]
    async fn failed_delete_keeps_pick() {
        let store = Arc::new(FlakyStore::new());
        let mut picks = PicksService::new(store.clone());
        picks.toggle(&nvda()).await.unwrap();

        store.set_failing(true);
        assert!(picks.toggle(&nvda()).await.is_err());
        assert!(picks.is_picked(&nvda()));

        store.set_failing(false);
        assert_eq!(picks.toggle(&nvda()).await.unwrap(), PickToggle::Removed);
    }

    #[tokio::test]
    async fn failed_priority_update_keeps_old_priority() {
        let store = Arc::new(FlakyStore::new());
        let mut picks = PicksService::new(store.clone());
        picks.toggle(&nvda()).await.unwrap();
        let id = picks.picks()[0].id.clone();

        store.set_failing(true);
        assert!(picks.set_priority(&id, Priority::High).await.is_err());
        assert_eq!(picks.picks()[0].priority, Priority::Moderate);
    }

    #[tokio::test]
    async fn committed_toggle_succeeds_when_reload_fails() {
        let store = Arc::new(FlakyStore::new());
        let mut picks = PicksService::new(store.clone());
        picks.mount().await.unwrap();

        store.set_reads_failing(true);
        assert_eq!(picks.toggle(&nvda()).await.unwrap(), PickToggle::Added);
        assert_eq!(store.inner.len(Collection::PickedStocks).await, 1);
        assert!(picks.is_stale());
        assert!(!picks.is_picked(&nvda()));

        // Cannot see the store, so it refuses to write rather than duplicate.
        assert!(picks.toggle(&nvda()).await.is_err());
        assert_eq!(store.inner.len(Collection::PickedStocks).await, 1);

        store.set_reads_failing(false);
        assert!(picks.sync().await.unwrap());
        assert!(!picks.is_stale());
        assert!(picks.is_picked(&nvda()));
        assert_eq!(picks.toggle(&nvda()).await.unwrap(), PickToggle::Removed);
        assert_eq!(store.inner.len(Collection::PickedStocks).await, 0);
    }

    #[tokio::test]
    async fn committed_priority_and_remove_succeed_when_reload_fails() {
        let store = Arc::new(FlakyStore::new());
        let mut picks = PicksService::new(store.clone());
        picks.toggle(&nvda()).await.unwrap();
        let id = picks.picks()[0].id.clone();

        store.set_reads_failing(true);
        picks.set_priority(&id, Priority::High).await.unwrap();
        picks.remove(&id).await.unwrap();
        assert_eq!(store.inner.len(Collection::PickedStocks).await, 0);

        store.set_reads_failing(false);
        assert!(picks.sync().await.unwrap());
        assert!(picks.is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Live updates
// ═══════════════════════════════════════════════════════════════════

mod live_updates {
    use super::*;

    #[tokio::test]
    async fn mount_loads_existing_picks() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert(
                Collection::PickedStocks,
                json!({
                    "ticker_name": "TSLA",
                    "signal_type": "Strong Sell",
                    "stock_price": "175.10",
                    "date": "2024-03-03",
                    "priority": "high"
                }),
            )
            .await
            .unwrap();

        let mut picks = PicksService::new(store.clone());
        picks.mount().await.unwrap();
        assert!(picks.is_mounted());
        assert_eq!(picks.len(), 1);
        assert_eq!(picks.picks()[0].priority, Priority::High);
        assert!(picks.picks()[0].source_file.is_none());
    }

    #[tokio::test]
    async fn sync_reloads_after_another_client_writes() {
        let store = Arc::new(MemoryStore::new());
        let mut mine = PicksService::new(store.clone());
        let mut theirs = PicksService::new(store.clone());
        mine.mount().await.unwrap();

        assert!(!mine.sync().await.unwrap());

        theirs.toggle(&nvda()).await.unwrap();
        assert!(mine.is_empty());
        assert!(mine.sync().await.unwrap());
        assert!(mine.is_picked(&nvda()));

        // Drained: nothing more to apply.
        assert!(!mine.sync().await.unwrap());
    }

    #[tokio::test]
    async fn unmount_releases_the_subscription() {
        let store = Arc::new(MemoryStore::new());
        let mut picks = PicksService::new(store.clone());

        picks.mount().await.unwrap();
        picks.mount().await.unwrap();
        assert_eq!(store.active_subscriptions(Collection::PickedStocks).await, 1);

        picks.unmount().await;
        assert!(!picks.is_mounted());
        assert_eq!(store.active_subscriptions(Collection::PickedStocks).await, 0);

        picks.mount().await.unwrap();
        assert_eq!(store.active_subscriptions(Collection::PickedStocks).await, 1);
    }

    #[tokio::test]
    async fn unmounted_service_ignores_changes() {
        let store = Arc::new(MemoryStore::new());
        let mut picks = PicksService::new(store.clone());
        let mut other = PicksService::new(store.clone());

        other.toggle(&aapl()).await.unwrap();
        assert!(!picks.sync().await.unwrap());
        assert!(picks.is_empty());
    }

    #[tokio::test]
    async fn malformed_rows_are_skipped() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert(Collection::PickedStocks, json!({ "garbage": true }))
            .await
            .unwrap();
        let mut picks = PicksService::new(store.clone());
        picks.toggle(&nvda()).await.unwrap();
        assert_eq!(picks.len(), 1);
    }
}
