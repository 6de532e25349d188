use super::traits::{Collection, EventMask, RealtimeStore, Subscription};
use crate::errors::CoreError;

/// The live-update subscriptions owned by one view.
///
/// Views attach when they open and must detach when they close, otherwise
/// the store keeps pushing into a channel nobody reads.
#[derive(Debug, Default)]
pub struct LiveFeed {
    subscriptions: Vec<Subscription>,
}

impl LiveFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to `collection` unless this feed already follows it.
    pub async fn attach(
        &mut self,
        store: &dyn RealtimeStore,
        collection: Collection,
        mask: EventMask,
    ) -> Result<(), CoreError> {
        if self.follows(collection) {
            return Ok(());
        }
        let subscription = store.subscribe(collection, mask).await?;
        self.subscriptions.push(subscription);
        Ok(())
    }

    /// Drop every subscription.
    pub async fn detach(&mut self, store: &dyn RealtimeStore) {
        for subscription in self.subscriptions.drain(..) {
            store.unsubscribe(subscription).await;
        }
    }

    pub fn is_attached(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    pub fn follows(&self, collection: Collection) -> bool {
        self.subscriptions.iter().any(|s| s.collection == collection)
    }

    /// Discard queued notifications and report how many there were.
    ///
    /// Callers reload the whole collection on any change, so the events
    /// themselves (and their order) do not matter.
    pub fn take_pending(&mut self) -> usize {
        self.subscriptions
            .iter_mut()
            .map(|s| s.drain().len())
            .sum()
    }
}
