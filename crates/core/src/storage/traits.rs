use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::errors::CoreError;

/// Named collections kept in the realtime store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    PickedStocks,
    ChatMessages,
    Suggestions,
    SuggestionReplies,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::PickedStocks,
        Collection::ChatMessages,
        Collection::Suggestions,
        Collection::SuggestionReplies,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Collection::PickedStocks => "picked_stocks",
            Collection::ChatMessages => "chat_messages",
            Collection::Suggestions => "suggestions",
            Collection::SuggestionReplies => "suggestion_replies",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Collection {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CoreError::UnknownCollection(s.to_string()))
    }
}

/// Row predicate for select/delete.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column == value`
    Eq(String, Value),
    /// `column >= value`
    Gte(String, Value),
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(column.into(), value.into())
    }

    pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Gte(column.into(), value.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

/// Options for [`RealtimeStore::select`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Option<Filter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order_by = Some(OrderBy {
            column: column.into(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Which change kinds a subscription wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventMask {
    pub insert: bool,
    pub update: bool,
    pub delete: bool,
}

impl EventMask {
    pub const ALL: EventMask = EventMask {
        insert: true,
        update: true,
        delete: true,
    };

    pub const INSERT: EventMask = EventMask {
        insert: true,
        update: false,
        delete: false,
    };

    pub fn accepts(&self, kind: ChangeKind) -> bool {
        match kind {
            ChangeKind::Insert => self.insert,
            ChangeKind::Update => self.update,
            ChangeKind::Delete => self.delete,
        }
    }
}

/// A notification pushed to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub collection: Collection,
    pub kind: ChangeKind,
    /// The inserted/updated row, or the deleted row's last state
    pub record: Value,
}

/// Live feed for one collection. Hand it back to
/// [`RealtimeStore::unsubscribe`] when the view goes away.
#[derive(Debug)]
pub struct Subscription {
    pub id: u64,
    pub collection: Collection,
    receiver: mpsc::UnboundedReceiver<ChangeEvent>,
}

impl Subscription {
    pub fn new(
        id: u64,
        collection: Collection,
        receiver: mpsc::UnboundedReceiver<ChangeEvent>,
    ) -> Self {
        Self {
            id,
            collection,
            receiver,
        }
    }

    /// Wait for the next notification; `None` once the store drops the channel.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        self.receiver.recv().await
    }

    /// Take every notification that has already arrived, without waiting.
    pub fn drain(&mut self) -> Vec<ChangeEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }
}

/// CRUD-plus-subscribe access to the shared backend that holds picks,
/// chat and suggestions. Rows travel as JSON objects.
#[async_trait]
pub trait RealtimeStore: Send + Sync {
    /// Backend name (for logs/errors).
    fn name(&self) -> &str;

    async fn select(&self, collection: Collection, query: &Query) -> Result<Vec<Value>, CoreError>;

    /// Insert one row and return it as stored (with `id` and `created_at`).
    async fn insert(&self, collection: Collection, record: Value) -> Result<Value, CoreError>;

    /// Merge `patch` into the row with the given id and return the new row.
    async fn update(&self, collection: Collection, id: &str, patch: Value) -> Result<Value, CoreError>;

    /// Delete every row matching `filter`; returns how many went away.
    async fn delete(&self, collection: Collection, filter: &Filter) -> Result<usize, CoreError>;

    async fn subscribe(&self, collection: Collection, mask: EventMask) -> Result<Subscription, CoreError>;

    async fn unsubscribe(&self, subscription: Subscription);
}

/// Decode store rows into typed records, skipping (and logging) rows that
/// do not fit the expected shape.
pub fn decode_rows<T: DeserializeOwned>(collection: Collection, rows: Vec<Value>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<T>(row) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!(%collection, error = %e, "skipping malformed row");
                None
            }
        })
        .collect()
}
