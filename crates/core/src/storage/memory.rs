use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use super::traits::{
    ChangeEvent, ChangeKind, Collection, EventMask, Filter, Query, RealtimeStore, Subscription,
};
use crate::errors::CoreError;

struct Subscriber {
    collection: Collection,
    mask: EventMask,
    sender: mpsc::UnboundedSender<ChangeEvent>,
}

#[derive(Default)]
struct StoreInner {
    tables: HashMap<Collection, Vec<Value>>,
    subscribers: HashMap<u64, Subscriber>,
    next_subscription: u64,
    last_created_at: Option<DateTime<Utc>>,
}

impl StoreInner {
    /// Strictly increasing timestamps keep `created_at` ordering total
    /// even when inserts land within the same clock tick.
    fn next_created_at(&mut self) -> String {
        let mut now = Utc::now();
        if let Some(last) = self.last_created_at {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_created_at = Some(now);
        now.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn notify(&mut self, collection: Collection, kind: ChangeKind, record: &Value) {
        // Subscribers whose receiver is gone are dropped here.
        self.subscribers.retain(|_, sub| {
            if sub.collection != collection || !sub.mask.accepts(kind) {
                return true;
            }
            sub.sender
                .send(ChangeEvent {
                    collection,
                    kind,
                    record: record.clone(),
                })
                .is_ok()
        });
    }
}

/// In-process realtime store.
///
/// Behaves like the hosted backend the board talks to: assigns `id` and
/// `created_at` on insert, supports eq/gte filters, ordering and limits,
/// and pushes change notifications to per-subscription channels.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<StoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions on a collection.
    pub async fn active_subscriptions(&self, collection: Collection) -> usize {
        self.inner
            .lock()
            .await
            .subscribers
            .values()
            .filter(|s| s.collection == collection)
            .count()
    }

    /// Number of rows in a collection.
    pub async fn len(&self, collection: Collection) -> usize {
        self.inner
            .lock()
            .await
            .tables
            .get(&collection)
            .map_or(0, Vec::len)
    }
}

fn as_object(collection: Collection, operation: &str, value: Value) -> Result<Map<String, Value>, CoreError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(CoreError::store(
            collection.as_str(),
            operation,
            format!("expected a JSON object, got {other}"),
        )),
    }
}

/// Ordering used for filters and `order_by`: numbers numerically,
/// strings lexicographically, missing/null first.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(f64::NAN), y.as_f64().unwrap_or(f64::NAN));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn matches(row: &Value, filter: &Filter) -> bool {
    match filter {
        Filter::Eq(column, value) => row.get(column).unwrap_or(&Value::Null) == value,
        Filter::Gte(column, value) => match row.get(column) {
            Some(field) if !field.is_null() => compare_values(field, value) != Ordering::Less,
            _ => false,
        },
    }
}

#[async_trait]
impl RealtimeStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn select(&self, collection: Collection, query: &Query) -> Result<Vec<Value>, CoreError> {
        let inner = self.inner.lock().await;
        let mut rows: Vec<Value> = inner
            .tables
            .get(&collection)
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.filter.as_ref().map_or(true, |f| matches(row, f)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order_by {
            rows.sort_by(|a, b| {
                let a = a.get(&order.column).unwrap_or(&Value::Null);
                let b = b.get(&order.column).unwrap_or(&Value::Null);
                let ord = compare_values(a, b);
                if order.ascending { ord } else { ord.reverse() }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn insert(&self, collection: Collection, record: Value) -> Result<Value, CoreError> {
        let mut map = as_object(collection, "insert", record)?;
        let mut inner = self.inner.lock().await;

        if !map.get("id").is_some_and(|v| !v.is_null()) {
            map.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
        }
        if !map.get("created_at").is_some_and(|v| !v.is_null()) {
            let created_at = inner.next_created_at();
            map.insert("created_at".into(), Value::String(created_at));
        }

        let row = Value::Object(map);
        inner.tables.entry(collection).or_default().push(row.clone());
        inner.notify(collection, ChangeKind::Insert, &row);
        Ok(row)
    }

    async fn update(&self, collection: Collection, id: &str, patch: Value) -> Result<Value, CoreError> {
        let patch = as_object(collection, "update", patch)?;
        let mut inner = self.inner.lock().await;

        let row = inner
            .tables
            .get_mut(&collection)
            .and_then(|rows| {
                rows.iter_mut()
                    .find(|row| row.get("id").and_then(Value::as_str) == Some(id))
            })
            .ok_or_else(|| CoreError::NotFound(format!("{collection} row {id}")))?;

        if let Value::Object(existing) = row {
            for (key, value) in patch {
                if key != "id" {
                    existing.insert(key, value);
                }
            }
        }
        let updated = row.clone();
        inner.notify(collection, ChangeKind::Update, &updated);
        Ok(updated)
    }

    async fn delete(&self, collection: Collection, filter: &Filter) -> Result<usize, CoreError> {
        let mut inner = self.inner.lock().await;
        let removed: Vec<Value> = match inner.tables.get_mut(&collection) {
            Some(rows) => {
                let (gone, kept): (Vec<Value>, Vec<Value>) =
                    std::mem::take(rows).into_iter().partition(|row| matches(row, filter));
                *rows = kept;
                gone
            }
            None => Vec::new(),
        };
        for row in &removed {
            inner.notify(collection, ChangeKind::Delete, row);
        }
        Ok(removed.len())
    }

    async fn subscribe(&self, collection: Collection, mask: EventMask) -> Result<Subscription, CoreError> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().await;
        inner.next_subscription += 1;
        let id = inner.next_subscription;
        inner.subscribers.insert(
            id,
            Subscriber {
                collection,
                mask,
                sender,
            },
        );
        tracing::debug!(%collection, id, "subscribed");
        Ok(Subscription::new(id, collection, receiver))
    }

    async fn unsubscribe(&self, subscription: Subscription) {
        let mut inner = self.inner.lock().await;
        if inner.subscribers.remove(&subscription.id).is_some() {
            tracing::debug!(collection = %subscription.collection, id = subscription.id, "unsubscribed");
        }
    }
}
