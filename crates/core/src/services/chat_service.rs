use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::chat::{ChatMessage, NewChatMessage};
use crate::models::session::Session;
use crate::storage::feed::LiveFeed;
use crate::storage::traits::{decode_rows, Collection, EventMask, Filter, Query, RealtimeStore};

const CHAT: Collection = Collection::ChatMessages;

/// Matches every row: all stored timestamps are after the epoch.
const EPOCH: &str = "1970-01-01";

/// The shared chat room.
///
/// Shows the most recent `history_limit` messages, oldest first. The room
/// only follows inserts while it is open.
pub struct ChatService {
    store: Arc<dyn RealtimeStore>,
    history_limit: usize,
    messages: Vec<ChatMessage>,
    feed: LiveFeed,
}

impl ChatService {
    pub fn new(store: Arc<dyn RealtimeStore>, history_limit: usize) -> Self {
        Self {
            store,
            history_limit,
            messages: Vec::new(),
            feed: LiveFeed::new(),
        }
    }

    /// Messages in display order (oldest first).
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_open(&self) -> bool {
        self.feed.is_attached()
    }

    /// Open the room: subscribe to new messages and load history.
    pub async fn open(&mut self) -> Result<(), CoreError> {
        self.feed.attach(self.store.as_ref(), CHAT, EventMask::INSERT).await?;
        self.load_history().await
    }

    /// Close the room and release its subscription.
    pub async fn close(&mut self) {
        self.feed.detach(self.store.as_ref()).await;
    }

    /// Fetch the newest `history_limit` messages and show them oldest first.
    pub async fn load_history(&mut self) -> Result<(), CoreError> {
        let query = Query::all()
            .order_by("created_at", false)
            .limit(self.history_limit);
        let rows = self.store.select(CHAT, &query).await.map_err(|e| {
            tracing::warn!(error = %e, "error loading messages");
            e
        })?;
        let mut messages: Vec<ChatMessage> = decode_rows(CHAT, rows);
        messages.reverse();
        self.messages = messages;
        Ok(())
    }

    /// Reload if new messages were announced. Returns `true` if it did.
    pub async fn sync(&mut self) -> Result<bool, CoreError> {
        if self.feed.take_pending() == 0 {
            return Ok(false);
        }
        self.load_history().await?;
        Ok(true)
    }

    /// Post a message under the session's name.
    ///
    /// Blank names and blank messages are rejected. The name is remembered
    /// for next time, then history is reloaded once the store accepts. A
    /// failed reload after that is logged, not returned.
    pub async fn send(&mut self, session: &Session, text: &str) -> Result<(), CoreError> {
        let user_name = session.require_name()?.to_string();
        if text.trim().is_empty() {
            return Err(CoreError::ValidationError("Message must not be empty".into()));
        }
        session.remember();

        let payload = serde_json::to_value(NewChatMessage {
            user_name,
            message: text.to_string(),
        })
        .map_err(|e| CoreError::Serialization(e.to_string()))?;

        self.store.insert(CHAT, payload).await.map_err(|e| {
            tracing::warn!(error = %e, "error sending message");
            e
        })?;
        if self.load_history().await.is_err() {
            tracing::warn!("message sent, history not refreshed");
        }
        Ok(())
    }

    /// Delete the whole chat history.
    ///
    /// `confirm` is asked first; if it returns `false` nothing is sent to
    /// the store and `Ok(false)` comes back.
    pub async fn clear_history(&mut self, confirm: impl FnOnce() -> bool) -> Result<bool, CoreError> {
        if !confirm() {
            return Ok(false);
        }
        let removed = self
            .store
            .delete(CHAT, &Filter::gte("created_at", EPOCH))
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "error deleting chat history");
                e
            })?;
        tracing::info!(removed, "cleared chat history");
        self.messages.clear();
        Ok(true)
    }
}
