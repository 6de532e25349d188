use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::session::Session;
use crate::models::suggestion::{NewSuggestion, NewSuggestionReply, Suggestion, SuggestionReply};
use crate::storage::feed::LiveFeed;
use crate::storage::traits::{decode_rows, Collection, EventMask, Filter, Query, RealtimeStore};

const SUGGESTIONS: Collection = Collection::Suggestions;
const REPLIES: Collection = Collection::SuggestionReplies;

/// Suggestions board with threaded replies.
///
/// Suggestions are listed newest first, replies oldest first under their
/// parent. Any change to either collection triggers a full reload.
/// Deleting a suggestion does not touch its replies; replies whose parent
/// is gone are simply not shown.
pub struct SuggestionService {
    store: Arc<dyn RealtimeStore>,
    suggestions: Vec<Suggestion>,
    expanded: HashSet<String>,
    feed: LiveFeed,
}

impl SuggestionService {
    pub fn new(store: Arc<dyn RealtimeStore>) -> Self {
        Self {
            store,
            suggestions: Vec::new(),
            expanded: HashSet::new(),
            feed: LiveFeed::new(),
        }
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn get(&self, suggestion_id: &str) -> Option<&Suggestion> {
        self.suggestions.iter().find(|s| s.id == suggestion_id)
    }

    pub async fn mount(&mut self) -> Result<(), CoreError> {
        let store = self.store.as_ref();
        self.feed.attach(store, SUGGESTIONS, EventMask::ALL).await?;
        self.feed.attach(store, REPLIES, EventMask::ALL).await?;
        tracing::debug!("subscribed to suggestions changes");
        self.reload().await
    }

    pub async fn unmount(&mut self) {
        self.feed.detach(self.store.as_ref()).await;
    }

    pub fn is_mounted(&self) -> bool {
        self.feed.is_attached()
    }

    /// Refetch suggestions and replies and stitch them together.
    pub async fn reload(&mut self) -> Result<(), CoreError> {
        let suggestion_rows = self
            .store
            .select(SUGGESTIONS, &Query::all().order_by("created_at", false))
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "error loading suggestions");
                e
            })?;
        let reply_rows = self
            .store
            .select(REPLIES, &Query::all().order_by("created_at", true))
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "error loading replies");
                e
            })?;

        let mut by_parent: HashMap<String, Vec<SuggestionReply>> = HashMap::new();
        for reply in decode_rows::<SuggestionReply>(REPLIES, reply_rows) {
            by_parent.entry(reply.suggestion_id.clone()).or_default().push(reply);
        }

        let mut suggestions: Vec<Suggestion> = decode_rows(SUGGESTIONS, suggestion_rows);
        for suggestion in &mut suggestions {
            suggestion.replies = by_parent.remove(&suggestion.id).unwrap_or_default();
        }

        let live: HashSet<&str> = suggestions.iter().map(|s| s.id.as_str()).collect();
        self.expanded.retain(|id| live.contains(id.as_str()));
        self.suggestions = suggestions;
        Ok(())
    }

    /// Reload if either collection changed. Returns `true` if it did.
    pub async fn sync(&mut self) -> Result<bool, CoreError> {
        if self.feed.take_pending() == 0 {
            return Ok(false);
        }
        self.reload().await?;
        Ok(true)
    }

    pub async fn add_suggestion(&mut self, session: &Session, content: &str) -> Result<(), CoreError> {
        let user_name = session.require_name()?.to_string();
        if content.trim().is_empty() {
            return Err(CoreError::ValidationError("Suggestion must not be empty".into()));
        }
        session.remember();

        let payload = serde_json::to_value(NewSuggestion {
            user_name,
            content: content.to_string(),
        })
        .map_err(|e| CoreError::Serialization(e.to_string()))?;
        self.store.insert(SUGGESTIONS, payload).await.map_err(|e| {
            tracing::warn!(error = %e, "error adding suggestion");
            e
        })?;
        self.refresh_after_write().await;
        Ok(())
    }

    pub async fn add_reply(
        &mut self,
        session: &Session,
        suggestion_id: &str,
        content: &str,
    ) -> Result<(), CoreError> {
        let user_name = session.require_name()?.to_string();
        if content.trim().is_empty() {
            return Err(CoreError::ValidationError("Reply must not be empty".into()));
        }
        session.remember();

        let payload = serde_json::to_value(NewSuggestionReply {
            suggestion_id: suggestion_id.to_string(),
            user_name,
            content: content.to_string(),
        })
        .map_err(|e| CoreError::Serialization(e.to_string()))?;
        self.store.insert(REPLIES, payload).await.map_err(|e| {
            tracing::warn!(error = %e, "error adding reply");
            e
        })?;
        self.refresh_after_write().await;
        Ok(())
    }

    /// Delete a suggestion after `confirm` agrees. Returns `Ok(false)` if declined.
    pub async fn delete_suggestion(
        &mut self,
        suggestion_id: &str,
        confirm: impl FnOnce() -> bool,
    ) -> Result<bool, CoreError> {
        if !confirm() {
            return Ok(false);
        }
        self.store
            .delete(SUGGESTIONS, &Filter::eq("id", suggestion_id))
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "error deleting suggestion");
                e
            })?;
        self.refresh_after_write().await;
        Ok(true)
    }

    /// The write is already committed; a failed reload only leaves the list behind.
    async fn refresh_after_write(&mut self) {
        if self.reload().await.is_err() {
            tracing::warn!("suggestions change saved, list not refreshed");
        }
    }

    // ── Expand / collapse (local only) ──────────────────────────────

    pub fn toggle_expanded(&mut self, suggestion_id: &str) {
        if !self.expanded.remove(suggestion_id) {
            self.expanded.insert(suggestion_id.to_string());
        }
    }

    pub fn is_expanded(&self, suggestion_id: &str) -> bool {
        self.expanded.contains(suggestion_id)
    }
}
