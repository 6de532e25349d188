use serde::{Deserialize, Serialize};

/// A top-level entry on the suggestions board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: String,
    pub user_name: String,
    pub content: String,
    pub created_at: String,

    /// Attached by the board after loading; not a stored column.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<SuggestionReply>,
}

impl Suggestion {
    pub fn reply_count(&self) -> usize {
        self.replies.len()
    }

    pub fn has_replies(&self) -> bool {
        !self.replies.is_empty()
    }
}

/// A threaded answer to a suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionReply {
    pub id: String,
    pub suggestion_id: String,
    pub user_name: String,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSuggestion {
    pub user_name: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSuggestionReply {
    pub suggestion_id: String,
    pub user_name: String,
    pub content: String,
}
