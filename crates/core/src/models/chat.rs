use serde::{Deserialize, Serialize};

/// One line in the chat room. Messages are never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub user_name: String,
    pub message: String,
    pub created_at: String,
}

impl ChatMessage {
    /// True if the message was sent under the given display name.
    pub fn is_from(&self, display_name: &str) -> bool {
        self.user_name == display_name
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewChatMessage {
    pub user_name: String,
    pub message: String,
}
