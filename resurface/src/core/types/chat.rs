//! Chat identity type for core messages.

use serde::{Deserialize, Serialize};

/// Chat (group, channel or private) identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub chat_type: String,
}

impl Chat {
    pub fn group(id: i64) -> Self {
        Self {
            id,
            chat_type: "group".to_string(),
        }
    }

    pub fn private(id: i64) -> Self {
        Self {
            id,
            chat_type: "private".to_string(),
        }
    }

    /// Groups and supergroups; detection only runs there.
    pub fn is_group(&self) -> bool {
        matches!(self.chat_type.as_str(), "group" | "supergroup")
    }

    /// Conversation key used by the store.
    pub fn conversation_id(&self) -> String {
        self.id.to_string()
    }
}
