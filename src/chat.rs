//! Chat type - one conversation as listed by the chat enumerator
//!
//! Chats are grouped by (identity key, subject, creation timestamp), so a
//! database with duplicated chat rows still yields one `Chat` per group.

use serde::Serialize;

/// A conversation with its aggregated counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chat {
    /// Raw remote identifier string (the identity key)
    pub key: String,
    /// Display-name override supplied by the name resolver
    pub display_name: Option<String>,
    /// Group subject; `None` for direct chats or an empty subject
    pub subject: Option<String>,
    /// Creation timestamp in milliseconds since the epoch
    pub created: i64,
    /// Timestamp of the newest message, 0 when the chat has none
    pub last_message: i64,
    pub messages_sent: u64,
    pub messages_received: u64,
}

impl Chat {
    /// Human-facing title: display name, then subject, then raw key.
    pub fn title(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.subject.as_deref())
            .unwrap_or(&self.key)
    }

    pub fn total_messages(&self) -> u64 {
        self.messages_sent + self.messages_received
    }
}

impl std::fmt::Display for Chat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({} sent, {} received)",
            self.title(),
            self.messages_sent,
            self.messages_received
        )
    }
}
