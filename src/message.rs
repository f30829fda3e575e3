//! Message types - one row of the wide message join, reassembled
//!
//! Optional joined tables are flattened with sentinel values rather than
//! `Option`s: missing text is `""`, missing numbers are `0`. Downstream
//! consumers rely on these sentinels. Binary attachments are the exception
//! and are `None` when absent.

use serde::{Serialize, Serializer};

/// Who sent a message, as stored in the `from_me` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Sent by the device owner (`from_me = 1`)
    Outgoing,
    /// Received from the remote party (`from_me = 0`)
    Incoming,
}

impl Direction {
    /// Value of the `from_me` column for this direction
    pub fn flag(&self) -> i64 {
        match self {
            Direction::Outgoing => 1,
            Direction::Incoming => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Outgoing => "outgoing",
            Direction::Incoming => "incoming",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Media descriptor from `message_media` plus the message type code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Media {
    pub url: String,
    pub mime_type: String,
    /// Message type code from the message table
    pub kind: i32,
    /// File length in bytes
    pub size: i64,
    pub name: String,
    pub caption: String,
    /// Duration in seconds for audio and video
    pub duration: i32,
}

impl Media {
    /// Whether the message carried a `message_media` row with content.
    pub fn is_present(&self) -> bool {
        !self.url.is_empty() || !self.mime_type.is_empty() || !self.name.is_empty()
    }
}

/// Shared location. `(0.0, 0.0)` also means "no location".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    /// A true coordinate at (0, 0) is indistinguishable from "unset".
    pub fn is_set(&self) -> bool {
        self.latitude != 0.0 || self.longitude != 0.0
    }
}

/// A single message of one retrieval pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    /// Message key id; unique within one retrieval pass
    pub key_id: String,
    /// Row id of the owning chat
    pub chat_row_id: i64,
    pub from_me: bool,
    /// Delivery status code
    pub status: i32,
    pub text: String,
    /// Milliseconds since the epoch
    pub timestamp: i64,
    pub media: Media,
    pub location: Location,
    #[serde(rename = "thumbnail_size", serialize_with = "blob_len")]
    pub thumbnail: Option<Vec<u8>>,
    #[serde(rename = "quoted_thumbnail_size", serialize_with = "blob_len")]
    pub quoted_thumbnail: Option<Vec<u8>>,
    /// Sender identifier in group chats, empty otherwise
    pub remote_resource: String,
    /// Key id of the replied-to message, empty when not a reply
    pub quoted_key_id: String,
    /// Index of the quoted message in the same retrieval result.
    ///
    /// Only ever points at an earlier message. A lookup, not ownership.
    pub quoted: Option<usize>,
    pub has_link: bool,
}

impl Message {
    pub fn direction(&self) -> Direction {
        if self.from_me {
            Direction::Outgoing
        } else {
            Direction::Incoming
        }
    }

    pub fn sender(&self) -> Option<&str> {
        if self.remote_resource.is_empty() {
            None
        } else {
            Some(&self.remote_resource)
        }
    }

    /// Resolve the quote reference against the retrieval result it came from.
    pub fn quoted_message<'a>(&self, messages: &'a [Message]) -> Option<&'a Message> {
        self.quoted.and_then(|index| messages.get(index))
    }

    pub fn is_reply(&self) -> bool {
        !self.quoted_key_id.is_empty()
    }
}

fn blob_len<S: Serializer>(blob: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
    match blob {
        Some(bytes) => serializer.serialize_some(&bytes.len()),
        None => serializer.serialize_none(),
    }
}
