//! Storage Layer - read-only access to the messenger database
//!
//! The database is an external SQLite file with (among others) the tables:
//! - chat(_id, jid_row_id, subject, created_timestamp, hidden)
//! - jid(_id, user, raw_string)
//! - message(_id, chat_row_id, key_id, from_me, status, text_data, timestamp, ...)
//! - message_media, message_location, message_thumbnail, message_quoted,
//!   message_quoted_media, message_link (at most one row per message)

pub mod schema;
pub mod sqlite;

#[cfg(test)]
pub(crate) mod fixture;

pub use sqlite::{ColumnReader, DbStats, QueryContext, Store, fingerprint, is_interrupted};
