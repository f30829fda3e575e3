//! Chat enumeration
//!
//! One grouped query lists the chats, then two counting queries per chat
//! fill in the sent and received totals.

use rusqlite::params;
use crate::chat::Chat;
use crate::message::Direction;
use crate::names::NameResolver;
use crate::storage::{ColumnReader, QueryContext, Store, schema};
use crate::{Error, Result};

/// List visible chats, most recently active first.
///
/// Order is significant. Chats without messages come last.
pub fn list_chats(store: &Store, names: &dyn NameResolver) -> Result<Vec<Chat>> {
    let mut stmt = store
        .conn()
        .prepare(schema::CHAT_LIST_QUERY)
        .query_context("Could not load chat list")?;
    let mut rows = stmt.query([]).query_context("Could not load chat list")?;

    let mut chats = Vec::new();
    while let Some(row) = rows.next().query_context("Could not load chat list")? {
        let key = row.text(0).query_context("Could not read chat key")?;
        let subject = row.text(1).query_context("Could not read chat subject")?;
        let created = row.int64(2).query_context("Could not read chat creation")?;
        let last_message = row.int64(3).query_context("Could not read last message")?;

        let messages_sent = count_messages(store, &key, Direction::Outgoing)?;
        let messages_received = count_messages(store, &key, Direction::Incoming)?;

        chats.push(Chat {
            display_name: names.lookup(&key),
            subject: (!subject.is_empty()).then_some(subject),
            key,
            created,
            last_message,
            messages_sent,
            messages_received,
        });
    }

    tracing::debug!("Loaded {} chats", chats.len());
    Ok(chats)
}

/// Count messages for an identity key in one direction.
///
/// Counts span every chat row sharing the key.
pub fn count_messages(store: &Store, key: &str, direction: Direction) -> Result<u64> {
    let mut stmt = store
        .conn()
        .prepare_cached(schema::MESSAGE_COUNT_QUERY)
        .query_context("Could not load messages")?;
    let mut rows = stmt
        .query(params![key, direction.flag()])
        .query_context("Could not bind count parameters")?;

    match rows.next().query_context("Could not count messages")? {
        Some(row) => {
            let count = row.int64(0).query_context("Could not read message count")?;
            Ok(count.max(0) as u64)
        }
        None => Err(Error::Query {
            context: "No result for count query".to_string(),
            source: rusqlite::Error::QueryReturnedNoRows,
        }),
    }
}
