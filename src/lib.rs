//! # msgview - Messenger Database Viewer
//!
//! Read-only extraction of chats and messages from a forensic copy of a
//! mobile messenger's SQLite database.
//!
//! msgview provides:
//! - Schema validation that rejects databases from unsupported app versions
//! - Chat enumeration with last-activity timestamps and per-direction counts
//! - Message retrieval that rebuilds media, location, link and quote data
//!   from one wide join
//! - Cancellable background retrieval with bounded-latency interruption

pub mod cancel;
pub mod chat;
pub mod config;
pub mod database;
pub mod message;
pub mod names;
pub mod output;
pub mod query;
pub mod storage;
pub mod ui;

// Re-exports for convenient access
pub use cancel::CancellationToken;
pub use chat::Chat;
pub use database::MessageDatabase;
pub use message::{Direction, Location, Media, Message};
pub use names::{DisplayNames, NameResolver, NoOverrides};
pub use query::{MessageQuery, QueryState, RetrievalOutcome};
pub use storage::Store;

use std::path::PathBuf;

/// Result type alias for msgview operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for msgview operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The database lacks a table or column this reader depends on.
    #[error("Incompatible schema: {0}")]
    IncompatibleSchema(String),

    #[error("Could not open database {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("{context}: {source}")]
    Query {
        context: String,
        #[source]
        source: rusqlite::Error,
    },

    /// The caller asked the query to stop. Not a failure of the store.
    #[error("Query interrupted")]
    Interrupted,

    #[error("Invalid query state: {0}")]
    InvalidState(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Invalid config {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config already exists at {} (use --force to overwrite)", .0.display())]
    ConfigExists(PathBuf),

    #[error("Could not serialize config: {0}")]
    ConfigFormat(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap a store error with the failing operation's context.
    ///
    /// `SQLITE_INTERRUPT` is reported as [`Error::Interrupted`] so callers can
    /// tell a requested stop apart from a broken query.
    pub fn query(context: impl Into<String>, source: rusqlite::Error) -> Self {
        if storage::is_interrupted(&source) {
            Error::Interrupted
        } else {
            Error::Query {
                context: context.into(),
                source,
            }
        }
    }

    /// Errors that end the whole session rather than a single query.
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, Error::IncompatibleSchema(_) | Error::Open { .. })
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, Error::Interrupted)
    }
}

/// Event sent from the message retrieval worker to an optional observer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalMessage {
    Started { chat_key: String },
    Row { count: usize },
    Finished { count: usize, interrupted: bool },
}
