//! Session facade over one validated messenger database

use std::path::{Path, PathBuf};
use std::time::Duration;
use crossbeam::channel::Sender;
use crate::cancel::CancellationToken;
use crate::chat::Chat;
use crate::names::NameResolver;
use crate::query::{self, MessageQuery, RetrievalOutcome};
use crate::storage::{self, DbStats, Store};
use crate::{Error, Result, RetrievalMessage};

/// Default interval between completion polls of a running retrieval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// An opened and validated database.
///
/// Queries run one at a time: message retrieval borrows the session mutably
/// and moves the store into a worker until it is joined.
pub struct MessageDatabase {
    store: Option<Store>,
    path: PathBuf,
    poll_interval: Duration,
}

impl MessageDatabase {
    /// Open a database and validate its schema before anything else runs
    pub fn open(path: &Path) -> Result<Self> {
        let store = Store::open(path)?;
        query::validate(&store)?;
        tracing::info!("Opened {}", path.display());

        Ok(Self {
            store: Some(store),
            path: path.to_path_buf(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// Set the poll interval (clamped to at least one millisecond)
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    fn store(&self) -> Result<&Store> {
        self.store
            .as_ref()
            .ok_or_else(|| Error::StoreUnavailable("database handle was lost".to_string()))
    }

    /// List chats with counters, most recently active first
    pub fn list_chats(&self, names: &dyn NameResolver) -> Result<Vec<Chat>> {
        query::list_chats(self.store()?, names)
    }

    pub fn stats(&self) -> Result<DbStats> {
        self.store()?.stats()
    }

    /// BLAKE3 digest of the database file
    pub fn fingerprint(&self) -> Result<String> {
        storage::fingerprint(&self.path)
    }

    /// Retrieve all messages of a chat, blocking until done or cancelled.
    ///
    /// The retrieval runs on a worker thread that checks the `cancel` token
    /// before every row; between polls it is checked here too. Once it is set
    /// the worker is stopped and the
    /// messages gathered so far come back as [`RetrievalOutcome::Cancelled`].
    /// The store is usable again afterwards in every case except a worker
    /// panic.
    pub fn retrieve_messages(
        &mut self,
        chat_key: &str,
        cancel: &CancellationToken,
        progress: Option<Sender<RetrievalMessage>>,
    ) -> Result<RetrievalOutcome> {
        let store = self
            .store
            .take()
            .ok_or_else(|| Error::StoreUnavailable("database handle was lost".to_string()))?;

        let mut query = MessageQuery::new(store, chat_key).with_token(cancel.clone());
        if let Some(tx) = progress {
            query = query.with_progress(tx);
        }

        if query.start().is_ok() {
            loop {
                if cancel.is_cancelled() {
                    // Only fails if the worker finished in the meantime
                    query.request_cancel().ok();
                    break;
                }
                if query.wait_for(self.poll_interval) {
                    break;
                }
            }
        }

        let (store, outcome) = query.finish();
        self.store = store;
        outcome
    }
}
