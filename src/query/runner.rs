//! Cancellable message retrieval on a worker thread
//!
//! `Idle -> Running -> {Completed, Cancelled, Failed}`
//!
//! The store moves into the worker for the duration of the query and is
//! handed back on join, so no other query can run against it meanwhile.
//! The caller polls with [`MessageQuery::wait_for`] and may stop the worker
//! with [`MessageQuery::request_cancel`], which sets the cooperative stop flag
//! and interrupts the statement currently stepping.

use std::thread::{self, JoinHandle};
use std::time::Duration;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use rusqlite::InterruptHandle;
use crate::cancel::CancellationToken;
use crate::message::Message;
use crate::storage::Store;
use crate::{Error, Result, RetrievalMessage};
use super::messages::{Retrieval, retrieve_messages};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

/// Final result of a retrieval that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalOutcome {
    /// Every message of the chat
    Completed(Vec<Message>),
    /// The messages accumulated before the stop point
    Cancelled(Vec<Message>),
}

impl RetrievalOutcome {
    pub fn messages(&self) -> &[Message] {
        match self {
            RetrievalOutcome::Completed(messages) | RetrievalOutcome::Cancelled(messages) => messages,
        }
    }

    pub fn into_messages(self) -> Vec<Message> {
        match self {
            RetrievalOutcome::Completed(messages) | RetrievalOutcome::Cancelled(messages) => messages,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, RetrievalOutcome::Completed(_))
    }
}

type WorkerResult = (Store, Result<Retrieval>);

struct Worker {
    handle: JoinHandle<WorkerResult>,
    done: Receiver<()>,
    interrupt: InterruptHandle,
}

/// One message retrieval, run on its own thread.
pub struct MessageQuery {
    chat_key: String,
    state: QueryState,
    token: CancellationToken,
    progress: Option<Sender<RetrievalMessage>>,
    store: Option<Store>,
    worker: Option<Worker>,
    outcome: Option<Result<RetrievalOutcome>>,
    cancel_requested: bool,
}

impl MessageQuery {
    /// Create an idle query that takes ownership of the store
    pub fn new(store: Store, chat_key: impl Into<String>) -> Self {
        Self {
            chat_key: chat_key.into(),
            state: QueryState::Idle,
            token: CancellationToken::new(),
            progress: None,
            store: Some(store),
            worker: None,
            outcome: None,
            cancel_requested: false,
        }
    }

    /// Share an external stop signal with the worker.
    ///
    /// The worker checks it before every row, so cancelling it ends the pass
    /// without a call to [`MessageQuery::request_cancel`]. `request_cancel`
    /// sets this same token.
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Forward per-row progress events to `tx`
    pub fn with_progress(mut self, tx: Sender<RetrievalMessage>) -> Self {
        self.progress = Some(tx);
        self
    }

    pub fn state(&self) -> QueryState {
        self.state
    }

    pub fn chat_key(&self) -> &str {
        &self.chat_key
    }

    /// Launch the worker. Only valid when idle.
    pub fn start(&mut self) -> Result<()> {
        if self.state != QueryState::Idle {
            return Err(Error::InvalidState(format!("cannot start a query in state {:?}", self.state)));
        }
        let store = self
            .store
            .take()
            .ok_or_else(|| Error::StoreUnavailable("query has no store".to_string()))?;

        let interrupt = store.interrupt_handle();
        let (done_tx, done_rx) = channel::bounded::<()>(1);
        let token = self.token.clone();
        let chat_key = self.chat_key.clone();
        let progress = self.progress.take();

        let spawned = thread::Builder::new()
            .name("message-query".to_string())
            .spawn(move || {
                let result = retrieve_messages(&store, &chat_key, &token, progress.as_ref());
                done_tx.send(()).ok();
                (store, result)
            });

        match spawned {
            Ok(handle) => {
                tracing::debug!("Started message query for {}", self.chat_key);
                self.worker = Some(Worker {
                    handle,
                    done: done_rx,
                    interrupt,
                });
                self.state = QueryState::Running;
                Ok(())
            }
            // The unrun closure took the store down with it
            Err(err) => {
                tracing::error!("Could not spawn message query worker: {}", err);
                self.state = QueryState::Failed;
                self.outcome = Some(Err(Error::StoreUnavailable("worker thread could not be spawned".to_string())));
                Err(Error::Io(err))
            }
        }
    }

    /// Wait up to `timeout` for the worker to finish.
    ///
    /// Returns `true` once the query has finished. An idle query has not, so
    /// it returns `false` at once. Never blocks longer than `timeout` while the
    /// worker is still busy.
    pub fn wait_for(&mut self, timeout: Duration) -> bool {
        let Some(worker) = self.worker.as_ref() else {
            return matches!(
                self.state,
                QueryState::Completed | QueryState::Cancelled | QueryState::Failed
            );
        };

        match worker.done.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                self.join();
                true
            }
            Err(RecvTimeoutError::Timeout) => false,
        }
    }

    /// Stop a running query and join the worker.
    ///
    /// Sets the cooperative stop flag, then interrupts the store so a blocked
    /// step returns promptly.
    pub fn request_cancel(&mut self) -> Result<()> {
        if self.state != QueryState::Running {
            return Err(Error::InvalidState(format!("cannot cancel a query in state {:?}", self.state)));
        }

        self.cancel_requested = true;
        self.token.cancel();
        if let Some(worker) = self.worker.as_ref() {
            worker.interrupt.interrupt();
        }
        tracing::info!("Cancelling message query for {}", self.chat_key);

        self.join();
        Ok(())
    }

    /// Block until the worker has finished, then hand back the store and the outcome.
    ///
    /// The store is `None` only if the worker thread panicked.
    pub fn finish(mut self) -> (Option<Store>, Result<RetrievalOutcome>) {
        if self.state == QueryState::Running {
            self.join();
        }

        let outcome = match self.outcome.take() {
            Some(outcome) => outcome,
            None => Err(Error::InvalidState("query was never started".to_string())),
        };
        (self.store.take(), outcome)
    }

    fn join(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        let (state, outcome) = match worker.handle.join() {
            Ok((store, result)) => {
                self.store = Some(store);
                settle(result, self.cancel_requested)
            }
            Err(_) => {
                tracing::error!("Message query worker for {} panicked", self.chat_key);
                (
                    QueryState::Failed,
                    Err(Error::StoreUnavailable("message query worker panicked".to_string())),
                )
            }
        };

        tracing::debug!("Message query for {} finished: {:?}", self.chat_key, state);
        self.state = state;
        self.outcome = Some(outcome);
    }
}

/// Map the worker's result to the final state and outcome
fn settle(result: Result<Retrieval>, cancel_requested: bool) -> (QueryState, Result<RetrievalOutcome>) {
    match result {
        Ok(Retrieval { messages, interrupted }) => {
            if interrupted || cancel_requested {
                (QueryState::Cancelled, Ok(RetrievalOutcome::Cancelled(messages)))
            } else {
                (QueryState::Completed, Ok(RetrievalOutcome::Completed(messages)))
            }
        }
        // Interrupt landed outside the row loop, before any row
        Err(Error::Interrupted) => (QueryState::Cancelled, Ok(RetrievalOutcome::Cancelled(Vec::new()))),
        Err(err) => (QueryState::Failed, Err(err)),
    }
}

impl Drop for MessageQuery {
    fn drop(&mut self) {
        // Never leave a detached worker holding the store
        if self.state == QueryState::Running {
            self.token.cancel();
            if let Some(worker) = self.worker.as_ref() {
                worker.interrupt.interrupt();
            }
            self.join();
        }
    }
}
