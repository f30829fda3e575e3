//! Cooperative cancellation signal shared between a caller and a worker

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Clonable stop flag. All clones observe the same state.
///
/// The worker checks it once per row; the caller only ever sets it.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Complement of [`is_cancelled`](Self::is_cancelled): the liveness signal.
    pub fn is_alive(&self) -> bool {
        !self.is_cancelled()
    }
}
