use crate::RetrievalMessage;
use crate::output::progress_visible;
use indicatif::{ProgressBar, ProgressStyle};
use std::thread;
use std::time::Duration;

/// Spinner fed by the retrieval worker's progress events.
///
/// Events are drained on a dedicated thread so the worker never waits on
/// terminal output.
pub struct RetrievalProgress {
    pb: ProgressBar,
    handle: Option<thread::JoinHandle<()>>,
}

impl RetrievalProgress {
    pub fn new() -> (Self, crossbeam::channel::Sender<RetrievalMessage>) {
        let (tx, rx) = crossbeam::channel::unbounded::<RetrievalMessage>();

        let pb = if progress_visible() {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]") {
                pb.set_style(style);
            }
            pb
        } else {
            ProgressBar::hidden()
        };

        let pb_clone = pb.clone();
        let handle = thread::spawn(move || {
            for msg in rx {
                match msg {
                    RetrievalMessage::Started { chat_key } => {
                        pb_clone.enable_steady_tick(Duration::from_millis(100));
                        pb_clone.set_message(format!("Reading messages of {}", chat_key));
                    }
                    RetrievalMessage::Row { count } => {
                        pb_clone.set_message(format!("{} messages", count));
                    }
                    RetrievalMessage::Finished { count, interrupted } => {
                        let verb = if interrupted { "Stopped after" } else { "Loaded" };
                        pb_clone.finish_with_message(format!("{} {} messages", verb, count));
                    }
                }
            }
        });

        (
            Self {
                pb,
                handle: Some(handle),
            },
            tx,
        )
    }

    /// Wait for the event stream to end (all senders dropped), then clear.
    pub fn finish(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.join().ok();
        }
        self.pb.finish_and_clear();
    }
}

pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let pb = if progress_visible() {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { pb }
    }

    pub fn finish_and_clear(&self) {
        self.pb.finish_and_clear();
    }
}
