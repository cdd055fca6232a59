//! Blocking-call timeouts and cooperative cancellation.
//!
//! Collaborators (data sources, predictors) are blocking calls. They run on a
//! worker thread and the caller waits at most `timeout`; a late result is
//! dropped when the worker finishes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

/// Run `f` on a worker thread and wait up to `timeout` for its result.
///
/// Returns `None` if the deadline passes or the worker panics.
pub fn run_with_timeout<T, F>(timeout: Duration, f: F) -> Option<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        // receiver may be gone after a timeout
        let _ = tx.send(f());
    });
    rx.recv_timeout(timeout).ok()
}

/// Shared cancellation flag, checked between per-candidate steps.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
