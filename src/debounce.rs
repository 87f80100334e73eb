// SPDX-License-Identifier: MIT OR Apache-2.0

//! Debounced task scheduling for typed input
//!
//! Each call to [`Debouncer::schedule`] aborts the task still waiting from
//! the previous call, so at most one task is pending at any time. Once its
//! delay has elapsed a task runs to completion; it is never interrupted.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::trace;

/// Idle time before a typed query runs
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `task` after the delay unless another task is scheduled first.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&mut self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.cancel() {
            trace!("replaced pending task");
        }
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        }));
    }

    /// Drop the pending task if it has not fired yet. Returns whether a
    /// waiting task was cancelled.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Wait for the pending task, if any, to fire and finish
    pub async fn flush(&mut self) {
        if let Some(handle) = self.pending.take() {
            // An aborted task reports a JoinError; nothing to do with it.
            let _ = handle.await;
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
