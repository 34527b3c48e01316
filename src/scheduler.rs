//! Cancellable one-shot timers.
//!
//! Auto-reverting state (the save indicator going back to idle) is modelled
//! as an explicit task handle owned by the state it mutates, so teardown can
//! cancel it instead of relying on the owner still existing when it fires.

use std::time::Duration;
use tokio::task::JoinHandle;

/// A callback scheduled to run once after a delay. Dropping the handle
/// cancels it.
#[derive(Debug)]
pub struct ScheduledTask {
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    /// Run `f` once, `delay` from now. Must be called inside a tokio runtime.
    pub fn after<F>(delay: Duration, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            f();
        });
        Self { handle }
    }

    pub fn cancel(&self) {
        if !self.handle.is_finished() {
            tracing::debug!("scheduled task cancelled");
        }
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
