//! Debounced input gate — trailing-edge coalescing of text edits.
//!
//! DESIGN
//! ======
//! The gate is a plain value owned by the editor task: `notify` re-arms a
//! single deadline and replaces the pending value, `take_due` hands the
//! value out once the deadline has passed. The owning task sleeps on
//! `deadline()` inside its `select!` loop, so there is never more than one
//! pending trigger and no timer task to cancel.

use std::time::Duration;

use tokio::time::Instant;

pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

#[derive(Debug)]
struct Pending<T> {
    deadline: Instant,
    value: T,
}

#[derive(Debug)]
pub struct DebounceGate<T> {
    delay: Duration,
    pending: Option<Pending<T>>,
}

impl<T> DebounceGate<T> {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    /// Arm (or restart) the window with `value` as the trailing edit.
    pub fn notify(&mut self, value: T) {
        self.pending = Some(Pending { deadline: Instant::now() + self.delay, value });
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending value if its window has elapsed at `now`.
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some(p) if p.deadline <= now => self.pending.take().map(|p| p.value),
            _ => None,
        }
    }

    /// Disarm without firing.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.value)
    }
}

/// Resolve at `deadline`, or never when the gate is idle.
pub async fn sleep_until_due(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
#[path = "debounce_test.rs"]
mod tests;
