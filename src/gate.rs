//! The fairness gate (spec.md §4.3.5, §5, §9).
//!
//! A process-wide (or, in tests, per-[`crate::World`]) admission latch. When
//! a [`crate::group::ResourceGroup`] burns through its restart budget it
//! closes the gate; every *new* group about to begin its first lock
//! acquisition then waits until every gated group has finished its
//! acquisition phase. Groups already mid-acquisition are unaffected — they
//! only ever consult the gate once, before their very first lock attempt.
//!
//! Encoded per spec.md §5 as "a lock guarded by a flag plus a condition
//! variable" (the alternative it names, an atomic integer with a
//! futex-like wait, is what [`crate::sync::Semaphore`] already does for the
//! per-class lock; a `Condvar` is the more direct fit here since admission
//! is a one-shot broadcast wakeup, not a single-permit handoff).

use std::sync::{Condvar, Mutex};

pub(crate) struct Gate {
    closed_count: Mutex<usize>,
    reopened: Condvar,
}

impl Gate {
    pub(crate) fn new() -> Self {
        Self {
            closed_count: Mutex::new(0),
            reopened: Condvar::new(),
        }
    }

    /// Blocks new acquisitions until every currently-gated group finishes.
    /// Called exactly once, before a group's first lock attempt.
    pub(crate) fn wait_for_admission(&self) {
        let mut count = self.closed_count.lock().unwrap();
        while *count > 0 {
            count = self.reopened.wait(count).unwrap();
        }
    }

    /// Closes the gate. Idempotent-safe to call from multiple concurrently
    /// restarting groups; each closer must later call [`Self::reopen`]
    /// exactly once.
    pub(crate) fn close(&self) {
        let mut count = self.closed_count.lock().unwrap();
        *count += 1;
        #[cfg(feature = "tracing")]
        tracing::debug!(closed_count = *count, "fairness gate closed");
    }

    /// Reopens the gate for one closer. New acquisitions remain blocked
    /// until every closer has reopened.
    pub(crate) fn reopen(&self) {
        let mut count = self.closed_count.lock().unwrap();
        debug_assert!(*count > 0, "reopen without a matching close");
        *count = count.saturating_sub(1);
        let now_open = *count == 0;
        drop(count);
        if now_open {
            #[cfg(feature = "tracing")]
            tracing::debug!("fairness gate reopened");
            self.reopened.notify_all();
        }
    }
}
