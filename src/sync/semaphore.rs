//! The class lock primitive: a binary semaphore, not a mutex.
//!
//! Adapted from `ryancinsight-halo`'s `concurrency::sync::GhostMutex`: the
//! same atomic-state-plus-wait-queue design (spin briefly, then park),
//! generalized in one direction spec.md §9 calls out explicitly — "a plain
//! binary mutex suffices if `Free` is always called by the same thread that
//! acquired; otherwise a semaphore... is required — the source uses the
//! latter." A [`ResourceGroup`](crate::group::ResourceGroup) acquires a root
//! on one thread and may be freed from another, so `acquire`/`release` are
//! bare functions rather than an RAII guard: ownership of "who is allowed to
//! release" is not tracked, by design.

use std::ptr::NonNull;
use std::sync::atomic::{AtomicU8, Ordering};

use crossbeam_utils::CachePadded;

use super::wait_queue::{WaitNode, WaitQueue};

const FREE: u8 = 0;
const HELD: u8 = 1;
const HELD_CONTENDED: u8 = 2;

/// A binary semaphore: at most one holder at a time, acquire blocks,
/// release is callable from any thread.
pub(crate) struct Semaphore {
    // Cache-line padded: every root in a hot class is contended from
    // multiple threads, and sits next to unrelated fields in `IdInner`.
    state: CachePadded<AtomicU8>,
    queue: WaitQueue,
}

impl Semaphore {
    /// Creates a semaphore, optionally already held.
    ///
    /// Every [`crate::id::ResourceId`] is its own root the moment it is
    /// created, so the "lazily created on first use as a root" language in
    /// spec.md §4.1 collapses to "created eagerly at construction, and
    /// handed to the caller either free or pre-held" — there is no
    /// observable difference, since a brand-new node is always a root.
    pub(crate) fn new(held: bool) -> Self {
        Self {
            state: CachePadded::new(AtomicU8::new(if held { HELD } else { FREE })),
            queue: WaitQueue::new(),
        }
    }

    /// Blocks until the semaphore is acquired.
    #[inline]
    pub(crate) fn acquire(&self) {
        if self
            .state
            .compare_exchange(FREE, HELD, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            return;
        }
        self.acquire_slow();
    }

    #[cold]
    fn acquire_slow(&self) {
        let mut spins = 0;
        loop {
            if self.state.load(Ordering::Relaxed) == FREE
                && self
                    .state
                    .compare_exchange(FREE, HELD, Ordering::Acquire, Ordering::Relaxed)
                    .is_ok()
            {
                return;
            }

            if spins < 40 {
                spins += 1;
                std::hint::spin_loop();
                continue;
            }

            let node = WaitNode::new();
            let node_ptr = NonNull::from(&node);

            unsafe {
                self.queue.lock_for_push();

                let s = self.state.load(Ordering::Relaxed);
                if s == FREE {
                    if self
                        .state
                        .compare_exchange(FREE, HELD, Ordering::Acquire, Ordering::Relaxed)
                        .is_ok()
                    {
                        self.queue.unlock_external();
                        return;
                    }
                }

                if s != HELD_CONTENDED {
                    self.state.store(HELD_CONTENDED, Ordering::Relaxed);
                }

                self.queue.push_locked(node_ptr);
                self.queue.unlock_external();
            }

            std::thread::park();
        }
    }

    /// Releases the semaphore. May be called by any thread, not only the
    /// one that acquired it.
    pub(crate) fn release(&self) {
        if self
            .state
            .compare_exchange(HELD, FREE, Ordering::Release, Ordering::Relaxed)
            .is_ok()
        {
            return;
        }
        self.release_slow();
    }

    #[cold]
    fn release_slow(&self) {
        unsafe {
            self.queue.lock_for_push();
            self.state.store(FREE, Ordering::Release);
            let woken = self.queue.pop_locked();
            self.queue.unlock_external();
            if let Some(node) = woken {
                node.as_ref().wake();
            }
        }
    }
}
