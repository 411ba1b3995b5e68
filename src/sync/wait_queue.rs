//! Intrusive FIFO queue of parked threads, shared by [`super::Semaphore`] and
//! the fairness gate.
//!
//! Adapted from `ryancinsight-halo`'s `concurrency::sync::wait_queue`: a
//! spinlock-protected singly linked list of stack-pinned nodes, one per
//! parked thread, woken via `Thread::unpark`.

use std::cell::UnsafeCell;
use std::marker::PhantomPinned;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, Thread};

/// A node in the wait queue. Must stay pinned to the parking thread's stack
/// for as long as it is linked into a queue.
pub(crate) struct WaitNode {
    thread: Thread,
    next: Option<NonNull<WaitNode>>,
    _pin: PhantomPinned,
}

impl WaitNode {
    pub(crate) fn new() -> Self {
        Self {
            thread: thread::current(),
            next: None,
            _pin: PhantomPinned,
        }
    }

    pub(crate) fn wake(&self) {
        self.thread.unpark();
    }
}

/// A FIFO queue of waiting threads, protected by a spinlock.
///
/// Contention on the queue itself is expected to be brief: every operation
/// is just a couple of pointer swaps.
pub(crate) struct WaitQueue {
    head: UnsafeCell<Option<NonNull<WaitNode>>>,
    tail: UnsafeCell<Option<NonNull<WaitNode>>>,
    lock: AtomicBool,
}

impl WaitQueue {
    pub(crate) const fn new() -> Self {
        Self {
            head: UnsafeCell::new(None),
            tail: UnsafeCell::new(None),
            lock: AtomicBool::new(false),
        }
    }

    fn lock(&self) {
        while self.lock.swap(true, Ordering::Acquire) {
            std::hint::spin_loop();
        }
    }

    fn unlock(&self) {
        self.lock.store(false, Ordering::Release);
    }

    /// Pushes a node onto the back of the queue, taking the spinlock itself.
    ///
    /// # Safety
    /// `node` must stay valid and pinned for as long as it remains linked.
    pub(crate) unsafe fn push(&self, node: NonNull<WaitNode>) {
        self.lock();
        self.push_locked(node);
        self.unlock();
    }

    /// Pushes a node onto the back of the queue. Caller must already hold
    /// the spinlock (see [`Self::lock_for`]).
    ///
    /// # Safety
    /// `node` must stay valid and pinned for as long as it remains linked.
    pub(crate) unsafe fn push_locked(&self, node: NonNull<WaitNode>) {
        let tail_ptr = self.tail.get();
        let head_ptr = self.head.get();

        (*node.as_ptr()).next = None;

        if let Some(mut t) = *tail_ptr {
            t.as_mut().next = Some(node);
            *tail_ptr = Some(node);
        } else {
            *head_ptr = Some(node);
            *tail_ptr = Some(node);
        }
    }

    /// Pops the head node off the queue.
    pub(crate) fn pop(&self) -> Option<NonNull<WaitNode>> {
        self.lock();
        let ret = unsafe { self.pop_locked() };
        self.unlock();
        ret
    }

    /// Pops the head node off the queue. Caller must already hold the
    /// spinlock.
    ///
    /// # Safety
    /// Caller must hold the spinlock for the duration of the call.
    pub(crate) unsafe fn pop_locked(&self) -> Option<NonNull<WaitNode>> {
        let head_ptr = self.head.get();
        let tail_ptr = self.tail.get();

        let ret = *head_ptr;
        if let Some(h) = ret {
            *head_ptr = h.as_ref().next;
            if (*head_ptr).is_none() {
                *tail_ptr = None;
            }
        }
        ret
    }

    /// Takes the spinlock. Exposed so a caller can push a node and update
    /// other shared state atomically under the same critical section.
    ///
    /// # Safety
    /// The returned guard-like critical section must be ended with
    /// [`Self::unlock_external`].
    pub(crate) unsafe fn lock_for_push(&self) {
        self.lock();
    }

    /// Releases the spinlock taken by [`Self::lock_for_push`].
    ///
    /// # Safety
    /// Must only be called while the spinlock is held by the current thread.
    pub(crate) unsafe fn unlock_external(&self) {
        self.unlock();
    }
}

unsafe impl Sync for WaitQueue {}
unsafe impl Send for WaitQueue {}
