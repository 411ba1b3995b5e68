//! Low-level synchronization building blocks.
//!
//! Everything here is private to the crate: callers never touch a
//! [`Semaphore`] directly, only through [`crate::group::ResourceGroup`].

mod semaphore;
mod wait_queue;

pub(crate) use semaphore::Semaphore;
