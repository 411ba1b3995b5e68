//! The process-wide "world": the monotonic key counter and the fairness
//! gate, made an explicit value instead of ambient global state (spec.md
//! §9: "encode them as an explicit 'world' value created at startup; do not
//! lean on implicit global initialization order. Tests must be able to
//! instantiate a private world.").
//!
//! A single [`World::shared()`] backs [`crate::Resource::create`] and the
//! other free functions in §6; tests that want isolation from each other
//! construct their own with [`World::new`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use crate::gate::Gate;

/// Default restart budget before a [`crate::group::ResourceGroup`] closes
/// the fairness gate (spec.md §9, Open Question 2: "implementers should
/// choose a small constant (e.g., 3-8)").
pub const DEFAULT_RESTART_THRESHOLD: u32 = 4;

/// Owns the pieces of state the spec calls out as process-wide: the
/// strictly monotonic key counter that backs [`crate::id::ResourceId`]
/// ordering, and the fairness [`Gate`].
pub struct World {
    next_key: AtomicU64,
    pub(crate) gate: Gate,
    pub(crate) restart_threshold: u32,
}

impl World {
    /// Creates a private world with the default restart threshold.
    pub fn new() -> Self {
        Self::with_restart_threshold(DEFAULT_RESTART_THRESHOLD)
    }

    /// Creates a private world with an explicit restart threshold `K`
    /// (spec.md §4.3.5, §9).
    ///
    /// # Panics
    /// Panics if `threshold` is zero — a gate that closes before a single
    /// restart is attempted can never let the acquiring group make
    /// progress.
    pub fn with_restart_threshold(threshold: u32) -> Self {
        assert!(threshold > 0, "restart threshold must be positive");
        Self {
            next_key: AtomicU64::new(0),
            gate: Gate::new(),
            restart_threshold: threshold,
        }
    }

    /// Allocates the next strictly monotonic key. Keys are never reused and
    /// never decrease for the lifetime of the world (spec.md §3, invariant
    /// 4 in §8).
    pub(crate) fn next_key(&self) -> u64 {
        self.next_key.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

static SHARED: OnceLock<World> = OnceLock::new();

/// The process-wide world backing the free functions in [`crate::resource`].
pub(crate) fn shared() -> &'static World {
    SHARED.get_or_init(World::new)
}
