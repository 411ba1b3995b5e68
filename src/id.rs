//! The disjoint-set forest (spec.md §3, §4.1).
//!
//! Grounded on `ryancinsight-halo`'s `BrandedDisjointSet` (`collections::
//! other::disjoint_set`): the same find-with-path-compression, union-style
//! algorithm, generalized from branded arena indices (`Cell<usize>` in a
//! `BrandedVec`, alive only inside one `GhostToken` scope) to `Arc`-shared
//! nodes, since here resources are long-lived, reference-typed, created and
//! dropped from many independent threads rather than living in a single
//! token-scoped arena (spec.md §9, Design Notes: "use arena-allocated ids
//! (stable handles) plus a side table for parent pointers").
//!
//! A node's parent is represented as `None` when the node is its own root —
//! this sidesteps ever constructing a self-referential `Arc` cycle, which a
//! literal "parent points to self" encoding would require.

use std::cmp::Ordering as CmpOrdering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use crate::sync::Semaphore;

struct IdInner {
    key: u64,
    parent: Mutex<Option<Arc<IdInner>>>,
    semaphore: Semaphore,
}

/// A node in the disjoint-set forest. Cheap to clone (an `Arc` bump); two
/// clones referring to the same node compare equal.
#[derive(Clone)]
pub(crate) struct ResourceId(Arc<IdInner>);

impl ResourceId {
    /// Allocates a brand-new node, initially its own root, with the next
    /// monotonic key from `world`.
    ///
    /// `held` seeds the class lock already acquired — used by
    /// `CreateAndAcquireResource` and by the fresh merge/split roots in
    /// `Connect`/`Disconnect`, all of which must hand the caller a lock it
    /// already holds without a separate acquire round-trip.
    pub(crate) fn new(key: u64, held: bool) -> Self {
        Self(Arc::new(IdInner {
            key,
            parent: Mutex::new(None),
            semaphore: Semaphore::new(held),
        }))
    }

    /// This node's own key. Strictly monotonic in creation order
    /// (spec.md §8, invariant 4).
    pub(crate) fn key(&self) -> u64 {
        self.0.key
    }

    /// Walks parent pointers to the current root, then re-points every
    /// visited node directly at that root (path compression, spec.md §8
    /// invariant 5: "after any `current-root` call on `A`, `A.parent` is
    /// `A.root` directly").
    pub(crate) fn current_root(&self) -> ResourceId {
        let mut node = self.0.clone();
        loop {
            let next = {
                let guard = node.parent.lock().unwrap();
                guard.clone()
            };
            match next {
                None => break,
                Some(parent) => node = parent,
            }
        }
        let root = node;

        let mut cur = self.0.clone();
        while !Arc::ptr_eq(&cur, &root) {
            let mut guard = cur.parent.lock().unwrap();
            let next = match &*guard {
                None => break,
                Some(parent) => parent.clone(),
            };
            *guard = Some(root.clone());
            drop(guard);
            cur = next;
        }

        ResourceId(root)
    }

    /// Overwrites this node's parent pointer. Only valid to call on a node
    /// that is currently a root, while the caller holds the class lock of
    /// every affected class (spec.md §4.1, §4.3.2, §4.3.3).
    pub(crate) fn set_parent(&self, new_root: &ResourceId) {
        let mut guard = self.0.parent.lock().unwrap();
        *guard = Some(new_root.0.clone());
    }

    /// Blocks until this root's class lock is acquired.
    pub(crate) fn acquire(&self) {
        self.0.semaphore.acquire();
    }

    /// Releases this root's class lock. May be called from any thread
    /// (spec.md §9: "the source uses [a semaphore]... release may be
    /// performed by any thread").
    pub(crate) fn release(&self) {
        self.0.semaphore.release();
    }
}

impl PartialEq for ResourceId {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ResourceId {}

impl Hash for ResourceId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.key.hash(state);
    }
}

impl PartialOrd for ResourceId {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for ResourceId {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.0.key.cmp(&other.0.key)
    }
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceId").field("key", &self.0.key).finish()
    }
}
