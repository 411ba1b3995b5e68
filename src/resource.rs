//! The user-visible handle: a resource's connectivity and its associated
//! object (spec.md §3, §4.2).

use std::sync::{Arc, Mutex};

use arc_swap::ArcSwapOption;

use crate::error::{Error, Result};
use crate::group::ResourceGroup;
use crate::id::ResourceId;
use crate::world::{self, World};

struct ClosureCache<T> {
    dirty: bool,
    cache: Vec<Resource<T>>,
}

struct ResourceInner<T> {
    id: ResourceId,
    // Self-inclusive: `self` is always present (spec.md §3: "R ∈
    // R.neighbors").
    adjacency: Mutex<Vec<Resource<T>>>,
    closure: Mutex<ClosureCache<T>>,
    // Opaque user payload, never read by the core. spec.md §9 Open
    // Question 3 offers two ways to satisfy "unsynchronized by design"
    // without introducing undefined behavior in safe Rust: leave it racy
    // (impossible to do soundly for an arbitrary `T` without `unsafe`), or
    // make it atomic. We take the latter: an independent lock-free swap
    // that is never acquired together with the class lock, so it carries
    // none of the class lock's ordering guarantees.
    associated_object: ArcSwapOption<T>,
}

/// A logical unit of mutual exclusion (spec.md §3, Glossary).
///
/// Cheap to clone — clones are handles to the same underlying resource, the
/// way `Arc<T>` clones are.
pub struct Resource<T = ()> {
    inner: Arc<ResourceInner<T>>,
}

impl<T> Clone for Resource<T> {
    fn clone(&self) -> Self {
        Resource {
            inner: self.inner.clone(),
        }
    }
}

impl<T> PartialEq for Resource<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl<T> Eq for Resource<T> {}

impl<T: Send + Sync + 'static> Resource<T> {
    pub(crate) fn new_in(world: &World, held: bool) -> Self {
        let id = ResourceId::new(world.next_key(), held);
        let resource = Resource {
            inner: Arc::new(ResourceInner {
                id: id.clone(),
                adjacency: Mutex::new(Vec::new()),
                closure: Mutex::new(ClosureCache {
                    dirty: true,
                    cache: Vec::new(),
                }),
                associated_object: ArcSwapOption::from(None),
            }),
        };
        resource.inner.adjacency.lock().unwrap().push(resource.clone());
        resource
    }

    /// Returns a fresh, disconnected, unacquired resource (spec.md §6,
    /// free function `Create`).
    pub fn create() -> Self {
        Self::new_in(world::shared(), false)
    }

    /// Returns a new resource already edge-connected to `self`: creates a
    /// group, acquires `self`, creates-and-acquires the new resource,
    /// connects them, frees (spec.md §6, method `CreateConnected`).
    pub fn create_connected(&self) -> Self {
        let mut group = ResourceGroup::create_acquiring_in(world::shared(), &[self.clone()]);
        let created = group.create_and_acquire_resource_unchecked();
        group
            .connect(self, &created)
            .expect("both resources held by this group");
        group.free().expect("group is still active");
        created
    }

    /// Returns a new resource connected to every one of `resources`:
    /// acquires all of them, creates a new resource, connects it to each,
    /// frees (spec.md §6, variadic free function `CreateConnected`).
    pub fn create_connected_to(resources: &[Resource<T>]) -> Self {
        let world = world::shared();
        let mut group = ResourceGroup::create_acquiring_in(world, resources);
        let created = group.create_and_acquire_resource_unchecked();
        for r in resources {
            group
                .connect(r, &created)
                .expect("both resources held by this group");
        }
        group.free().expect("group is still active");
        created
    }

    /// A stable identity for this resource, unaffected by merges/splits of
    /// the class it belongs to (its *root* does change; this does not).
    /// Useful as a map key or in diagnostics.
    pub fn id(&self) -> u64 {
        self.inner.id.key()
    }

    /// Whether `self` and `other` currently belong to the same connected
    /// class, i.e. share a root (spec.md §8, invariants 1 and 7). The
    /// answer can change as `Connect`/`Disconnect` run, so it only reflects
    /// the state at the moment of the call.
    pub fn shares_class_with(&self, other: &Resource<T>) -> bool {
        self.current_root() == other.current_root()
    }

    /// Reads the current associated object, if any.
    pub fn associated_object(&self) -> Option<Arc<T>> {
        self.inner.associated_object.load_full()
    }

    /// Replaces the associated object. Unsynchronized relative to every
    /// other operation on this resource, including its own class lock, by
    /// design (spec.md §9, Open Question 3).
    pub fn set_associated_object(&self, value: T) {
        self.inner.associated_object.store(Some(Arc::new(value)));
    }

    pub(crate) fn current_root(&self) -> ResourceId {
        self.inner.id.current_root()
    }

    pub(crate) fn own_id(&self) -> &ResourceId {
        &self.inner.id
    }

    /// Adds `other` to this resource's adjacency list (and vice versa) if
    /// absent, marking both closure caches dirty. Idempotent (spec.md
    /// invariant 6).
    pub(crate) fn direct_connect(&self, other: &Resource<T>) {
        if self == other {
            return;
        }
        {
            let mut adj = self.inner.adjacency.lock().unwrap();
            if !adj.contains(other) {
                adj.push(other.clone());
            } else {
                return; // already connected; invariant 6 — no-op
            }
        }
        {
            let mut adj = other.inner.adjacency.lock().unwrap();
            if !adj.contains(self) {
                adj.push(self.clone());
            }
        }
        self.inner.closure.lock().unwrap().dirty = true;
        other.inner.closure.lock().unwrap().dirty = true;
    }

    /// Removes the edge in both directions. Rejects self-disconnect
    /// (spec.md §4.2).
    pub(crate) fn direct_disconnect(&self, other: &Resource<T>) -> Result<()> {
        if self == other {
            return Err(Error::SelfDisconnect);
        }
        self.inner.adjacency.lock().unwrap().retain(|r| r != other);
        other.inner.adjacency.lock().unwrap().retain(|r| r != self);
        self.inner.closure.lock().unwrap().dirty = true;
        other.inner.closure.lock().unwrap().dirty = true;
        Ok(())
    }

    /// Read-only view of direct neighbors, self included (spec.md §4.2).
    pub(crate) fn direct_neighbors(&self) -> Vec<Resource<T>> {
        self.inner.adjacency.lock().unwrap().clone()
    }

    /// Returns the connectivity closure, recomputing by flood fill if the
    /// dirty flag is set, otherwise returning the cache (spec.md §4.2).
    pub(crate) fn connected_closure(&self) -> Vec<Resource<T>> {
        let mut state = self.inner.closure.lock().unwrap();
        if state.dirty {
            state.cache = self.flood_fill();
            state.dirty = false;
        }
        state.cache.clone()
    }

    fn flood_fill(&self) -> Vec<Resource<T>> {
        let mut seen = vec![self.clone()];
        let mut frontier = vec![self.clone()];
        while let Some(r) = frontier.pop() {
            for n in r.direct_neighbors() {
                if !seen.contains(&n) {
                    seen.push(n.clone());
                    frontier.push(n);
                }
            }
        }
        seen
    }

    /// Rewrites this resource's own id's parent pointer to `new_root`. Only
    /// called by a [`ResourceGroup`] during connect/disconnect while
    /// holding locks on every affected class (spec.md §4.2).
    pub(crate) fn reset_root(&self, new_root: &ResourceId) {
        self.inner.id.set_parent(new_root);
    }
}
