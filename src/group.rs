//! The only surface through which resources are created, connected,
//! disconnected, acquired, or freed (spec.md §3, §4.3).

use std::marker::PhantomData;

use crate::error::{Error, Result};
use crate::id::ResourceId;
use crate::resource::Resource;
use crate::world::{self, World};

#[derive(Debug, PartialEq, Eq)]
enum GroupState {
    Active,
    Freed,
}

/// A transient, single-thread, non-reentrant holder of currently-acquired
/// resources (spec.md §3, §4.3.6).
///
/// `FRESH` from the state machine in §4.3.6 is never observable: every
/// constructor below runs the acquisition protocol to completion (possibly
/// acquiring nothing) before returning, so a `ResourceGroup` is always
/// handed to the caller already `ACTIVE`.
pub struct ResourceGroup<'w, T> {
    world: &'w World,
    held: Vec<ResourceId>,
    state: GroupState,
    gate_closed_by_me: bool,
    _marker: PhantomData<fn() -> T>,
}

#[cold]
fn invariant_violation(detail: &str) -> ! {
    panic!("meshlock: internal invariant violated: {detail}");
}

impl<'w, T: Send + Sync + 'static> ResourceGroup<'w, T> {
    fn new(world: &'w World) -> Self {
        Self {
            world,
            held: Vec::new(),
            state: GroupState::Active,
            gate_closed_by_me: false,
            _marker: PhantomData,
        }
    }

    /// A group holding nothing, backed by the process-wide world (spec.md
    /// §6, `CreateEmpty`).
    pub fn create_empty() -> ResourceGroup<'static, T> {
        ResourceGroup::create_empty_in(world::shared())
    }

    /// A group holding nothing, backed by an explicit [`World`] (spec.md §9:
    /// "tests must be able to instantiate a private world").
    pub fn create_empty_in(world: &'w World) -> Self {
        Self::new(world)
    }

    /// Runs the acquisition protocol over `resources` and returns only once
    /// every class containing any of them is exclusively locked, backed by
    /// the process-wide world (spec.md §6, §4.3.1, `CreateAcquiring`).
    pub fn create_acquiring(resources: &[Resource<T>]) -> ResourceGroup<'static, T> {
        ResourceGroup::create_acquiring_in(world::shared(), resources)
    }

    /// As [`Self::create_acquiring`], backed by an explicit [`World`].
    pub fn create_acquiring_in(world: &'w World, resources: &[Resource<T>]) -> Self {
        let mut group = Self::new(world);
        group.acquire_all(resources);
        group
    }

    fn ensure_active(&self) -> Result<()> {
        match self.state {
            GroupState::Active => Ok(()),
            GroupState::Freed => Err(Error::UsageAfterFree),
        }
    }

    fn is_held(&self, root: &ResourceId) -> bool {
        self.held.iter().any(|h| h == root)
    }

    fn push_held(&mut self, root: ResourceId) {
        if self.is_held(&root) {
            invariant_violation("duplicate root inserted into held set");
        }
        self.held.push(root);
    }

    /// The acquisition protocol (spec.md §4.3.5): lock each resource's
    /// current root in strictly ascending key order, re-validating after
    /// every blocking lock attempt since the connectivity graph may have
    /// changed while this thread was asleep. Terminates without deadlock
    /// because every newly introduced root has a strictly greater key than
    /// any root that existed before it, so "lock in ascending key order"
    /// is a consistent global partial order no matter how many merges or
    /// splits race against this acquisition.
    fn acquire_all(&mut self, resources: &[Resource<T>]) {
        if resources.is_empty() {
            return;
        }

        self.world.gate.wait_for_admission();
        let mut restart_budget = self.world.restart_threshold;

        loop {
            let mut targets: Vec<ResourceId> = resources
                .iter()
                .map(Resource::current_root)
                .filter(|root| !self.is_held(root))
                .collect();
            targets.sort();
            targets.dedup();

            let Some(next) = targets.into_iter().next() else {
                break;
            };

            #[cfg(feature = "tracing")]
            tracing::trace!(key = next.key(), "acquiring candidate root");

            next.acquire();

            let still_needed = resources.iter().any(|r| r.current_root() == next);
            if still_needed {
                self.push_held(next);
            } else {
                #[cfg(feature = "tracing")]
                tracing::debug!(key = next.key(), "acquired root went stale, restarting");
                next.release();
                restart_budget = restart_budget.saturating_sub(1);
                if restart_budget == 0 && !self.gate_closed_by_me {
                    self.world.gate.close();
                    self.gate_closed_by_me = true;
                }
            }
        }

        if self.gate_closed_by_me {
            self.world.gate.reopen();
            self.gate_closed_by_me = false;
        }
    }

    /// Allocates a brand-new resource whose class is already held by this
    /// group (spec.md §4.3.1, `Create-and-acquire`). Errors if the group
    /// has already been freed.
    pub fn create_and_acquire_resource(&mut self) -> Result<Resource<T>> {
        self.ensure_active()?;
        Ok(self.create_and_acquire_resource_unchecked())
    }

    pub(crate) fn create_and_acquire_resource_unchecked(&mut self) -> Resource<T> {
        let resource = Resource::new_in(self.world, true);
        self.push_held(resource.current_root());
        resource
    }

    /// Records an adjacency edge between `a` and `b`, merging their classes
    /// under one fresh root if they are not already in the same class
    /// (spec.md §4.3.2). Both `a` and `b` must have their current roots in
    /// this group's held set.
    pub fn connect(&mut self, a: &Resource<T>, b: &Resource<T>) -> Result<()> {
        self.ensure_active()?;
        let root_a = a.current_root();
        let root_b = b.current_root();
        if !self.is_held(&root_a) || !self.is_held(&root_b) {
            return Err(Error::ResourceNotHeld);
        }

        if root_a != root_b {
            let merged = ResourceId::new(self.world.next_key(), true);

            #[cfg(feature = "tracing")]
            tracing::trace!(
                old_a = root_a.key(),
                old_b = root_b.key(),
                merged = merged.key(),
                "classes merged"
            );

            root_a.set_parent(&merged);
            root_b.set_parent(&merged);
            root_a.release();
            root_b.release();

            self.held.retain(|r| *r != root_a && *r != root_b);
            self.push_held(merged);
        }

        a.direct_connect(b);
        Ok(())
    }

    /// Removes the direct edge between `a` and `b`, splitting the class
    /// into two fresh roots if that edge was the only path between them
    /// (spec.md §4.3.3). Both must have their current roots in this
    /// group's held set.
    pub fn disconnect(&mut self, a: &Resource<T>, b: &Resource<T>) -> Result<()> {
        self.ensure_active()?;
        if a == b {
            return Err(Error::SelfDisconnect);
        }

        let root_a = a.current_root();
        let root_b = b.current_root();
        if !self.is_held(&root_a) || !self.is_held(&root_b) {
            return Err(Error::ResourceNotHeld);
        }

        a.direct_disconnect(b)?;

        if root_a != root_b {
            // `a` and `b` were never in the same class (no edge existed
            // between them for `direct_disconnect` to remove) — nothing
            // to split.
            return Ok(());
        }

        let closure_a = a.connected_closure();
        if closure_a.iter().any(|r| r == b) {
            // Still reachable through another path — class unchanged
            // (spec.md §8, invariant 7).
            return Ok(());
        }

        // The edge removed was the only path: the class splits in two
        // (spec.md §8, invariant 8: both fresh roots postdate every
        // previously existing key).
        let shared_root = root_a;
        let closure_b = b.connected_closure();

        let p1 = ResourceId::new(self.world.next_key(), true);
        let p2 = ResourceId::new(self.world.next_key(), true);

        #[cfg(feature = "tracing")]
        tracing::trace!(
            old = shared_root.key(),
            split_a = p1.key(),
            split_b = p2.key(),
            "class split"
        );

        for r in &closure_a {
            r.reset_root(&p1);
        }
        for r in &closure_b {
            r.reset_root(&p2);
        }

        // The old root is unreachable from every live resource now; its
        // lock is abandoned (spec.md §9, Open Question 1 — abandoned
        // *and* released, so a stray reference would acquire it once and
        // then block forever, which the spec accepts as unreachable in
        // practice).
        shared_root.release();

        self.held.retain(|r| *r != shared_root);
        self.push_held(p1);
        self.push_held(p2);

        Ok(())
    }

    /// Read-only view of `r`'s direct neighbors (spec.md §6,
    /// `DirectlyConnectedTo`). `r`'s current root must be held.
    pub fn directly_connected_to(&self, r: &Resource<T>) -> Result<Vec<Resource<T>>> {
        self.ensure_active()?;
        let root = r.current_root();
        if !self.is_held(&root) {
            return Err(Error::ResourceNotHeld);
        }
        Ok(r.direct_neighbors())
    }

    /// Releases every held root's lock and clears the held set. Further
    /// operations on this group fail with [`Error::UsageAfterFree`]
    /// (spec.md §4.3.4, §4.3.6).
    pub fn free(&mut self) -> Result<()> {
        self.ensure_active()?;
        for root in self.held.drain(..) {
            root.release();
        }
        self.state = GroupState::Freed;
        Ok(())
    }
}

impl<'w, T> Drop for ResourceGroup<'w, T> {
    fn drop(&mut self) {
        // Interruption safety is an explicit non-goal (spec.md §5): a group
        // dropped without calling `Free` leaks its held locks exactly as
        // the spec says an interrupted acquisition should. We do not
        // release on drop.
    }
}
