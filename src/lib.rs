//! # meshlock
//!
//! A multi-resource mutual-exclusion manager. Unrelated components each
//! guard a single [`Resource`]; when two or more resources are declared
//! [connected](ResourceGroup::connect), exclusive access to any one of them
//! implies exclusive access to the whole connected class. A [`ResourceGroup`]
//! is the only way to acquire, connect, disconnect, or create resources.
//!
//! ## Core pieces
//!
//! - [`Resource`] — the user-visible handle: its connectivity graph and an
//!   opaque, unsynchronized associated object.
//! - [`ResourceGroup`] — a short-lived, single-thread holder of currently
//!   acquired resources; the acquisition protocol it runs locks an
//!   arbitrary, possibly-disconnected set of resources without deadlock
//!   even while the connectivity graph changes mid-acquisition.
//! - [`World`] — the explicit, instantiable process state (monotonic key
//!   counter, fairness gate) that the rest of the crate is built on; a
//!   process-wide default backs the free functions on [`Resource`], and
//!   tests can build their own to run in isolation.
//!
//! ## Example
//!
//! ```rust
//! use meshlock::{Resource, ResourceGroup};
//!
//! let a = Resource::<&'static str>::create();
//! let b = Resource::create();
//!
//! let mut group = ResourceGroup::create_acquiring(&[a.clone(), b.clone()]);
//! group.connect(&a, &b).unwrap();
//! group.free().unwrap();
//!
//! // `a` and `b` now share a root: acquiring either locks both.
//! let mut group2 = ResourceGroup::create_acquiring(&[a.clone()]);
//! assert!(group2.directly_connected_to(&b).unwrap().contains(&a));
//! group2.free().unwrap();
//! ```
//!
//! ## Out of scope
//!
//! Try-acquire with a timeout and interruption safety are explicit
//! non-goals (a group interrupted mid-acquisition leaves its held locks
//! held). There is no persistence, IPC, or wire format: this is purely an
//! in-process library.

#![warn(missing_docs, clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod error;
mod gate;
mod group;
mod id;
mod resource;
mod sync;
mod world;

pub use error::{Error, Result};
pub use group::ResourceGroup;
pub use resource::Resource;
pub use world::{World, DEFAULT_RESTART_THRESHOLD};
