//! Error kinds raised synchronously at the call site (spec.md §7).
//!
//! `DoubleConstructionInvariant` is deliberately not a variant here: per
//! spec it is a fatal internal-consistency assertion ("cycle in parent
//! chain", "asymmetric adjacency", "duplicate root in held set"), not a
//! recoverable error, and is raised as a plain `panic!` at the point of
//! violation instead — see [`crate::group::invariant_violation`].

use thiserror::Error;

/// Errors a caller can recover from.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A [`crate::group::ResourceGroup`] operation was attempted after
    /// `Free` had already been called on it.
    #[error("resource group used after it was freed")]
    UsageAfterFree,

    /// `Connect`, `Disconnect`, or `CreateAndAcquireResource` referenced a
    /// resource whose current root is not in the group's held set.
    #[error("resource is not held by this group")]
    ResourceNotHeld,

    /// `Disconnect(a, a)`.
    #[error("a resource cannot be disconnected from itself")]
    SelfDisconnect,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
