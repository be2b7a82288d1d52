//! Quarry Core: the host-runtime contract and lock bridge.
//!
//! This crate defines the boundary between native search code and the
//! external dynamically-typed host runtime. It depends on nothing internal.
//!
//! # Crate dependency graph
//!
//! ```text
//! quarry_core  ←  quarry_proxy  ←  quarry_solver
//! (handles, lock)  (typed wrappers)   (axes, resolver, engine)
//! ```
//!
//! # Key types
//!
//! - [`HostRuntime`] — the minimal object-safe contract a host must satisfy
//! - [`HostError`] — the single uniform error kind for host-raised failures
//! - [`HostLock`] — the reentrant global lock serializing all host access
//! - [`HostSession`] — shared pairing of a runtime with its lock
//! - [`ObjectRef`] — an owned host-object reference with lock-bracketed
//!   clone/release
//! - [`ReplicaTable`] — per-worker private domain copies with a shared
//!   fallback

#![forbid(unsafe_code)]

pub mod handle;
pub mod lock;
pub mod replica;
pub mod runtime;

pub use handle::{HostSession, ObjectRef, RawHandle};
pub use lock::{HostGuard, HostLock};
pub use replica::{ReplicaTable, WorkerId};
pub use runtime::{HostError, HostRuntime};
