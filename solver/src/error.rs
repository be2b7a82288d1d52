//! Solver error taxonomies.
//!
//! [`ConfigError`] covers everything that can abort solver construction:
//! illegal axis tags, missing domain capabilities, missing callbacks. No
//! partial solver is ever returned alongside one.
//!
//! [`SolveError`] covers failures while solving; they propagate to the
//! caller without retry — retry policy belongs to the embedding, not here.

use quarry_proxy::{MissingCapability, ProxyError};
use thiserror::Error;

/// Failure during configuration resolution. Always fatal to construction,
/// raised before any solving budget is spent.
#[non_exhaustive]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A runtime tag is outside its axis's closed legal set.
    #[error("axis `{axis}`: `{tag}` is not a legal tag (legal: {legal})")]
    IllegalTag {
        axis: &'static str,
        tag: String,
        legal: &'static str,
    },

    /// The domain handle lacks a capability the chosen combination requires.
    #[error(transparent)]
    MissingCapability(#[from] MissingCapability),

    /// An axis tag requires a user-supplied callback that was not provided.
    #[error("axis `{axis}`: the selected tag requires a callback, but none was supplied")]
    MissingCallback { axis: &'static str },
}

/// Failure while solving.
#[non_exhaustive]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SolveError {
    /// A bracketed host operation failed.
    #[error(transparent)]
    Proxy(#[from] ProxyError),

    /// A user-supplied host callback returned a malformed composite.
    #[error("host callback returned wrong shape: expected {expected}")]
    CallbackShape { expected: &'static str },

    /// Internal bookkeeping invariant broken. Surfaced, never panicked on.
    #[error("solver invariant violated: {detail}")]
    Invariant { detail: &'static str },
}
