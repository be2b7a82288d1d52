//! Proxy-level error taxonomy.
//!
//! Host-raised failures arrive as [`HostError`] and are re-surfaced here
//! with the operation named; shape mismatches in host composites are their
//! own variant but are treated by callers as external call errors.

use quarry_core::HostError;
use thiserror::Error;

/// Failure of a proxy operation.
#[non_exhaustive]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProxyError {
    /// A checked wrapper construction saw the host none value.
    #[error("`{kind}` constructed over the host none value")]
    NullHandle { kind: &'static str },

    /// The host raised during a bracketed call.
    #[error("host call `{op}` failed: {source}")]
    HostCall {
        op: &'static str,
        #[source]
        source: HostError,
    },

    /// The host returned a composite that does not match the expected shape.
    #[error("host result for `{op}` has wrong shape: expected {expected}")]
    Shape {
        op: &'static str,
        expected: &'static str,
    },
}

impl ProxyError {
    /// Attach an operation name to a host error.
    #[must_use]
    pub fn host(op: &'static str, source: HostError) -> Self {
        Self::HostCall { op, source }
    }
}
