//! Host runtime contract trait.
//!
//! The host runtime owns a graph of dynamically-typed objects. Native code
//! never sees those objects directly; it holds [`RawHandle`]s and asks the
//! runtime to act on them. The trait is deliberately minimal: it covers
//! exactly the operations the proxy layer needs and nothing else — it is
//! not a reflection layer.
//!
//! # Contract
//!
//! - Every method must be called while the session's [`HostLock`] is held.
//!   The runtime itself does not check this; the proxy layer brackets every
//!   call.
//! - Methods returning a `RawHandle` (including each element of a returned
//!   `Vec`) transfer ownership of a fresh reference to the caller, who must
//!   eventually pass it to [`HostRuntime::release`].
//! - Equality and hashing of host objects are the runtime's to define;
//!   native code never compares handles by their raw value.
//!
//! [`HostLock`]: crate::lock::HostLock

use thiserror::Error;

use crate::handle::RawHandle;

/// The single uniform error kind for failures raised by the host runtime.
///
/// Heterogeneous host-side exception types never cross this boundary; the
/// runtime folds them all into `HostError`.
#[non_exhaustive]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    /// The host raised an exception while executing an operation.
    #[error("host raised during `{op}`: {message}")]
    Raised { op: String, message: String },

    /// A value view was requested on an object of the wrong host type.
    #[error("host object does not view as {expected}")]
    TypeMismatch { expected: &'static str },

    /// The handle does not name a live host object.
    #[error("unknown host handle {0:?}")]
    UnknownHandle(RawHandle),
}

/// The contract an external dynamically-typed runtime must satisfy.
///
/// Object-safe and `Send + Sync`: one runtime instance is shared by every
/// native thread, with mutual exclusion provided by the session lock, not
/// by the runtime.
pub trait HostRuntime: Send + Sync {
    /// Invoke the named capability on a host object.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the method is absent or the host raised.
    fn call_method(
        &self,
        target: RawHandle,
        name: &str,
        args: &[RawHandle],
    ) -> Result<RawHandle, HostError>;

    /// Invoke a host callable object (e.g. a user-supplied policy callback).
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the object is not callable or the host raised.
    fn call_function(
        &self,
        callable: RawHandle,
        args: &[RawHandle],
    ) -> Result<RawHandle, HostError>;

    /// Whether the host object exposes a method with the given name.
    ///
    /// Used only by capability validation, never on the hot path.
    fn has_method(&self, target: RawHandle, name: &str) -> bool;

    /// Whether the handle refers to the host's none/null value.
    fn is_none(&self, handle: RawHandle) -> bool;

    /// The host truth value of the object.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the object has no truth value.
    fn truthy(&self, handle: RawHandle) -> Result<bool, HostError>;

    /// View the object as a float.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::TypeMismatch`] if the object is not numeric.
    fn as_float(&self, handle: RawHandle) -> Result<f64, HostError>;

    /// View the object as an integer.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::TypeMismatch`] if the object is not an integer.
    fn as_int(&self, handle: RawHandle) -> Result<i64, HostError>;

    /// Arity of a host tuple.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::TypeMismatch`] if the object is not a tuple.
    fn tuple_len(&self, handle: RawHandle) -> Result<usize, HostError>;

    /// Element `index` of a host tuple, as a fresh reference.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the object is not a tuple or the index is
    /// out of range.
    fn tuple_get(&self, handle: RawHandle, index: usize) -> Result<RawHandle, HostError>;

    /// All elements of a host sequence, as fresh references.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::TypeMismatch`] if the object is not a sequence.
    fn list_elems(&self, handle: RawHandle) -> Result<Vec<RawHandle>, HostError>;

    /// Build a host list from the given elements (borrowed, not consumed).
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the host cannot allocate the list.
    fn make_list(&self, elems: &[RawHandle]) -> Result<RawHandle, HostError>;

    /// All keys of a host mapping, as fresh references.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::TypeMismatch`] if the object is not a mapping.
    fn dict_keys(&self, handle: RawHandle) -> Result<Vec<RawHandle>, HostError>;

    /// Look up `key` in a host mapping, as a fresh reference.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the object is not a mapping or the key is
    /// absent.
    fn dict_get(&self, handle: RawHandle, key: RawHandle) -> Result<RawHandle, HostError>;

    /// Host-defined equality of two objects.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the host comparison raised.
    fn equals(&self, a: RawHandle, b: RawHandle) -> Result<bool, HostError>;

    /// Host-defined hash of an object.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the object is unhashable.
    fn hash_value(&self, handle: RawHandle) -> Result<u64, HostError>;

    /// Duplicate a reference through the runtime's own reference semantics.
    fn clone_ref(&self, handle: RawHandle) -> RawHandle;

    /// Release one reference. Releasing may trigger host-side effects, so
    /// callers must hold the session lock.
    fn release(&self, handle: RawHandle);
}
