//! Opaque host-object handles and the owning reference type.

use std::fmt;
use std::sync::Arc;

use crate::lock::HostLock;
use crate::runtime::{HostError, HostRuntime};

/// An opaque name for one object living in the host runtime.
///
/// The raw value carries no meaning on the native side; equality of raw
/// values is NOT host equality. `RawHandle` is `Copy` because it is only a
/// name — ownership of the underlying reference is tracked by [`ObjectRef`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawHandle(u64);

impl RawHandle {
    /// Wrap a raw handle value issued by a host runtime.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw value, for runtime implementations only.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// A host runtime paired with its global lock.
///
/// Shared (`Arc`) by every native thread touching the same host. All
/// bracketing goes through [`HostSession::lock`]; all object operations go
/// through [`HostSession::runtime`].
pub struct HostSession {
    runtime: Arc<dyn HostRuntime>,
    lock: HostLock,
}

impl HostSession {
    /// Create a session around a runtime, with a fresh unheld lock.
    #[must_use]
    pub fn new(runtime: Arc<dyn HostRuntime>) -> Arc<Self> {
        Arc::new(Self {
            runtime,
            lock: HostLock::new(),
        })
    }

    /// The runtime.
    #[must_use]
    pub fn runtime(&self) -> &dyn HostRuntime {
        &*self.runtime
    }

    /// The global host lock.
    #[must_use]
    pub fn lock(&self) -> &HostLock {
        &self.lock
    }
}

impl fmt::Debug for HostSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostSession").finish_non_exhaustive()
    }
}

/// An owned reference to one host object.
///
/// `clone` duplicates the reference through the runtime's own reference
/// semantics; `drop` releases it. Both happen under the session lock, since
/// releasing a host reference can itself trigger host-side effects.
pub struct ObjectRef {
    session: Arc<HostSession>,
    raw: RawHandle,
}

impl ObjectRef {
    /// Take ownership of an existing host reference.
    ///
    /// The caller must own exactly one reference to `raw`; that reference
    /// is released when the `ObjectRef` drops.
    #[must_use]
    pub fn adopt(session: Arc<HostSession>, raw: RawHandle) -> Self {
        Self { session, raw }
    }

    /// The handle this reference owns.
    #[must_use]
    pub fn raw(&self) -> RawHandle {
        self.raw
    }

    /// The session this reference belongs to.
    #[must_use]
    pub fn session(&self) -> &Arc<HostSession> {
        &self.session
    }

    /// Whether this reference names the host's none value.
    #[must_use]
    pub fn is_none_value(&self) -> bool {
        let _guard = self.session.lock().acquire();
        self.session.runtime().is_none(self.raw)
    }

    /// Host-defined equality with another reference.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the host comparison raised.
    pub fn try_eq(&self, other: &ObjectRef) -> Result<bool, HostError> {
        let _guard = self.session.lock().acquire();
        self.session.runtime().equals(self.raw, other.raw)
    }

    /// Host-defined hash of the referenced object.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the object is unhashable.
    pub fn host_hash(&self) -> Result<u64, HostError> {
        let _guard = self.session.lock().acquire();
        self.session.runtime().hash_value(self.raw)
    }
}

impl Clone for ObjectRef {
    fn clone(&self) -> Self {
        let _guard = self.session.lock().acquire();
        let raw = self.session.runtime().clone_ref(self.raw);
        Self {
            session: Arc::clone(&self.session),
            raw,
        }
    }
}

impl Drop for ObjectRef {
    fn drop(&mut self) {
        let _guard = self.session.lock().acquire();
        self.session.runtime().release(self.raw);
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjectRef").field(&self.raw).finish()
    }
}
