//! One-handle typed value wrappers.
//!
//! Each wrapper owns exactly one [`ObjectRef`]. Checked construction
//! (`from_host`) rejects the host none value; the trusted path
//! (`from_trusted`) exists for handles the proxy itself just obtained from
//! a call whose contract guarantees validity.

use quarry_core::ObjectRef;

use crate::error::ProxyError;

/// Common surface of every typed wrapper, so container shapes
/// ([`AgentMap`], [`EventSpace`], outcomes) compose generically.
///
/// [`AgentMap`]: crate::agent::AgentMap
/// [`EventSpace`]: crate::space::EventSpace
pub trait HostValue: Sized {
    /// Wrapper name used in error messages.
    const KIND: &'static str;

    /// Wrap without validity checking. The caller vouches for the handle.
    fn from_trusted(obj: ObjectRef) -> Self;

    /// The wrapped reference.
    fn as_host(&self) -> &ObjectRef;

    /// Unwrap, transferring ownership of the reference.
    fn into_host(self) -> ObjectRef;

    /// Checked construction: rejects the host none value.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::NullHandle`] if the handle is the host none.
    fn from_host(obj: ObjectRef) -> Result<Self, ProxyError> {
        if obj.is_none_value() {
            return Err(ProxyError::NullHandle { kind: Self::KIND });
        }
        Ok(Self::from_trusted(obj))
    }

    /// Host-defined equality with another wrapper of the same kind.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::HostCall`] if the host comparison raised.
    fn try_eq(&self, other: &Self) -> Result<bool, ProxyError> {
        self.as_host()
            .try_eq(other.as_host())
            .map_err(|source| ProxyError::host("equals", source))
    }

    /// Host-defined hash of the wrapped object.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::HostCall`] if the object is unhashable.
    fn try_hash(&self) -> Result<u64, ProxyError> {
        self.as_host()
            .host_hash()
            .map_err(|source| ProxyError::host("hash", source))
    }
}

macro_rules! host_wrapper {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name(ObjectRef);

        impl HostValue for $name {
            const KIND: &'static str = stringify!($name);

            fn from_trusted(obj: ObjectRef) -> Self {
                Self(obj)
            }

            fn as_host(&self) -> &ObjectRef {
                &self.0
            }

            fn into_host(self) -> ObjectRef {
                self.0
            }
        }
    };
}

host_wrapper! {
    /// A domain state.
    State
}

host_wrapper! {
    /// An observation of a domain state. Distinct from [`State`] only in
    /// partially observable domains.
    Observation
}

host_wrapper! {
    /// An event the environment may produce. Collapses to [`Action`] in
    /// fully controllable domains.
    Event
}

host_wrapper! {
    /// An action an agent may take.
    Action
}

host_wrapper! {
    /// A transition value. Reward and cost are mutually-derivable negatives.
    Value
}

host_wrapper! {
    /// A boolean-valued host object (e.g. a termination flag).
    Predicate
}

host_wrapper! {
    /// Auxiliary transition information. The host may legitimately return
    /// none here, so `Info` accepts the none value even in checked mode.
    Info
}

host_wrapper! {
    /// An agent identifier, used only by multi-agent domains.
    Agent
}

impl Value {
    /// The transition value viewed as a reward (host float).
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::HostCall`] if the value is not numeric.
    pub fn reward(&self) -> Result<f64, ProxyError> {
        let obj = self.as_host();
        let session = obj.session();
        let _guard = session.lock().acquire();
        session
            .runtime()
            .as_float(obj.raw())
            .map_err(|source| ProxyError::host("value.reward", source))
    }

    /// The transition value viewed as a cost: `-reward()`.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::HostCall`] if the value is not numeric.
    pub fn cost(&self) -> Result<f64, ProxyError> {
        self.reward().map(|r| -r)
    }
}

impl Predicate {
    /// The boolean view of the predicate (host truthiness).
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::HostCall`] if the object has no truth value.
    pub fn holds(&self) -> Result<bool, ProxyError> {
        let obj = self.as_host();
        let session = obj.session();
        let _guard = session.lock().acquire();
        session
            .runtime()
            .truthy(obj.raw())
            .map_err(|source| ProxyError::host("predicate.holds", source))
    }
}

impl Info {
    /// `Info` tolerates the host none value: absent auxiliary information
    /// is a legal host response, not a construction error.
    #[must_use]
    pub fn from_host_or_none(obj: ObjectRef) -> Self {
        Self::from_trusted(obj)
    }
}
