//! Transition and environment outcomes.
//!
//! An outcome is the `{situation, value, termination, info}` composite a
//! transition capability returns. It is built either from four discrete
//! typed fields, or parsed from one host 4-tuple.

use std::sync::Arc;

use quarry_core::ObjectRef;

use crate::agent::AgentMode;
use crate::error::ProxyError;
use crate::observe::ObservabilityMode;
use crate::values::{HostValue, Info, Predicate, State, Value};

/// The composite result of one transition.
pub struct Outcome<A: AgentMode, Sit: HostValue> {
    /// The situation reached (state or observation, per the caller's shape).
    pub situation: A::Keyed<Sit>,
    /// The transition value.
    pub value: A::Keyed<Value>,
    /// The termination flag.
    pub termination: Predicate,
    /// Auxiliary information; may wrap the host none value.
    pub info: Info,
}

impl<A: AgentMode, Sit: HostValue> std::fmt::Debug for Outcome<A, Sit>
where
    A::Keyed<Sit>: std::fmt::Debug,
    A::Keyed<Value>: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Outcome")
            .field("situation", &self.situation)
            .field("value", &self.value)
            .field("termination", &self.termination)
            .field("info", &self.info)
            .finish()
    }
}

/// An outcome whose situation is an observation.
pub type EnvironmentOutcome<A, O> = Outcome<A, <O as ObservabilityMode>::Observation>;

/// An outcome whose situation is a state.
pub type TransitionOutcome<A> = Outcome<A, State>;

impl<A: AgentMode, Sit: HostValue> Outcome<A, Sit> {
    /// Build from four discrete typed fields.
    #[must_use]
    pub fn from_parts(
        situation: A::Keyed<Sit>,
        value: A::Keyed<Value>,
        termination: Predicate,
        info: Info,
    ) -> Self {
        Self {
            situation,
            value,
            termination,
            info,
        }
    }

    /// Parse from one host composite: a `(situation, value, termination,
    /// info)` 4-tuple.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Shape`] on wrong arity, or
    /// [`ProxyError::HostCall`] if the host raised.
    pub fn from_host(obj: &ObjectRef, op: &'static str) -> Result<Self, ProxyError> {
        const EXPECTED: &str = "(situation, value, termination, info) 4-tuple";
        let session = obj.session();
        let _guard = session.lock().acquire();
        let runtime = session.runtime();

        let arity = runtime
            .tuple_len(obj.raw())
            .map_err(|source| ProxyError::host(op, source))?;
        if arity != 4 {
            return Err(ProxyError::Shape {
                op,
                expected: EXPECTED,
            });
        }

        let field = |index: usize| -> Result<ObjectRef, ProxyError> {
            let raw = runtime
                .tuple_get(obj.raw(), index)
                .map_err(|source| ProxyError::host(op, source))?;
            Ok(ObjectRef::adopt(Arc::clone(session), raw))
        };
        let situation = <A::Keyed<Sit>>::from_host(field(0)?)?;
        let value = <A::Keyed<Value>>::from_host(field(1)?)?;
        let termination = Predicate::from_host(field(2)?)?;
        let info = Info::from_host_or_none(field(3)?);

        Ok(Self {
            situation,
            value,
            termination,
            info,
        })
    }

    /// Whether the outcome terminated the episode.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError`] if the host raised.
    pub fn is_terminal(&self) -> Result<bool, ProxyError> {
        self.termination.holds()
    }
}
