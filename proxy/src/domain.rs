//! The typed domain operation surface.
//!
//! `DomainProxy` is shaped at compile time by the four variant axes; none
//! of its operations branch on variant at runtime. Every operation follows
//! the same bracket: acquire the session lock, resolve the per-worker
//! replica, marshal typed arguments to handles, invoke the capability,
//! unmarshal the result into wrappers, release the lock on guard drop.
//!
//! Host-raised failures are logged with the operation named and re-surfaced
//! as [`ProxyError::HostCall`]; they are never swallowed, since continuing
//! against a partially-updated host object graph is unsafe.

use std::marker::PhantomData;
use std::sync::Arc;

use quarry_core::{HostSession, ObjectRef, RawHandle, ReplicaTable, WorkerId};

use crate::agent::{AgentMap, AgentMode, MultiAgent};
use crate::capability::methods;
use crate::control::ControllabilityMode;
use crate::error::ProxyError;
use crate::memory::MemoryMode;
use crate::observe::ObservabilityMode;
use crate::outcome::{EnvironmentOutcome, Outcome};
use crate::space::{EventSpace, NextStateDistribution};
use crate::values::{Action, Agent, HostValue, Predicate, State};

/// A typed proxy bound to one external domain handle.
///
/// The type parameters select the domain-variant shape:
///
/// - `A`: single-agent vs multi-agent ([`AgentMode`])
/// - `O`: fully vs partially observable ([`ObservabilityMode`])
/// - `M`: Markovian vs history memory ([`MemoryMode`])
/// - `C`: fully vs partially controllable ([`ControllabilityMode`])
///
/// A live proxy value is confined to the thread that created it; crossing
/// threads goes through the runtime's own copy semantics under the lock.
pub struct DomainProxy<A, O, M, C>
where
    A: AgentMode,
    O: ObservabilityMode,
    M: MemoryMode,
    C: ControllabilityMode,
{
    session: Arc<HostSession>,
    replicas: ReplicaTable,
    _shape: PhantomData<fn() -> (A, O, M, C)>,
}

impl<A, O, M, C> DomainProxy<A, O, M, C>
where
    A: AgentMode,
    O: ObservabilityMode,
    M: MemoryMode,
    C: ControllabilityMode,
{
    /// Bind a proxy to the shared domain handle.
    #[must_use]
    pub fn new(domain: ObjectRef) -> Self {
        let session = Arc::clone(domain.session());
        Self {
            session,
            replicas: ReplicaTable::new(domain),
            _shape: PhantomData,
        }
    }

    /// Register a private domain replica for one worker thread.
    pub fn register_replica(&mut self, worker: WorkerId, replica: ObjectRef) {
        self.replicas.register(worker, replica);
    }

    /// The host session this proxy operates in.
    #[must_use]
    pub fn session(&self) -> &Arc<HostSession> {
        &self.session
    }

    /// The replica table.
    #[must_use]
    pub fn replicas(&self) -> &ReplicaTable {
        &self.replicas
    }

    /// The shared bracket: lock, replica, invoke, wrap.
    fn invoke(
        &self,
        worker: Option<WorkerId>,
        op: &'static str,
        args: &[RawHandle],
    ) -> Result<ObjectRef, ProxyError> {
        let _guard = self.session.lock().acquire();
        let target = self.replicas.resolve(worker);
        match self.session.runtime().call_method(target.raw(), op, args) {
            Ok(raw) => Ok(ObjectRef::adopt(Arc::clone(&self.session), raw)),
            Err(source) => {
                tracing::error!(op, error = %source, "host call failed");
                Err(ProxyError::HostCall { op, source })
            }
        }
    }

    /// Reset the domain to its initial situation.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError`] if the host raised.
    pub fn reset(&self, worker: Option<WorkerId>) -> Result<A::Keyed<O::Observation>, ProxyError> {
        let obj = self.invoke(worker, methods::RESET, &[])?;
        <A::Keyed<O::Observation>>::from_host(obj)
    }

    /// Advance the stateful environment by one event.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError`] if the host raised or the outcome is
    /// malformed.
    pub fn step(
        &self,
        event: &A::Keyed<C::Event>,
        worker: Option<WorkerId>,
    ) -> Result<EnvironmentOutcome<A, O>, ProxyError> {
        let _guard = self.session.lock().acquire();
        let obj = self.invoke(worker, methods::STEP, &[event.as_host().raw()])?;
        Outcome::from_host(&obj, methods::STEP)
    }

    /// Sample one transition from the given memory.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError`] if the host raised or the outcome is
    /// malformed.
    pub fn sample(
        &self,
        memory: &M::Memory<A::Keyed<State>>,
        event: &A::Keyed<C::Event>,
        worker: Option<WorkerId>,
    ) -> Result<EnvironmentOutcome<A, O>, ProxyError> {
        let _guard = self.session.lock().acquire();
        let mem = M::as_host(memory, &self.session)?;
        let obj = self.invoke(
            worker,
            methods::SAMPLE,
            &[mem.raw(), event.as_host().raw()],
        )?;
        Outcome::from_host(&obj, methods::SAMPLE)
    }

    /// The applicable-action space for the given memory.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError`] if the host raised.
    pub fn get_applicable_actions(
        &self,
        memory: &M::Memory<A::Keyed<State>>,
        worker: Option<WorkerId>,
    ) -> Result<A::Keyed<EventSpace<Action>>, ProxyError> {
        let _guard = self.session.lock().acquire();
        let mem = M::as_host(memory, &self.session)?;
        let obj = self.invoke(worker, methods::GET_APPLICABLE_ACTIONS, &[mem.raw()])?;
        <A::Keyed<EventSpace<Action>>>::from_host(obj)
    }

    /// The enabled-event space for the given memory (optional capability,
    /// partially controllable domains).
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError`] if the host raised.
    pub fn get_enabled_events(
        &self,
        memory: &M::Memory<A::Keyed<State>>,
        worker: Option<WorkerId>,
    ) -> Result<A::Keyed<EventSpace<C::Event>>, ProxyError> {
        let _guard = self.session.lock().acquire();
        let mem = M::as_host(memory, &self.session)?;
        let obj = self.invoke(worker, methods::GET_ENABLED_EVENTS, &[mem.raw()])?;
        <A::Keyed<EventSpace<C::Event>>>::from_host(obj)
    }

    /// The deterministic successor for one event.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError`] if the host raised.
    pub fn get_next_state(
        &self,
        memory: &M::Memory<A::Keyed<State>>,
        event: &A::Keyed<C::Event>,
        worker: Option<WorkerId>,
    ) -> Result<A::Keyed<State>, ProxyError> {
        let _guard = self.session.lock().acquire();
        let mem = M::as_host(memory, &self.session)?;
        let obj = self.invoke(
            worker,
            methods::GET_NEXT_STATE,
            &[mem.raw(), event.as_host().raw()],
        )?;
        <A::Keyed<State>>::from_host(obj)
    }

    /// The successor distribution for one event.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError`] if the host raised.
    pub fn get_next_state_distribution(
        &self,
        memory: &M::Memory<A::Keyed<State>>,
        event: &A::Keyed<C::Event>,
        worker: Option<WorkerId>,
    ) -> Result<NextStateDistribution<A::Keyed<State>>, ProxyError> {
        let _guard = self.session.lock().acquire();
        let mem = M::as_host(memory, &self.session)?;
        let obj = self.invoke(
            worker,
            methods::GET_NEXT_STATE_DISTRIBUTION,
            &[mem.raw(), event.as_host().raw()],
        )?;
        <NextStateDistribution<A::Keyed<State>>>::from_host(obj)
    }

    /// The value of one transition, optionally conditioned on the reached
    /// successor.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError`] if the host raised.
    pub fn get_transition_value(
        &self,
        memory: &M::Memory<A::Keyed<State>>,
        event: &A::Keyed<C::Event>,
        next: Option<&A::Keyed<State>>,
        worker: Option<WorkerId>,
    ) -> Result<A::Keyed<crate::values::Value>, ProxyError> {
        let _guard = self.session.lock().acquire();
        let mem = M::as_host(memory, &self.session)?;
        let obj = match next {
            Some(next) => self.invoke(
                worker,
                methods::GET_TRANSITION_VALUE,
                &[mem.raw(), event.as_host().raw(), next.as_host().raw()],
            )?,
            None => self.invoke(
                worker,
                methods::GET_TRANSITION_VALUE,
                &[mem.raw(), event.as_host().raw()],
            )?,
        };
        <A::Keyed<crate::values::Value>>::from_host(obj)
    }

    /// Whether a state is terminal.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError`] if the host raised.
    pub fn is_terminal(
        &self,
        state: &A::Keyed<State>,
        worker: Option<WorkerId>,
    ) -> Result<bool, ProxyError> {
        let _guard = self.session.lock().acquire();
        let obj = self.invoke(worker, methods::IS_TERMINAL, &[state.as_host().raw()])?;
        Predicate::from_trusted(obj).holds()
    }

    /// Invoke a user-supplied host callable (custom policy, heuristic).
    /// Callers are responsible for shape-checking the result.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError`] if the host raised.
    pub fn call_callback(
        &self,
        callable: &ObjectRef,
        args: &[RawHandle],
    ) -> Result<ObjectRef, ProxyError> {
        const OP: &str = "callback";
        let _guard = self.session.lock().acquire();
        match self.session.runtime().call_function(callable.raw(), args) {
            Ok(raw) => Ok(ObjectRef::adopt(Arc::clone(&self.session), raw)),
            Err(source) => {
                tracing::error!(op = OP, error = %source, "host callback failed");
                Err(ProxyError::HostCall { op: OP, source })
            }
        }
    }
}

impl<O, M, C> DomainProxy<MultiAgent, O, M, C>
where
    O: ObservabilityMode,
    M: MemoryMode,
    C: ControllabilityMode,
{
    /// The applicable-action space for one agent, holding the other
    /// agents' actions fixed. Multi-agent shape only.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError`] if the host raised.
    pub fn get_agent_applicable_actions(
        &self,
        memory: &M::Memory<AgentMap<State>>,
        other_agents_actions: &AgentMap<Action>,
        agent: &Agent,
        worker: Option<WorkerId>,
    ) -> Result<EventSpace<Action>, ProxyError> {
        let _guard = self.session.lock().acquire();
        let mem = M::as_host(memory, &self.session)?;
        let obj = self.invoke(
            worker,
            methods::GET_AGENT_APPLICABLE_ACTIONS,
            &[
                mem.raw(),
                other_agents_actions.as_host().raw(),
                agent.as_host().raw(),
            ],
        )?;
        EventSpace::from_host(obj)
    }
}
