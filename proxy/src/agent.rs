//! Agent variant axis: single-agent vs multi-agent shapes.
//!
//! In single-agent mode `Keyed<T>` collapses to `T` itself — no extra
//! indirection, no wrapper. In multi-agent mode it is an [`AgentMap`], a
//! dictionary-shaped host object keyed by [`Agent`] identity as the host
//! runtime defines it.

use std::marker::PhantomData;
use std::sync::Arc;

use quarry_core::ObjectRef;

use crate::error::ProxyError;
use crate::values::{Agent, HostValue};

/// Compile-time agent axis.
pub trait AgentMode: 'static {
    /// Per-agent projection: `T` in single-agent mode, [`AgentMap<T>`] in
    /// multi-agent mode.
    type Keyed<T: HostValue>: HostValue;
}

/// Single-agent domains: values are bare wrappers.
#[derive(Debug, Clone, Copy)]
pub struct SingleAgent;

impl AgentMode for SingleAgent {
    type Keyed<T: HostValue> = T;
}

/// Multi-agent domains: values are per-agent mappings.
#[derive(Debug, Clone, Copy)]
pub struct MultiAgent;

impl AgentMode for MultiAgent {
    type Keyed<T: HostValue> = AgentMap<T>;
}

/// A mapping from [`Agent`] to `T`, materialized as a host dictionary.
///
/// Keys are unique per agent identity as defined by the host runtime's
/// equality; insertion order is irrelevant.
#[derive(Debug)]
pub struct AgentMap<T: HostValue> {
    dict: ObjectRef,
    _values: PhantomData<fn() -> T>,
}

impl<T: HostValue> AgentMap<T> {
    /// Look up one agent's entry.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError`] if the agent is absent or the host raised.
    pub fn get(&self, agent: &Agent) -> Result<T, ProxyError> {
        let session = self.dict.session();
        let _guard = session.lock().acquire();
        let raw = session
            .runtime()
            .dict_get(self.dict.raw(), agent.as_host().raw())
            .map_err(|source| ProxyError::host("agent_map.get", source))?;
        T::from_host(ObjectRef::adopt(Arc::clone(session), raw))
    }

    /// All agents with an entry.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError`] if the host raised during enumeration.
    pub fn agents(&self) -> Result<Vec<Agent>, ProxyError> {
        let session = self.dict.session();
        let _guard = session.lock().acquire();
        let keys = session
            .runtime()
            .dict_keys(self.dict.raw())
            .map_err(|source| ProxyError::host("agent_map.agents", source))?;
        Ok(keys
            .into_iter()
            .map(|raw| Agent::from_trusted(ObjectRef::adopt(Arc::clone(session), raw)))
            .collect())
    }

    /// All `(agent, entry)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError`] if the host raised during enumeration or lookup.
    pub fn entries(&self) -> Result<Vec<(Agent, T)>, ProxyError> {
        let agents = self.agents()?;
        let mut out = Vec::with_capacity(agents.len());
        for agent in agents {
            let entry = self.get(&agent)?;
            out.push((agent, entry));
        }
        Ok(out)
    }

    /// Number of agents with an entry.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError`] if the host raised during enumeration.
    pub fn len(&self) -> Result<usize, ProxyError> {
        Ok(self.agents()?.len())
    }

    /// Whether the mapping has no entries.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError`] if the host raised during enumeration.
    pub fn is_empty(&self) -> Result<bool, ProxyError> {
        Ok(self.len()? == 0)
    }
}

impl<T: HostValue> Clone for AgentMap<T> {
    fn clone(&self) -> Self {
        Self {
            dict: self.dict.clone(),
            _values: PhantomData,
        }
    }
}

impl<T: HostValue> HostValue for AgentMap<T> {
    const KIND: &'static str = "AgentMap";

    fn from_trusted(obj: ObjectRef) -> Self {
        Self {
            dict: obj,
            _values: PhantomData,
        }
    }

    fn as_host(&self) -> &ObjectRef {
        &self.dict
    }

    fn into_host(self) -> ObjectRef {
        self.dict
    }
}
