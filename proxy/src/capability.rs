//! Capability validation: fail fast before any expensive construction.
//!
//! A strategy choice on one configuration axis imposes a set of method
//! names the domain handle must expose; requirements compose by union
//! across all chosen axes. The probe snapshots the whole capability
//! universe under a single lock acquisition, so later per-axis checks are
//! pure native lookups.

use std::collections::BTreeMap;

use quarry_core::ObjectRef;
use thiserror::Error;

/// Domain capability method names.
pub mod methods {
    pub const RESET: &str = "reset";
    pub const STEP: &str = "step";
    pub const SAMPLE: &str = "sample";
    pub const GET_APPLICABLE_ACTIONS: &str = "get_applicable_actions";
    pub const GET_AGENT_APPLICABLE_ACTIONS: &str = "get_agent_applicable_actions";
    pub const GET_NEXT_STATE: &str = "get_next_state";
    pub const GET_NEXT_STATE_DISTRIBUTION: &str = "get_next_state_distribution";
    pub const GET_TRANSITION_VALUE: &str = "get_transition_value";
    pub const IS_TERMINAL: &str = "is_terminal";
    pub const GET_ENABLED_EVENTS: &str = "get_enabled_events";
}

/// Every capability the probe snapshots.
pub const CAPABILITY_UNIVERSE: &[&str] = &[
    methods::RESET,
    methods::STEP,
    methods::SAMPLE,
    methods::GET_APPLICABLE_ACTIONS,
    methods::GET_AGENT_APPLICABLE_ACTIONS,
    methods::GET_NEXT_STATE,
    methods::GET_NEXT_STATE_DISTRIBUTION,
    methods::GET_TRANSITION_VALUE,
    methods::IS_TERMINAL,
    methods::GET_ENABLED_EVENTS,
];

/// The domain lacks a method an axis choice requires.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("axis `{axis}` requires domain capability `{method}`, which the domain does not expose")]
pub struct MissingCapability {
    /// The configuration axis that imposed the requirement.
    pub axis: &'static str,
    /// The absent method.
    pub method: &'static str,
}

/// A one-shot snapshot of which capabilities a domain handle exposes.
#[derive(Debug, Clone)]
pub struct CapabilityProbe {
    present: BTreeMap<&'static str, bool>,
}

impl CapabilityProbe {
    /// Probe the domain handle, querying the whole capability universe
    /// under one lock acquisition.
    #[must_use]
    pub fn snapshot(domain: &ObjectRef) -> Self {
        let session = domain.session();
        let _guard = session.lock().acquire();
        let present = CAPABILITY_UNIVERSE
            .iter()
            .map(|method| (*method, session.runtime().has_method(domain.raw(), method)))
            .collect();
        Self { present }
    }

    /// Whether the domain exposes a method.
    #[must_use]
    pub fn has(&self, method: &str) -> bool {
        self.present.get(method).copied().unwrap_or(false)
    }

    /// Check one axis tag's requirement set against the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`MissingCapability`] naming the axis and the first absent
    /// method.
    pub fn require(
        &self,
        axis: &'static str,
        required: &[&'static str],
    ) -> Result<(), MissingCapability> {
        for method in required.iter().copied() {
            if !self.has(method) {
                return Err(MissingCapability { axis, method });
            }
        }
        Ok(())
    }
}
