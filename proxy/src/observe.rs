//! Observability variant axis.
//!
//! Fully observable domains observe the state itself: `Observation`
//! projects to [`State`] and no separate wrapper exists at runtime.
//! Partially observable domains sample a distinct [`Observation`].

use crate::values::{HostValue, Observation, State};

/// Compile-time observability axis.
pub trait ObservabilityMode: 'static {
    /// What the domain yields when observed.
    type Observation: HostValue;
}

/// Observations are states.
#[derive(Debug, Clone, Copy)]
pub struct FullyObservable;

impl ObservabilityMode for FullyObservable {
    type Observation = State;
}

/// Observations are sampled from an observation distribution and are
/// distinct from states.
#[derive(Debug, Clone, Copy)]
pub struct PartiallyObservable;

impl ObservabilityMode for PartiallyObservable {
    type Observation = Observation;
}
