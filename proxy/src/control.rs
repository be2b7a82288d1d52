//! Controllability variant axis.
//!
//! Fully controllable domains have no uncontrollable events: `Event`
//! projects to [`Action`]. Partially controllable domains keep the two
//! distinct, with actions the controllable subset of events.

use crate::values::{Action, Event, HostValue};

/// Compile-time controllability axis.
pub trait ControllabilityMode: 'static {
    /// What drives a transition.
    type Event: HostValue;
}

/// Every event is an action.
#[derive(Debug, Clone, Copy)]
pub struct FullyControllable;

impl ControllabilityMode for FullyControllable {
    type Event = Action;
}

/// Events and actions are distinct.
#[derive(Debug, Clone, Copy)]
pub struct PartiallyControllable;

impl ControllabilityMode for PartiallyControllable {
    type Event = Event;
}
