//! Quarry Proxy: typed value wrappers over host-object handles.
//!
//! The proxy layer gives native search code a typed view of a decision
//! domain whose implementation lives in the host runtime. Every operation
//! brackets host access identically: acquire the session lock, resolve the
//! per-worker replica, marshal typed arguments to handles, invoke the
//! capability, unmarshal the result, release the lock.
//!
//! # Key types
//!
//! - [`DomainProxy`] — the typed operation surface, shaped by four variant axes
//! - [`State`], [`Action`], [`Value`], [`Predicate`], … — one-handle wrappers
//! - [`AgentMode`], [`ObservabilityMode`], [`MemoryMode`],
//!   [`ControllabilityMode`] — compile-time domain-variant axes
//! - [`CapabilityProbe`] — fail-fast capability validation
//! - [`ProxyError`] — the proxy-level error taxonomy

#![forbid(unsafe_code)]

pub mod agent;
pub mod capability;
pub mod control;
pub mod domain;
pub mod error;
pub mod memory;
pub mod observe;
pub mod outcome;
pub mod space;
pub mod values;

pub use agent::{AgentMap, AgentMode, MultiAgent, SingleAgent};
pub use capability::{CapabilityProbe, MissingCapability};
pub use control::{ControllabilityMode, FullyControllable, PartiallyControllable};
pub use domain::DomainProxy;
pub use error::ProxyError;
pub use memory::{Historical, History, Markovian, MemoryMode};
pub use observe::{FullyObservable, ObservabilityMode, PartiallyObservable};
pub use outcome::{EnvironmentOutcome, Outcome, TransitionOutcome};
pub use space::{EventSpace, NextStateDistribution};
pub use values::{Action, Agent, Event, HostValue, Info, Observation, Predicate, State, Value};
