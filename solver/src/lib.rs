//! Quarry Solver: combinatorial configuration resolution and the MCTS
//! engine family over proxied decision domains.
//!
//! A solver exposes many independent runtime-selectable strategies, each a
//! compile-time type parameter of the engine. The resolver turns a tuple
//! of runtime tags into exactly one fully specialized engine instance,
//! validating the domain's capabilities before any construction cost is
//! paid.
//!
//! # Key types
//!
//! - [`SolverConfig`] — the flat option surface with per-axis tag enums
//! - [`SolverBuilder`] — probe, resolve, construct
//! - [`Solver`] — the type-erased operation set of a resolved engine
//! - [`ConfigError`] / [`SolveError`] — construction vs solving failures
//!
//! # Crate dependency graph
//!
//! ```text
//! quarry_core  ←  quarry_proxy  ←  quarry_solver
//! ```

#![forbid(unsafe_code)]

pub mod axis;
pub mod config;
pub mod contract;
pub mod error;
pub mod front;
pub mod mcts;
pub mod resolve;
pub mod watchdog;

use quarry_proxy::{DomainProxy, FullyControllable, FullyObservable, Markovian, SingleAgent};

/// The domain shape the solver front-end pins: single-agent, fully
/// observable, Markovian, fully controllable. The proxy layer's other
/// variant combinations remain available to embedders directly.
pub type SolverProxy = DomainProxy<SingleAgent, FullyObservable, Markovian, FullyControllable>;

pub use config::{
    BackpropTag, ExecutionSelectionTag, ExecutionTag, ExpansionTag, HashingTag, RolloutTag,
    SelectionTag, SolverConfig, TransitionTag, TreePolicyTag,
};
pub use contract::{Diagnostics, Solver};
pub use error::{ConfigError, SolveError};
pub use front::SolverBuilder;
pub use watchdog::{WatchdogFn, WatchdogStats};
