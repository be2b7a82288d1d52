//! The monomorphized MCTS engine and its strategy families.
//!
//! Each strategy axis is a trait with a closed set of concrete
//! implementations; the instantiation resolver picks one per axis and the
//! engine is specialized over the full pack. No strategy dispatch happens
//! through a vtable inside the simulation loop.

pub mod backprop;
pub mod engine;
pub mod expand;
pub mod graph;
pub mod key;
pub mod rollout;
pub mod select;
pub mod transition;
pub mod tree;

pub use backprop::{BackpropPolicy, GraphBackup, PathStep};
pub use engine::{EngineSettings, ExecutionMode, MctsEngine, ParallelExecution, SequentialExecution};
pub use expand::{ExpansionPolicy, FullExpansion, PartialExpansion};
pub use graph::{Edge, Node, SearchGraph};
pub use key::{NodeKeyPolicy, PathDigest, PathKeyed, StateKey, StateKeyed};
pub use rollout::{CustomRollout, RandomRollout, RolloutPolicy};
pub use select::{
    BestQValue, ExecutionSelectionPolicy, MostVisited, RandomSelection, SelectionPolicy,
    Ucb1Selection,
};
pub use transition::{
    DistributionTransition, SampleTransition, SimStep, StepTransition, TransitionMode,
};
pub use tree::{DefaultTreePolicy, Descent, SimContext, TreePolicy};
