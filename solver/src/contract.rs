//! The type-erased solver surface.
//!
//! Resolution produces exactly one concrete engine behind this trait. The
//! wrapped value types are concrete because the solver front-end pins the
//! single-agent, fully observable domain shape.

use quarry_proxy::{Action, State};

use crate::error::SolveError;

/// Diagnostic counters exposed by a resolved solver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Nodes currently in the explored graph.
    pub explored_states: u64,
    /// Nodes discarded by online pruning since construction.
    pub pruned_states: u64,
    /// Rollouts completed during the most recent `solve` call.
    pub rollouts: u64,
}

/// The public operation set of a resolved solver.
pub trait Solver: Send {
    /// Discard all search state.
    fn clear(&mut self);

    /// Run the search from the given initial situation until a budget is
    /// exhausted or the watchdog requests termination.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError`] if a host operation failed.
    fn solve(&mut self, initial: &State) -> Result<(), SolveError>;

    /// Whether the solver can answer `get_next_action` for the situation.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError`] if keying the situation required a host call
    /// that failed.
    fn is_solution_defined_for(&self, situation: &State) -> Result<bool, SolveError>;

    /// The recommended action for a situation, if one is defined.
    ///
    /// With online pruning enabled, querying also re-roots the explored
    /// graph at the situation and appends the chosen action to the prefix.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError`] if a host operation failed.
    fn get_next_action(&mut self, situation: &State) -> Result<Option<Action>, SolveError>;

    /// The estimated utility of a situation, if explored.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError`] if keying the situation required a host call
    /// that failed.
    fn get_utility(&self, situation: &State) -> Result<Option<f64>, SolveError>;

    /// The explored policy: situation mapped to its chosen action and value.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError`] if a host operation failed.
    fn get_policy(&self) -> Result<Vec<(State, (Action, f64))>, SolveError>;

    /// The ordered actions taken so far under online pruning. Empty when
    /// online pruning is disabled.
    fn get_action_prefix(&self) -> Vec<Action>;

    /// Diagnostic counters.
    fn diagnostics(&self) -> Diagnostics;
}

impl std::fmt::Debug for dyn Solver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Solver")
            .field("diagnostics", &self.diagnostics())
            .finish_non_exhaustive()
    }
}
