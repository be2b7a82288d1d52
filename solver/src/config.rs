//! Solver configuration: budgets, strategy tags, callbacks.
//!
//! Each axis tag enum is a closed set. Tags parse from strings so flat
//! front-ends can accept text options; an unrecognized string fails with a
//! [`ConfigError::IllegalTag`] naming the axis and its legal set.

use std::fmt;
use std::str::FromStr;

use quarry_core::ObjectRef;

use crate::error::ConfigError;
use crate::watchdog::WatchdogFn;

macro_rules! axis_tag {
    (
        $(#[$meta:meta])*
        $name:ident, axis = $axis:literal, legal = $legal:literal {
            $($(#[$vmeta:meta])* $variant:ident = $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// The axis this tag configures.
            pub const AXIS: &'static str = $axis;
            /// The legal tag set, for error messages.
            pub const LEGAL: &'static str = $legal;

            /// The canonical text of the tag.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = ConfigError;

            fn from_str(s: &str) -> Result<Self, ConfigError> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(ConfigError::IllegalTag {
                        axis: Self::AXIS,
                        tag: s.to_string(),
                        legal: Self::LEGAL,
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

axis_tag! {
    /// Whether rollouts run on the calling thread or a worker pool.
    ExecutionTag, axis = "execution_mode", legal = "sequential | parallel" {
        Sequential = "sequential",
        Parallel = "parallel",
    }
}

axis_tag! {
    /// How a simulation advances through the domain.
    TransitionTag, axis = "transition_mode", legal = "step | sample | distribution" {
        /// Stateful environment interaction: `reset` + `step`.
        Step = "step",
        /// Memoryless transition sampling: `sample`.
        Sample = "sample",
        /// Explicit successor distributions: `get_next_state_distribution`.
        Distribution = "distribution",
    }
}

axis_tag! {
    /// How the explored graph is descended.
    TreePolicyTag, axis = "tree_policy", legal = "default" {
        Default = "default",
    }
}

axis_tag! {
    /// How untried actions are opened at a node.
    ExpansionTag, axis = "expansion_policy", legal = "full | partial" {
        /// Open every applicable action when the node is created.
        Full = "full",
        /// Open one untried action per visit.
        Partial = "partial",
    }
}

axis_tag! {
    /// Action selection during tree descent (optimization time).
    SelectionTag, axis = "action_selection_optimization", legal = "ucb1 | random" {
        Ucb1 = "ucb1",
        Random = "random",
    }
}

axis_tag! {
    /// Action selection when executing the solved policy.
    ExecutionSelectionTag, axis = "action_selection_execution", legal = "best_q | most_visited" {
        BestQValue = "best_q",
        MostVisited = "most_visited",
    }
}

axis_tag! {
    /// How rollouts pick actions beyond the explored graph.
    RolloutTag, axis = "rollout_policy", legal = "random | custom" {
        Random = "random",
        /// A user-supplied host callable `(state) -> action`. Requires
        /// [`SolverConfig::custom_rollout`].
        Custom = "custom",
    }
}

axis_tag! {
    /// How simulated returns propagate back up the graph.
    BackpropTag, axis = "backprop_policy", legal = "graph" {
        Graph = "graph",
    }
}

axis_tag! {
    /// How explored nodes are keyed.
    HashingTag, axis = "hashing_policy", legal = "state | path" {
        /// Transposition graph keyed by host state hash/equality.
        StateKey = "state",
        /// Tree keyed by a native digest of the action path. Queries are
        /// positional: the solver answers for the current root.
        PathKey = "path",
    }
}

/// The flat option set a solver front-end accepts.
///
/// Every field has a documented default; see [`SolverConfig::default`].
pub struct SolverConfig {
    /// Wall-clock budget for one `solve` call, in milliseconds. `0` means
    /// no time budget. Default `0`.
    pub time_budget_ms: u64,
    /// Rollout budget for one `solve` call. Default `1000`.
    pub rollout_budget: u64,
    /// Depth cap for both descent and rollout walks. Default `100`.
    pub max_depth: u32,
    /// Discount factor applied per transition. Default `1.0`.
    pub discount: f64,
    /// UCT exploration constant. Default `1/sqrt(2)`.
    pub exploration: f64,
    /// Seed for the rollout RNG. Default `0`.
    pub seed: u64,
    /// Worker pool size in parallel mode. Default `1`.
    pub workers: usize,
    /// Discard nodes made unreachable as execution advances, and record
    /// the action prefix. Default `false`.
    pub online_pruning: bool,

    /// Execution-mode axis. Default [`ExecutionTag::Sequential`].
    pub execution: ExecutionTag,
    /// Transition-semantics axis. Default [`TransitionTag::Sample`].
    pub transition: TransitionTag,
    /// Tree-policy axis. Default [`TreePolicyTag::Default`].
    pub tree_policy: TreePolicyTag,
    /// Expansion-policy axis. Default [`ExpansionTag::Full`].
    pub expansion: ExpansionTag,
    /// Optimization-time action selection. Default [`SelectionTag::Ucb1`].
    pub selection: SelectionTag,
    /// Execution-time action selection. Default
    /// [`ExecutionSelectionTag::BestQValue`].
    pub execution_selection: ExecutionSelectionTag,
    /// Rollout-policy axis. Default [`RolloutTag::Random`].
    pub rollout: RolloutTag,
    /// Back-propagation axis. Default [`BackpropTag::Graph`].
    pub backprop: BackpropTag,
    /// Hashing-policy axis. Default [`HashingTag::StateKey`].
    pub hashing: HashingTag,

    /// Host callable `(state) -> action` for [`RolloutTag::Custom`].
    /// Default `None`.
    pub custom_rollout: Option<ObjectRef>,
    /// Host callable `(state) -> (value, rollout_count)` evaluated at new
    /// leaves instead of a rollout walk. Default `None`.
    pub heuristic: Option<ObjectRef>,
    /// Advisory cancellation predicate, checked between whole rollouts.
    /// Default `None`.
    pub watchdog: Option<WatchdogFn>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_budget_ms: 0,
            rollout_budget: 1000,
            max_depth: 100,
            discount: 1.0,
            exploration: std::f64::consts::FRAC_1_SQRT_2,
            seed: 0,
            workers: 1,
            online_pruning: false,
            execution: ExecutionTag::Sequential,
            transition: TransitionTag::Sample,
            tree_policy: TreePolicyTag::Default,
            expansion: ExpansionTag::Full,
            selection: SelectionTag::Ucb1,
            execution_selection: ExecutionSelectionTag::BestQValue,
            rollout: RolloutTag::Random,
            backprop: BackpropTag::Graph,
            hashing: HashingTag::StateKey,
            custom_rollout: None,
            heuristic: None,
            watchdog: None,
        }
    }
}

impl SolverConfig {
    /// Render the resolved configuration as a deterministic JSON snapshot
    /// for diagnostics and logging. Keys are emitted in sorted order.
    #[must_use]
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "axes": {
                "action_selection_execution": self.execution_selection.as_str(),
                "action_selection_optimization": self.selection.as_str(),
                "backprop_policy": self.backprop.as_str(),
                "execution_mode": self.execution.as_str(),
                "expansion_policy": self.expansion.as_str(),
                "hashing_policy": self.hashing.as_str(),
                "rollout_policy": self.rollout.as_str(),
                "transition_mode": self.transition.as_str(),
                "tree_policy": self.tree_policy.as_str(),
            },
            "budgets": {
                "max_depth": self.max_depth,
                "rollout_budget": self.rollout_budget,
                "time_budget_ms": self.time_budget_ms,
            },
            "callbacks": {
                "custom_rollout": self.custom_rollout.is_some(),
                "heuristic": self.heuristic.is_some(),
                "watchdog": self.watchdog.is_some(),
            },
            "discount": self.discount,
            "exploration": self.exploration,
            "online_pruning": self.online_pruning,
            "schema_version": "solver_config.v1",
            "seed": self.seed,
            "workers": self.workers,
        })
    }
}

impl fmt::Debug for SolverConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolverConfig")
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}
