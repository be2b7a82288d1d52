//! Tree-policy strategies: how one simulation descends the explored graph.
//!
//! Descent interleaves short native graph-lock scopes with host-bracketed
//! transition calls. Lock ordering is one-way: the graph lock may be taken
//! while the host lock is free, and host calls may nest under the graph
//! lock (wrapper clones), but the graph lock is never taken while a
//! [`HostGuard`] is held directly.
//!
//! [`HostGuard`]: quarry_core::HostGuard

use std::sync::{Mutex, MutexGuard, PoisonError};

use quarry_core::WorkerId;
use quarry_proxy::{Action, State};
use rand_chacha::ChaCha8Rng;

use crate::error::SolveError;
use crate::mcts::backprop::PathStep;
use crate::mcts::expand::ExpansionPolicy;
use crate::mcts::graph::{Edge, Node, SearchGraph};
use crate::mcts::key::NodeKeyPolicy;
use crate::mcts::select::SelectionPolicy;
use crate::mcts::transition::TransitionMode;
use crate::SolverProxy;

/// Per-simulation context threaded through descent.
pub struct SimContext<'a> {
    /// The domain proxy.
    pub proxy: &'a SolverProxy,
    /// UCT exploration constant.
    pub exploration: f64,
    /// Depth cap for descent.
    pub max_depth: u32,
    /// The worker running this simulation.
    pub worker: Option<WorkerId>,
}

/// Where a descent ended.
pub struct Descent<K: NodeKeyPolicy> {
    /// Key of the leaf node reached.
    pub leaf: K::Key,
    /// The leaf situation.
    pub leaf_state: State,
    /// Whether the leaf is terminal (or a dead end).
    pub leaf_terminal: bool,
    /// The traversed edges, root first.
    pub path: Vec<PathStep<K>>,
}

/// Compile-time tree-policy axis.
pub trait TreePolicy: 'static {
    /// Descend from the root until an expandable or terminal node.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError`] if a host operation failed.
    fn descend<Tr, EX, AS, K>(
        ctx: &SimContext<'_>,
        graph: &Mutex<SearchGraph<K>>,
        root: &K::Key,
        rng: &mut ChaCha8Rng,
    ) -> Result<Descent<K>, SolveError>
    where
        Tr: TransitionMode,
        EX: ExpansionPolicy,
        AS: SelectionPolicy,
        K: NodeKeyPolicy;
}

pub(crate) fn lock_graph<K: NodeKeyPolicy>(
    graph: &Mutex<SearchGraph<K>>,
) -> MutexGuard<'_, SearchGraph<K>> {
    graph.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Create a node for a freshly reached situation: enumerate its applicable
/// actions (unless terminal) and let the expansion policy partition them.
pub(crate) fn open_node<EX, K>(
    proxy: &SolverProxy,
    state: State,
    terminal: bool,
    worker: Option<WorkerId>,
) -> Result<Node<K>, SolveError>
where
    EX: ExpansionPolicy,
    K: NodeKeyPolicy,
{
    let mut untried = if terminal {
        Vec::new()
    } else {
        proxy.get_applicable_actions(&state, worker)?.elements()?
    };
    let mut edges = Vec::new();
    EX::seed::<K>(&mut untried, &mut edges);
    Ok(Node {
        state,
        visits: 0,
        untried,
        edges,
        terminal,
        value_estimate: 0.0,
    })
}

/// What the locked decision step resolved to.
enum Decision {
    /// Stop at the current node.
    Stop { state: State, terminal: bool },
    /// Advance through an edge; `fresh` marks a just-opened edge.
    Advance {
        state: State,
        edge: usize,
        action: Action,
        fresh: bool,
    },
}

/// Descend via the expansion policy until it stops opening edges, then via
/// the optimization action selector; stop at the first freshly opened edge.
#[derive(Debug, Clone, Copy)]
pub struct DefaultTreePolicy;

impl TreePolicy for DefaultTreePolicy {
    fn descend<Tr, EX, AS, K>(
        ctx: &SimContext<'_>,
        graph: &Mutex<SearchGraph<K>>,
        root: &K::Key,
        rng: &mut ChaCha8Rng,
    ) -> Result<Descent<K>, SolveError>
    where
        Tr: TransitionMode,
        EX: ExpansionPolicy,
        AS: SelectionPolicy,
        K: NodeKeyPolicy,
    {
        let mut key = root.clone();
        let mut path: Vec<PathStep<K>> = Vec::new();
        let mut depth: u32 = 0;

        loop {
            let decision = {
                let mut g = lock_graph(graph);
                let Some(node) = g.node_mut(&key) else {
                    return Err(SolveError::Invariant {
                        detail: "descent reached an unexplored key",
                    });
                };
                if node.terminal || depth >= ctx.max_depth {
                    Decision::Stop {
                        state: node.state.clone(),
                        terminal: node.terminal,
                    }
                } else if let Some(i) = EX::next_untried(&node.untried, rng) {
                    let action = node.untried.swap_remove(i);
                    node.edges.push(Edge::new(action.clone()));
                    Decision::Advance {
                        state: node.state.clone(),
                        edge: node.edges.len() - 1,
                        action,
                        fresh: true,
                    }
                } else if let Some(i) = AS::pick(node, ctx.exploration, rng) {
                    Decision::Advance {
                        state: node.state.clone(),
                        edge: i,
                        action: node.edges[i].action.clone(),
                        fresh: false,
                    }
                } else {
                    // No untried actions and no edges: a dead end.
                    Decision::Stop {
                        state: node.state.clone(),
                        terminal: true,
                    }
                }
            };

            match decision {
                Decision::Stop { state, terminal } => {
                    return Ok(Descent {
                        leaf: key,
                        leaf_state: state,
                        leaf_terminal: terminal,
                        path,
                    });
                }
                Decision::Advance {
                    state,
                    edge,
                    action,
                    fresh,
                } => {
                    let step = Tr::advance(ctx.proxy, &state, &action, ctx.worker, rng)?;
                    let child_key = K::child_key(&key, &action, &step.next)?;

                    let mut reached_new_node = false;
                    if !lock_graph(graph).contains(&child_key) {
                        let node =
                            open_node::<EX, K>(ctx.proxy, step.next.clone(), step.terminal, ctx.worker)?;
                        // First insert wins under worker contention.
                        reached_new_node = lock_graph(graph).insert(child_key.clone(), node);
                    }
                    {
                        let mut g = lock_graph(graph);
                        if let Some(node) = g.node_mut(&key) {
                            if let Some(e) = node.edges.get_mut(edge) {
                                e.record_child(&child_key);
                            }
                        }
                    }

                    path.push(PathStep {
                        node: key.clone(),
                        edge,
                        reward: step.reward,
                    });
                    let leaf_state = step.next;
                    let leaf_terminal = step.terminal;
                    key = child_key;
                    depth += 1;

                    // The expansion boundary: a just-opened edge or a node
                    // the graph had never seen ends the descent.
                    if fresh || reached_new_node {
                        return Ok(Descent {
                            leaf: key,
                            leaf_state,
                            leaf_terminal,
                            path,
                        });
                    }
                }
            }
        }
    }
}
