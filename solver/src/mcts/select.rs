//! Action-selection strategies: one family for tree descent (optimization
//! time) and one for executing the solved policy.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::mcts::graph::Node;
use crate::mcts::key::NodeKeyPolicy;

/// Compile-time optimization-time selection axis.
pub trait SelectionPolicy: 'static {
    /// Choose an edge index to descend. `None` when the node has no edges.
    fn pick<K: NodeKeyPolicy>(
        node: &Node<K>,
        exploration: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<usize>;
}

/// UCB1: mean value plus an exploration bonus. Unvisited edges first.
#[derive(Debug, Clone, Copy)]
pub struct Ucb1Selection;

impl SelectionPolicy for Ucb1Selection {
    #[allow(clippy::cast_precision_loss)]
    fn pick<K: NodeKeyPolicy>(
        node: &Node<K>,
        exploration: f64,
        _rng: &mut ChaCha8Rng,
    ) -> Option<usize> {
        if node.edges.is_empty() {
            return None;
        }
        if let Some(unvisited) = node.edges.iter().position(|e| e.visits == 0) {
            return Some(unvisited);
        }
        let parent_visits = node.visits.max(1) as f64;
        node.edges
            .iter()
            .enumerate()
            .map(|(i, edge)| {
                let bonus = exploration * (parent_visits.ln() / edge.visits as f64).sqrt();
                (i, edge.q() + bonus)
            })
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
    }
}

/// Uniform random descent.
#[derive(Debug, Clone, Copy)]
pub struct RandomSelection;

impl SelectionPolicy for RandomSelection {
    fn pick<K: NodeKeyPolicy>(
        node: &Node<K>,
        _exploration: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<usize> {
        if node.edges.is_empty() {
            None
        } else {
            Some(rng.gen_range(0..node.edges.len()))
        }
    }
}

/// Compile-time execution-time selection axis.
pub trait ExecutionSelectionPolicy: 'static {
    /// Choose the edge whose action the solved policy recommends.
    fn choose<K: NodeKeyPolicy>(node: &Node<K>) -> Option<usize>;
}

/// Recommend the edge with the best mean value.
#[derive(Debug, Clone, Copy)]
pub struct BestQValue;

impl ExecutionSelectionPolicy for BestQValue {
    fn choose<K: NodeKeyPolicy>(node: &Node<K>) -> Option<usize> {
        node.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.visits > 0)
            .max_by(|(_, a), (_, b)| {
                a.q().partial_cmp(&b.q()).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i)
    }
}

/// Recommend the most-visited edge.
#[derive(Debug, Clone, Copy)]
pub struct MostVisited;

impl ExecutionSelectionPolicy for MostVisited {
    fn choose<K: NodeKeyPolicy>(node: &Node<K>) -> Option<usize> {
        node.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.visits > 0)
            .max_by_key(|(_, e)| e.visits)
            .map(|(i, _)| i)
    }
}
