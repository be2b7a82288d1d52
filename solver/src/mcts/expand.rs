//! Expansion-policy strategies.

use quarry_proxy::Action;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::mcts::graph::Edge;
use crate::mcts::key::NodeKeyPolicy;

/// Compile-time expansion-policy axis.
pub trait ExpansionPolicy: 'static {
    /// Partition freshly enumerated actions between immediate edges and
    /// the node's untried list, at node creation.
    fn seed<K: NodeKeyPolicy>(untried: &mut Vec<Action>, edges: &mut Vec<Edge<K>>);

    /// Index of the next untried action to open at this visit, if the
    /// policy opens them lazily.
    fn next_untried(untried: &[Action], rng: &mut ChaCha8Rng) -> Option<usize>;
}

/// Open every applicable action as an edge when the node is created.
#[derive(Debug, Clone, Copy)]
pub struct FullExpansion;

impl ExpansionPolicy for FullExpansion {
    fn seed<K: NodeKeyPolicy>(untried: &mut Vec<Action>, edges: &mut Vec<Edge<K>>) {
        edges.extend(untried.drain(..).map(Edge::new));
    }

    fn next_untried(_untried: &[Action], _rng: &mut ChaCha8Rng) -> Option<usize> {
        None
    }
}

/// Open one untried action per visit, chosen uniformly.
#[derive(Debug, Clone, Copy)]
pub struct PartialExpansion;

impl ExpansionPolicy for PartialExpansion {
    fn seed<K: NodeKeyPolicy>(_untried: &mut Vec<Action>, _edges: &mut Vec<Edge<K>>) {}

    fn next_untried(untried: &[Action], rng: &mut ChaCha8Rng) -> Option<usize> {
        if untried.is_empty() {
            None
        } else {
            Some(rng.gen_range(0..untried.len()))
        }
    }
}
