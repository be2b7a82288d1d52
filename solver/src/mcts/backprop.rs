//! Back-propagation strategies.

use crate::mcts::graph::SearchGraph;
use crate::mcts::key::NodeKeyPolicy;

/// One traversed edge on a simulation path.
#[derive(Debug, Clone)]
pub struct PathStep<K: NodeKeyPolicy> {
    /// The node the edge was taken from.
    pub node: K::Key,
    /// Index of the taken edge at that node.
    pub edge: usize,
    /// The immediate reward observed on the transition.
    pub reward: f64,
}

/// Compile-time back-propagation axis.
pub trait BackpropPolicy: 'static {
    /// Propagate a leaf value back along the traversed path.
    fn update<K: NodeKeyPolicy>(
        graph: &mut SearchGraph<K>,
        path: &[PathStep<K>],
        leaf_value: f64,
        discount: f64,
    );
}

/// Running-mean update of discounted returns along the path.
#[derive(Debug, Clone, Copy)]
pub struct GraphBackup;

impl BackpropPolicy for GraphBackup {
    fn update<K: NodeKeyPolicy>(
        graph: &mut SearchGraph<K>,
        path: &[PathStep<K>],
        leaf_value: f64,
        discount: f64,
    ) {
        let mut ret = leaf_value;
        for step in path.iter().rev() {
            ret = step.reward + discount * ret;
            if let Some(node) = graph.node_mut(&step.node) {
                node.visits += 1;
                if let Some(edge) = node.edges.get_mut(step.edge) {
                    edge.visits += 1;
                    edge.total_value += ret;
                }
            }
        }
    }
}
