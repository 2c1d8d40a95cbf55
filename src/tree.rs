//! Huffman tree construction.
//!
//! Nodes live in a flat arena and refer to their children by index, so the
//! tree can be walked with an explicit stack no matter how skewed it is.
//!
//! # Merge order
//!
//! Seed leaves are created in model order and every merged node is appended,
//! so a node's arena index is also its insertion sequence. Each step removes
//! the lowest-probability node, breaking ties in favour of the highest
//! sequence number (the most recently inserted), and makes it the **left**
//! child. The next node removed by the same rule becomes the **right** child.
//! This is the order produced by repeatedly sorting the working set by
//! descending probability with a stable sort and popping its last two nodes.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::{debug, trace};

use crate::model::{FrequencyModel, Probability};

/// Index of a node in a [`HuffmanTree`].
pub type NodeId = usize;

/// Huffman tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A symbol.
    Leaf {
        /// The symbol this leaf codes.
        symbol: String,
        /// Rounded probability of the symbol.
        prob: Probability,
    },
    /// A merge of two subtrees.
    Internal {
        /// Subtree reached by a 0 bit.
        left: NodeId,
        /// Subtree reached by a 1 bit.
        right: NodeId,
        /// Sum of the children's probabilities.
        prob: Probability,
    },
}

impl Node {
    /// Probability mass under this node.
    pub fn prob(&self) -> Probability {
        match self {
            Node::Leaf { prob, .. } => *prob,
            Node::Internal { prob, .. } => *prob,
        }
    }
}

/// Working-set entry, ordered so that `BinaryHeap::pop` yields the next node to merge.
#[derive(Debug, PartialEq, Eq)]
struct Pending {
    prob: Probability,
    id: NodeId,
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-priority on probability, then latest insertion first.
        other
            .prob
            .cmp(&self.prob)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// An immutable Huffman tree over the symbols of a [`FrequencyModel`].
#[derive(Debug, Clone)]
pub struct HuffmanTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl HuffmanTree {
    /// Build the tree by greedily merging the two least probable nodes.
    ///
    /// A model with a single symbol yields a tree whose root is that leaf.
    pub fn build(model: &FrequencyModel) -> Self {
        let mut nodes: Vec<Node> = Vec::with_capacity(model.len() * 2 - 1);
        let mut pq = BinaryHeap::with_capacity(model.len());

        for (symbol, prob) in model.probabilities() {
            pq.push(Pending {
                prob,
                id: nodes.len(),
            });
            nodes.push(Node::Leaf {
                symbol: symbol.to_owned(),
                prob,
            });
        }

        while pq.len() > 1 {
            let (Some(left), Some(right)) = (pq.pop(), pq.pop()) else {
                unreachable!("working set holds at least two nodes");
            };
            let prob = left.prob + right.prob;
            let id = nodes.len();
            trace!(left = left.id, right = right.id, parent = id, %prob, "merge");
            nodes.push(Node::Internal {
                left: left.id,
                right: right.id,
                prob,
            });
            pq.push(Pending { prob, id });
        }

        // The last node pushed is the root (the only one when there was one leaf).
        let root = nodes.len() - 1;
        let tree = Self { nodes, root };
        debug!(
            leaves = model.len(),
            nodes = tree.nodes.len(),
            depth = tree.depth(),
            "built huffman tree"
        );
        tree
    }

    /// Index of the root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Look up a node by index.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// All nodes; leaves first in model order, then merged nodes in merge order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of leaves (distinct symbols).
    pub fn leaf_count(&self) -> usize {
        self.nodes.len().div_ceil(2)
    }

    /// `(symbol, probability)` for every leaf, in model order.
    pub fn leaves(&self) -> impl Iterator<Item = (&str, Probability)> {
        self.nodes.iter().filter_map(|n| match n {
            Node::Leaf { symbol, prob } => Some((symbol.as_str(), *prob)),
            Node::Internal { .. } => None,
        })
    }

    /// Length of the longest root-to-leaf path, in edges.
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self.root, 0usize)];
        while let Some((id, d)) = stack.pop() {
            match &self.nodes[id] {
                Node::Leaf { .. } => max = max.max(d),
                Node::Internal { left, right, .. } => {
                    stack.push((*left, d + 1));
                    stack.push((*right, d + 1));
                }
            }
        }
        max
    }
}
