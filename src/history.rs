//! Merge History
//!
//! An append-only arena recording every binary combination made during
//! clustering. Nodes are addressed by [`NodeId`] (their arena index), so the
//! history needs no owning pointers: a node's children always have smaller
//! ids than the node itself, and internal node ids follow merge order.
//!
//! ```text
//!   leaves (inputs)        internal nodes (merge order)        steps
//!   ┌──┐ ┌──┐ ┌──┐ ┌──┐    ┌──────────┐ ┌──────────┐          Merge(0,1 → 4)
//!   │0 │ │1 │ │2 │ │3 │ →  │4 = 0 + 1 │ │5 = 4 + 2 │   →      Merge(4,2 → 5)
//!   └──┘ └──┘ └──┘ └──┘    └──────────┘ └──────────┘          Beam(5), Beam(3)
//! ```

use crate::definition::RecombinationScheme;
use crate::kinematics::FourMomentum;
use serde::{Deserialize, Serialize};

/// Index of a node inside a [`MergeHistory`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A leaf (input particle) or the result of merging two earlier nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterNode {
    /// Combined four-momentum
    pub momentum: FourMomentum,
    /// The two merged nodes, `None` for leaves
    pub children: Option<(NodeId, NodeId)>,
    /// Position of the particle in the original input, leaves only
    pub input_index: Option<usize>,
    /// Distance at which the node was formed (0 for leaves)
    pub distance: f64,
}

impl ClusterNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// One entry of the clustering record, in the order it happened
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HistoryStep {
    /// Two active objects combined into `result`
    Merge {
        a: NodeId,
        b: NodeId,
        result: NodeId,
        distance: f64,
    },
    /// An object reached the beam and became a final jet
    Beam { node: NodeId, distance: f64 },
    /// A merge was vetoed and `node` thrown away; `kept` stays active
    Discard { node: NodeId, kept: NodeId },
}

// ═══════════════════════════════════════════════════════════════════════════════
// MERGE HISTORY
// ═══════════════════════════════════════════════════════════════════════════════

/// Arena of cluster nodes plus the ordered list of steps that built them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeHistory {
    nodes: Vec<ClusterNode>,
    steps: Vec<HistoryStep>,
    scheme: RecombinationScheme,
}

impl MergeHistory {
    /// Create an empty history
    pub fn new(scheme: RecombinationScheme) -> Self {
        Self {
            nodes: Vec::new(),
            steps: Vec::new(),
            scheme,
        }
    }

    /// Add an input particle
    pub fn push_leaf(&mut self, momentum: FourMomentum, input_index: usize) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(ClusterNode {
            momentum,
            children: None,
            input_index: Some(input_index),
            distance: 0.0,
        });
        id
    }

    /// Record a merge of `a` and `b`, returning the new node
    pub fn merge(&mut self, a: NodeId, b: NodeId, distance: f64) -> NodeId {
        let momentum = self
            .scheme
            .recombine(&self.nodes[a.0].momentum, &self.nodes[b.0].momentum);
        let result = NodeId(self.nodes.len());
        self.nodes.push(ClusterNode {
            momentum,
            children: Some((a, b)),
            input_index: None,
            distance,
        });
        self.steps.push(HistoryStep::Merge {
            a,
            b,
            result,
            distance,
        });
        result
    }

    /// Record that `node` became a final jet
    pub fn beam(&mut self, node: NodeId, distance: f64) {
        self.steps.push(HistoryStep::Beam { node, distance });
    }

    /// Record that `node` was thrown away by a merge veto
    pub fn discard(&mut self, node: NodeId, kept: NodeId) {
        self.steps.push(HistoryStep::Discard { node, kept });
    }

    pub fn node(&self, id: NodeId) -> &ClusterNode {
        &self.nodes[id.0]
    }

    pub fn momentum(&self, id: NodeId) -> FourMomentum {
        self.nodes[id.0].momentum
    }

    pub fn children(&self, id: NodeId) -> Option<(NodeId, NodeId)> {
        self.nodes[id.0].children
    }

    /// Children ordered (harder, softer) by transverse momentum
    pub fn harder_softer(&self, id: NodeId) -> Option<(NodeId, NodeId)> {
        self.children(id).map(|(a, b)| {
            if self.momentum(a).pt2() >= self.momentum(b).pt2() {
                (a, b)
            } else {
                (b, a)
            }
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn steps(&self) -> &[HistoryStep] {
        &self.steps
    }

    pub fn scheme(&self) -> RecombinationScheme {
        self.scheme
    }

    /// Nodes that reached the beam, in emission order
    pub fn roots(&self) -> Vec<NodeId> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                HistoryStep::Beam { node, .. } => Some(*node),
                _ => None,
            })
            .collect()
    }

    /// Leaf ids below `id`, ordered by original input index
    pub fn constituents(&self, id: NodeId) -> Vec<NodeId> {
        let mut leaves = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            match self.nodes[current.0].children {
                Some((a, b)) => {
                    stack.push(b);
                    stack.push(a);
                }
                None => leaves.push(current),
            }
        }
        leaves.sort_by_key(|leaf| self.nodes[leaf.0].input_index);
        leaves
    }

    /// Original input indices below `id`, ascending
    pub fn input_indices(&self, id: NodeId) -> Vec<usize> {
        self.constituents(id)
            .iter()
            .filter_map(|leaf| self.nodes[leaf.0].input_index)
            .collect()
    }

    /// Split `root` into `n` subjets by undoing its most recent merges
    ///
    /// Returns fewer than `n` nodes when the tree has fewer leaves. For a kt
    /// history this reproduces exclusive clustering into `n` jets.
    pub fn exclusive_subjets(&self, root: NodeId, n: usize) -> Vec<NodeId> {
        let mut subjets = vec![root];
        while subjets.len() < n {
            let latest = subjets
                .iter()
                .enumerate()
                .filter_map(|(position, id)| {
                    self.nodes[id.0].children.map(|children| (position, *id, children))
                })
                .max_by_key(|(_, id, _)| *id);
            let Some((position, _, (a, b))) = latest else {
                break;
            };
            subjets.swap_remove(position);
            subjets.push(a);
            subjets.push(b);
        }
        subjets
    }

    /// Internal nodes whose momentum differs from the sum of their children
    ///
    /// Only meaningful for E-scheme histories; with `tolerance = 0.0` the
    /// check is exact.
    pub fn conservation_violations(&self, tolerance: f64) -> Vec<NodeId> {
        if self.scheme != RecombinationScheme::EScheme {
            return Vec::new();
        }
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| {
                let (a, b) = node.children?;
                let sum = self.nodes[a.0].momentum + self.nodes[b.0].momentum;
                let m = node.momentum;
                let diff = (sum.e - m.e)
                    .abs()
                    .max((sum.px - m.px).abs())
                    .max((sum.py - m.py).abs())
                    .max((sum.pz - m.pz).abs());
                (diff > tolerance).then_some(NodeId(i))
            })
            .collect()
    }

    pub fn is_conserving(&self, tolerance: f64) -> bool {
        self.conservation_violations(tolerance).is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
