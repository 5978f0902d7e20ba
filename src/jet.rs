//! Jets: a four-momentum plus the constituents it was built from

use crate::history::{MergeHistory, NodeId};
use crate::kinematics::FourMomentum;
use serde::{Deserialize, Serialize};

/// A final or groomed jet
///
/// `constituents` and `indices` are aligned and ordered by original input
/// index. `root` points into the [`MergeHistory`] that produced the jet; it is
/// a lookup key only and does not keep the history alive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jet {
    pub momentum: FourMomentum,
    pub constituents: Vec<FourMomentum>,
    pub indices: Vec<usize>,
    pub root: Option<NodeId>,
}

impl Jet {
    /// Jet made of everything below `node`
    pub fn from_node(history: &MergeHistory, node: NodeId) -> Self {
        let leaves = history.constituents(node);
        let mut constituents = Vec::with_capacity(leaves.len());
        let mut indices = Vec::with_capacity(leaves.len());
        for leaf in leaves {
            let leaf_node = history.node(leaf);
            constituents.push(leaf_node.momentum);
            indices.push(leaf_node.input_index.unwrap_or_default());
        }
        Self {
            momentum: history.momentum(node),
            constituents,
            indices,
            root: Some(node),
        }
    }

    /// Jet whose momentum is the sum of the given (input index, momentum) pairs
    pub fn from_constituents(mut parts: Vec<(usize, FourMomentum)>) -> Self {
        parts.sort_by_key(|(index, _)| *index);
        let momentum = parts.iter().map(|(_, p)| p).sum();
        let (indices, constituents) = parts.into_iter().unzip();
        Self {
            momentum,
            constituents,
            indices,
            root: None,
        }
    }

    /// Combine several jets built from disjoint constituents
    pub fn join(parts: Vec<Jet>) -> Self {
        let momentum = parts.iter().map(|jet| jet.momentum).sum();
        let mut pairs: Vec<(usize, FourMomentum)> = parts
            .into_iter()
            .flat_map(|jet| jet.indexed_constituents().collect::<Vec<_>>())
            .collect();
        pairs.sort_by_key(|(index, _)| *index);
        let (indices, constituents) = pairs.into_iter().unzip();
        Self {
            momentum,
            constituents,
            indices,
            root: None,
        }
    }

    /// A jet with nothing in it
    pub fn empty() -> Self {
        Self {
            momentum: FourMomentum::zero(),
            constituents: Vec::new(),
            indices: Vec::new(),
            root: None,
        }
    }

    /// Drop the history back-reference
    pub fn detached(mut self) -> Self {
        self.root = None;
        self
    }

    /// (input index, momentum) pairs, in index order
    pub fn indexed_constituents(&self) -> impl Iterator<Item = (usize, FourMomentum)> + '_ {
        self.indices
            .iter()
            .copied()
            .zip(self.constituents.iter().copied())
    }

    pub fn n_constituents(&self) -> usize {
        self.constituents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constituents.is_empty()
    }

    pub fn pt(&self) -> f64 {
        self.momentum.pt()
    }

    pub fn eta(&self) -> f64 {
        self.momentum.eta()
    }

    pub fn phi(&self) -> f64 {
        self.momentum.phi()
    }

    pub fn rapidity(&self) -> f64 {
        self.momentum.rapidity()
    }

    pub fn mass(&self) -> f64 {
        self.momentum.mass()
    }

    pub fn delta_r(&self, other: &Jet) -> f64 {
        self.momentum.delta_r(&other.momentum)
    }
}

/// Sort jets by decreasing transverse momentum
pub fn sorted_by_pt(mut jets: Vec<Jet>) -> Vec<Jet> {
    jets.sort_by(|a, b| b.momentum.pt2().total_cmp(&a.momentum.pt2()));
    jets
}

/// Index of the closest candidate within `max_dr` of `reference`
pub fn match_jet(reference: &Jet, candidates: &[Jet], max_dr: f64) -> Option<usize> {
    candidates
        .iter()
        .enumerate()
        .map(|(i, jet)| (i, reference.delta_r(jet)))
        .filter(|(_, dr)| *dr < max_dr)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Transverse-momentum response p_T(candidate) / p_T(reference)
pub fn pt_response(reference: &Jet, candidate: &Jet) -> Option<f64> {
    let pt_ref = reference.pt();
    (pt_ref > 0.0).then(|| candidate.pt() / pt_ref)
}
