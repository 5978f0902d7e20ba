//! # Sequential Recombination Clustering
//!
//! Generalised-kt clustering over a set of four-momenta:
//!
//! ```text
//!   d_ij = min(kt_i^{2p}, kt_j^{2p}) · ΔR_ij² / R²      d_iB = kt_i^{2p}
//!
//!   while objects remain:
//!       find the smallest d over all pairs and all beam distances
//!       pair  → merge the two objects into a new history node
//!       beam  → emit the object as a final jet
//! ```
//!
//! ## Tie rule
//!
//! Candidates are compared on `(distance, lower id, higher id)`, where a beam
//! candidate counts its second id as +∞. On exact ties merges therefore win
//! over beam steps, and lower node ids (input order, then merge order) win
//! over higher ones. Every strategy uses the same distance function and the
//! same ordering, so they all build bit-identical histories.
//!
//! ## Strategies
//!
//! | Strategy           | Cost    | Module      |
//! |--------------------|---------|-------------|
//! | `Naive`            | O(N³)   | `naive`     |
//! | `NearestNeighbour` | O(N²)   | `nearest`   |
//! | `Tiled`            | O(N√N)  | `tiles`     |

mod naive;
mod nearest;
mod tiles;

use crate::definition::{Algorithm, ClusterStrategy, JetDefinition};
use crate::error::JetError;
use crate::history::{MergeHistory, NodeId};
use crate::jet::Jet;
use crate::kinematics::{delta_phi, FourMomentum};
use std::cmp::Ordering;

// ═══════════════════════════════════════════════════════════════════════════════
// MERGE VETO
// ═══════════════════════════════════════════════════════════════════════════════

/// What to do with a pairwise merge the clustering wants to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeDecision {
    /// Combine the two objects as usual
    Merge,
    /// Throw away the first object, keep the second active
    DropFirst,
    /// Throw away the second object, keep the first active
    DropSecond,
}

/// Hook consulted before every pairwise merge
///
/// Pruning and bottom-up soft drop are clustering runs with a veto.
pub trait MergeVeto {
    fn check(&self, a: &FourMomentum, b: &FourMomentum) -> MergeDecision;
}

/// Drop whichever of the two is softer, keeping the harder one
pub fn drop_softer(a: &FourMomentum, b: &FourMomentum) -> MergeDecision {
    if a.pt2() >= b.pt2() {
        MergeDecision::DropSecond
    } else {
        MergeDecision::DropFirst
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENGINE INTERNALS
// ═══════════════════════════════════════════════════════════════════════════════

/// Cached kinematics of an object still taking part in clustering
#[derive(Debug, Clone, Copy)]
pub(crate) struct ActiveObject {
    pub id: NodeId,
    pub rapidity: f64,
    pub phi: f64,
    /// kt^{2p}, which is also the beam distance
    pub factor: f64,
}

/// A possible next step: merge `first` with `partner`, or beam `first`
#[derive(Debug, Clone, Copy)]
pub(crate) struct Candidate {
    pub distance: f64,
    pub first: NodeId,
    pub partner: Option<NodeId>,
}

impl Candidate {
    pub fn beam(object: &ActiveObject) -> Self {
        Self {
            distance: object.factor,
            first: object.id,
            partner: None,
        }
    }

    fn partner_key(&self) -> usize {
        self.partner.map_or(usize::MAX, |p| p.0)
    }

    /// Non-finite distances sort after every real one
    fn sort_key(&self) -> f64 {
        if self.distance.is_finite() {
            self.distance
        } else {
            f64::INFINITY
        }
    }

    /// Strict ordering used for every minimum search
    pub fn precedes(&self, other: &Candidate) -> bool {
        match self.sort_key().total_cmp(&other.sort_key()) {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => {
                (self.first, self.partner_key()) < (other.first, other.partner_key())
            }
        }
    }
}

/// Result of applying a candidate to the history
pub(crate) enum Outcome {
    Merged { removed: [NodeId; 2], added: NodeId },
    Beamed(NodeId),
    Discarded(NodeId),
}

/// State shared by all strategies: the history being built and the metric
pub(crate) struct Engine<'a> {
    pub history: MergeHistory,
    algorithm: Algorithm,
    inv_r2: f64,
    veto: Option<&'a dyn MergeVeto>,
}

impl<'a> Engine<'a> {
    fn new(definition: &JetDefinition, veto: Option<&'a dyn MergeVeto>) -> Self {
        Self {
            history: MergeHistory::new(definition.recombination()),
            algorithm: definition.algorithm(),
            inv_r2: 1.0 / (definition.radius() * definition.radius()),
            veto,
        }
    }

    pub fn active(&self, id: NodeId) -> ActiveObject {
        let momentum = self.history.momentum(id);
        ActiveObject {
            id,
            rapidity: momentum.rapidity(),
            phi: momentum.phi(),
            factor: self.algorithm.momentum_factor(momentum.pt2()),
        }
    }

    /// d_ij; symmetric in its arguments bit-for-bit
    pub fn distance(&self, a: &ActiveObject, b: &ActiveObject) -> f64 {
        let dy = a.rapidity - b.rapidity;
        let dphi = delta_phi(a.phi, b.phi);
        a.factor.min(b.factor) * (dy * dy + dphi * dphi) * self.inv_r2
    }

    pub fn pair(&self, from: &ActiveObject, to: &ActiveObject) -> Candidate {
        Candidate {
            distance: self.distance(from, to),
            first: from.id,
            partner: Some(to.id),
        }
    }

    pub fn apply(&mut self, candidate: Candidate) -> Outcome {
        let Some(partner) = candidate.partner else {
            self.history.beam(candidate.first, candidate.distance);
            return Outcome::Beamed(candidate.first);
        };
        let (a, b) = if candidate.first < partner {
            (candidate.first, partner)
        } else {
            (partner, candidate.first)
        };
        let decision = match self.veto {
            Some(veto) => veto.check(&self.history.momentum(a), &self.history.momentum(b)),
            None => MergeDecision::Merge,
        };
        match decision {
            MergeDecision::Merge => {
                let added = self.history.merge(a, b, candidate.distance);
                Outcome::Merged {
                    removed: [a, b],
                    added,
                }
            }
            MergeDecision::DropFirst => {
                self.history.discard(a, b);
                Outcome::Discarded(a)
            }
            MergeDecision::DropSecond => {
                self.history.discard(b, a);
                Outcome::Discarded(b)
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLUSTER SEQUENCE
// ═══════════════════════════════════════════════════════════════════════════════

/// The outcome of clustering one set of inputs
#[derive(Debug, Clone)]
pub struct ClusterSequence {
    definition: JetDefinition,
    history: MergeHistory,
    rejected: Vec<usize>,
}

impl ClusterSequence {
    /// Cluster `particles`; input index = position in the slice
    pub fn new(particles: &[FourMomentum], definition: &JetDefinition) -> Self {
        let indexed: Vec<(usize, FourMomentum)> =
            particles.iter().copied().enumerate().collect();
        Self::run(&indexed, definition, None)
    }

    /// Cluster particles that carry their own input indices
    pub fn with_indices(particles: &[(usize, FourMomentum)], definition: &JetDefinition) -> Self {
        Self::run(particles, definition, None)
    }

    /// Cluster with a veto consulted before each pairwise merge
    pub fn with_veto(
        particles: &[(usize, FourMomentum)],
        definition: &JetDefinition,
        veto: &dyn MergeVeto,
    ) -> Self {
        Self::run(particles, definition, Some(veto))
    }

    fn run(
        particles: &[(usize, FourMomentum)],
        definition: &JetDefinition,
        veto: Option<&dyn MergeVeto>,
    ) -> Self {
        let mut engine = Engine::new(definition, veto);
        let mut rejected = Vec::new();
        let mut leaves = Vec::with_capacity(particles.len());

        for (index, momentum) in particles {
            match momentum.validate() {
                Ok(()) => leaves.push(engine.history.push_leaf(*momentum, *index)),
                Err(reason) => {
                    let error = JetError::MalformedParticle {
                        index: *index,
                        reason,
                    };
                    log::warn!("Skipping input: {}", error);
                    rejected.push(*index);
                }
            }
        }

        let strategy = definition.strategy().resolve(leaves.len());
        log::debug!(
            "Clustering {} objects with {} ({:?})",
            leaves.len(),
            definition.description(),
            strategy
        );

        match strategy {
            ClusterStrategy::Naive => naive::cluster(&mut engine, &leaves),
            ClusterStrategy::Tiled => {
                let objects: Vec<ActiveObject> =
                    leaves.iter().map(|id| engine.active(*id)).collect();
                let grid = tiles::TileGrid::new(&objects, definition.radius());
                nearest::cluster(&mut engine, &leaves, grid);
            }
            ClusterStrategy::NearestNeighbour | ClusterStrategy::Auto => {
                nearest::cluster(&mut engine, &leaves, nearest::AllPairs::default())
            }
        }

        Self {
            definition: *definition,
            history: engine.history,
            rejected,
        }
    }

    pub fn definition(&self) -> &JetDefinition {
        &self.definition
    }

    pub fn history(&self) -> &MergeHistory {
        &self.history
    }

    pub fn into_history(self) -> MergeHistory {
        self.history
    }

    /// Input indices that failed validation
    pub fn rejected(&self) -> &[usize] {
        &self.rejected
    }

    /// Every jet in emission order
    pub fn jets(&self) -> Vec<Jet> {
        self.history
            .roots()
            .into_iter()
            .map(|root| Jet::from_node(&self.history, root))
            .collect()
    }

    /// Jets above `pt_min`, in emission order
    pub fn inclusive_jets(&self, pt_min: f64) -> Vec<Jet> {
        let pt2_min = pt_min * pt_min;
        self.history
            .roots()
            .into_iter()
            .filter(|root| self.history.momentum(*root).pt2() >= pt2_min)
            .map(|root| Jet::from_node(&self.history, root))
            .collect()
    }

    /// Jets above the definition's own `pt_min`
    pub fn default_jets(&self) -> Vec<Jet> {
        self.inclusive_jets(self.definition.pt_min())
    }
}

/// Convenience: cluster and return jets sorted by decreasing p_T
pub fn cluster_sorted(particles: &[FourMomentum], definition: &JetDefinition) -> Vec<Jet> {
    crate::jet::sorted_by_pt(ClusterSequence::new(particles, definition).default_jets())
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
