//! # Jet Grooming
//!
//! Transforms that remove soft, wide-angle radiation from a jet. Every
//! variant follows the same contract, `(jet, history) → groomed jet`, and
//! only ever removes constituents:
//!
//! | Variant                | Works on                      | Keeps                               |
//! |------------------------|-------------------------------|-------------------------------------|
//! | [`Trimmer`]            | kt subjets of radius r_sub    | subjets above f_cut · p_T(jet)      |
//! | [`Pruner`]             | C/A reclustering with a veto  | branches passing z and ΔR cuts      |
//! | [`SoftDrop`]           | C/A tree, top-down            | first node passing the SD condition |
//! | [`RecursiveSoftDrop`]  | C/A tree, all prongs          | every prong passing SD              |
//! | [`BottomUpSoftDrop`]   | C/A reclustering with a veto  | merges passing SD                   |
//!
//! The soft-drop condition, shared by the last three, is
//!
//! ```text
//!   min(pt₁, pt₂) / (pt₁ + pt₂)  >  z_cut · (ΔR₁₂ / R₀)^β
//! ```

mod bottom_up;
mod pruning;
mod soft_drop;
mod trimming;

pub use bottom_up::BottomUpSoftDrop;
pub use pruning::Pruner;
pub use soft_drop::{RecursiveSoftDrop, SoftDrop};
pub use trimming::Trimmer;

use crate::clustering::ClusterSequence;
use crate::definition::{Algorithm, JetDefinition};
use crate::error::JetError;
use crate::history::{MergeHistory, NodeId};
use crate::jet::Jet;
use crate::kinematics::FourMomentum;
use crate::JetResult;
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// GROOMER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Common interface of all grooming strategies
pub trait Groomer: Send + Sync {
    /// Short name for logs and histogram labels
    fn name(&self) -> &'static str;

    /// Produce the groomed version of `jet`
    ///
    /// `history` is the merge history `jet.root` points into. Jets with at
    /// most one constituent come back unchanged.
    fn groom(&self, jet: &Jet, history: &MergeHistory) -> Jet;
}

/// One of the five grooming strategies, selectable from configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Grooming {
    Trimming(Trimmer),
    Pruning(Pruner),
    SoftDrop(SoftDrop),
    RecursiveSoftDrop(RecursiveSoftDrop),
    BottomUpSoftDrop(BottomUpSoftDrop),
}

impl Grooming {
    fn inner(&self) -> &dyn Groomer {
        match self {
            Grooming::Trimming(g) => g,
            Grooming::Pruning(g) => g,
            Grooming::SoftDrop(g) => g,
            Grooming::RecursiveSoftDrop(g) => g,
            Grooming::BottomUpSoftDrop(g) => g,
        }
    }

    pub fn validate(&self) -> JetResult<()> {
        match self {
            Grooming::Trimming(g) => g.validate(),
            Grooming::Pruning(g) => g.validate(),
            Grooming::SoftDrop(g) => g.validate(),
            Grooming::RecursiveSoftDrop(g) => g.validate(),
            Grooming::BottomUpSoftDrop(g) => g.validate(),
        }
    }
}

impl Groomer for Grooming {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn groom(&self, jet: &Jet, history: &MergeHistory) -> Jet {
        self.inner().groom(jet, history)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SOFT-DROP CONDITION
// ═══════════════════════════════════════════════════════════════════════════════

/// z > z_cut · (ΔR / R₀)^β
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoftDropCondition {
    pub z_cut: f64,
    pub beta: f64,
    pub r0: f64,
}

impl SoftDropCondition {
    pub fn passes(&self, a: &FourMomentum, b: &FourMomentum) -> bool {
        let (pt_a, pt_b) = (a.pt(), b.pt());
        let total = pt_a + pt_b;
        if total <= 0.0 {
            return false;
        }
        let z = pt_a.min(pt_b) / total;
        z > self.z_cut * (a.delta_r(b) / self.r0).powf(self.beta)
    }

    pub(crate) fn validate(&self, groomer: &str) -> JetResult<()> {
        check_non_negative(groomer, "z_cut", self.z_cut)?;
        if !self.beta.is_finite() {
            return Err(JetError::InvalidParameter(format!(
                "{groomer}: beta must be finite, got {}",
                self.beta
            )));
        }
        check_positive(groomer, "r0", self.r0)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SHARED HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

pub(crate) fn check_positive(groomer: &str, field: &str, value: f64) -> JetResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(JetError::InvalidParameter(format!(
            "{groomer}: {field} must be positive and finite, got {value}"
        )))
    }
}

pub(crate) fn check_non_negative(groomer: &str, field: &str, value: f64) -> JetResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(JetError::InvalidParameter(format!(
            "{groomer}: {field} must be non-negative and finite, got {value}"
        )))
    }
}

/// Recluster a jet's constituents into a single binary tree
///
/// Returns the private history and its root, or `None` for an empty jet.
pub(crate) fn recluster_tree(jet: &Jet, algorithm: Algorithm) -> Option<(MergeHistory, NodeId)> {
    let parts: Vec<(usize, FourMomentum)> = jet.indexed_constituents().collect();
    let sequence = ClusterSequence::with_indices(&parts, &JetDefinition::single_tree(algorithm));
    let history = sequence.into_history();
    let root = history
        .roots()
        .into_iter()
        .max_by(|a, b| history.momentum(*a).pt2().total_cmp(&history.momentum(*b).pt2()))?;
    Some((history, root))
}

/// Hardest jet of a clustering, detached from its private history
pub(crate) fn hardest_jet(sequence: &ClusterSequence) -> Jet {
    crate::jet::sorted_by_pt(sequence.jets())
        .into_iter()
        .next()
        .map(Jet::detached)
        .unwrap_or_else(Jet::empty)
}

// ═══════════════════════════════════════════════════════════════════════════════
// GROOMING SETTINGS
// ═══════════════════════════════════════════════════════════════════════════════

/// Parameters for every grooming variant an analysis runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroomingSettings {
    pub trimming: Trimmer,
    pub pruning: Pruner,
    pub soft_drop: SoftDrop,
    pub recursive_soft_drop: RecursiveSoftDrop,
    pub bottom_up: BottomUpSoftDrop,
    /// Same algorithm with stricter parameters
    pub bottom_up_tight: BottomUpSoftDrop,
}

impl Default for GroomingSettings {
    fn default() -> Self {
        Self {
            trimming: Trimmer::default(),
            pruning: Pruner::default(),
            soft_drop: SoftDrop::default(),
            recursive_soft_drop: RecursiveSoftDrop::default(),
            bottom_up: BottomUpSoftDrop::default(),
            bottom_up_tight: BottomUpSoftDrop::tight(),
        }
    }
}

impl GroomingSettings {
    pub fn validate(&self) -> JetResult<()> {
        self.trimming.validate()?;
        self.pruning.validate()?;
        self.soft_drop.validate()?;
        self.recursive_soft_drop.validate()?;
        self.bottom_up.validate()?;
        self.bottom_up_tight.validate()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
