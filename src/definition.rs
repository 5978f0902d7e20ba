//! Jet Definition
//!
//! The configuration value every clustering call takes explicitly. There is no
//! global state: two definitions can be used side by side on different threads.

use crate::error::JetError;
use crate::kinematics::FourMomentum;
use crate::JetResult;
use serde::{Deserialize, Serialize};

/// Largest radius accepted by [`JetDefinition::new`]
///
/// Reclustering a jet into a single tree uses this radius so that the beam
/// distance never wins against a pairwise merge.
pub const MAX_ALLOWABLE_R: f64 = 1000.0;

// ═══════════════════════════════════════════════════════════════════════════════
// ALGORITHM
// ═══════════════════════════════════════════════════════════════════════════════

/// Members of the generalised-kt family
///
/// d_ij = min(kt_i^{2p}, kt_j^{2p}) · ΔR_ij² / R²,  d_iB = kt_i^{2p}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// p = −1: hard seeds accrete soft radiation, cone-like jets
    AntiKt,
    /// p = 0: purely angular ordering
    CambridgeAachen,
    /// p = 1: soft-first recombination
    Kt,
}

impl Algorithm {
    /// kt^{2p} for a given squared transverse momentum
    pub fn momentum_factor(&self, pt2: f64) -> f64 {
        match self {
            Algorithm::AntiKt => 1.0 / pt2,
            Algorithm::CambridgeAachen => 1.0,
            Algorithm::Kt => pt2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::AntiKt => "anti-kt",
            Algorithm::CambridgeAachen => "Cambridge/Aachen",
            Algorithm::Kt => "kt",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECOMBINATION
// ═══════════════════════════════════════════════════════════════════════════════

/// How two objects are combined into one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecombinationScheme {
    /// Four-vector addition
    #[default]
    EScheme,
    /// Massless result along the harder input, carrying the summed p_T
    WinnerTakeAll,
}

impl RecombinationScheme {
    pub fn recombine(&self, a: &FourMomentum, b: &FourMomentum) -> FourMomentum {
        match self {
            RecombinationScheme::EScheme => *a + *b,
            RecombinationScheme::WinnerTakeAll => {
                let pt = a.pt() + b.pt();
                let harder = if a.pt2() >= b.pt2() { a } else { b };
                FourMomentum::from_pt_rapidity_phi_m(pt, harder.rapidity(), harder.phi(), 0.0)
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STRATEGY
// ═══════════════════════════════════════════════════════════════════════════════

/// Neighbour-search strategy used by the clustering engine
///
/// All strategies produce the same clustering; they differ only in cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterStrategy {
    /// Tiled above [`ClusterStrategy::TILED_THRESHOLD`] inputs, else nearest-neighbour
    #[default]
    Auto,
    /// Full rescan of every pair at every step, O(N³)
    Naive,
    /// Cached nearest neighbour per object, O(N²)
    NearestNeighbour,
    /// Nearest neighbours restricted to a rapidity-azimuth tile grid
    Tiled,
}

impl ClusterStrategy {
    pub const TILED_THRESHOLD: usize = 50;

    /// Resolve `Auto` for a given input size
    pub fn resolve(self, n: usize) -> Self {
        match self {
            ClusterStrategy::Auto if n > Self::TILED_THRESHOLD => ClusterStrategy::Tiled,
            ClusterStrategy::Auto => ClusterStrategy::NearestNeighbour,
            other => other,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// JET DEFINITION
// ═══════════════════════════════════════════════════════════════════════════════

/// Clustering configuration: algorithm, radius and recombination
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JetDefinition {
    algorithm: Algorithm,
    radius: f64,
    #[serde(default)]
    recombination: RecombinationScheme,
    #[serde(default)]
    strategy: ClusterStrategy,
    #[serde(default)]
    pt_min: f64,
}

impl JetDefinition {
    /// Create a validated definition
    pub fn new(algorithm: Algorithm, radius: f64) -> JetResult<Self> {
        let def = Self::unchecked(algorithm, radius);
        def.validate()?;
        Ok(def)
    }

    /// Anti-kt with the given radius
    pub fn anti_kt(radius: f64) -> JetResult<Self> {
        Self::new(Algorithm::AntiKt, radius)
    }

    /// Internal constructor for radii already known to be valid
    pub(crate) fn unchecked(algorithm: Algorithm, radius: f64) -> Self {
        Self {
            algorithm,
            radius,
            recombination: RecombinationScheme::EScheme,
            strategy: ClusterStrategy::Auto,
            pt_min: 0.0,
        }
    }

    /// Definition whose clustering always ends in a single tree
    pub(crate) fn single_tree(algorithm: Algorithm) -> Self {
        Self::unchecked(algorithm, MAX_ALLOWABLE_R)
    }

    pub fn with_recombination(mut self, recombination: RecombinationScheme) -> Self {
        self.recombination = recombination;
        self
    }

    pub fn with_strategy(mut self, strategy: ClusterStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Minimum p_T for [`crate::clustering::ClusterSequence::inclusive_jets`]
    pub fn with_pt_min(mut self, pt_min: f64) -> JetResult<Self> {
        self.pt_min = pt_min;
        self.validate()?;
        Ok(self)
    }

    /// Check every field; also used after deserialization
    pub fn validate(&self) -> JetResult<()> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(JetError::InvalidParameter(format!(
                "jet radius must be positive and finite, got {}",
                self.radius
            )));
        }
        if self.radius > MAX_ALLOWABLE_R {
            return Err(JetError::InvalidParameter(format!(
                "jet radius {} exceeds the maximum {}",
                self.radius, MAX_ALLOWABLE_R
            )));
        }
        if !self.pt_min.is_finite() || self.pt_min < 0.0 {
            return Err(JetError::InvalidParameter(format!(
                "pt_min must be non-negative, got {}",
                self.pt_min
            )));
        }
        Ok(())
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn recombination(&self) -> RecombinationScheme {
        self.recombination
    }

    pub fn strategy(&self) -> ClusterStrategy {
        self.strategy
    }

    pub fn pt_min(&self) -> f64 {
        self.pt_min
    }

    /// Human-readable description, e.g. "anti-kt R=1.0"
    pub fn description(&self) -> String {
        format!("{} R={:.1}", self.algorithm.name(), self.radius)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
