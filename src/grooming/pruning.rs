//! Pruning: C/A reclustering that refuses soft or wide-angle merges
//!
//! ```text
//!   R_cut = r_cut_factor · 2m / p_T          (of the original jet)
//!
//!   merge(i, j):
//!       z = min(pt_i, pt_j) / pt_{i+j}
//!       z < z_cut  or  ΔR_ij > R_cut   →  drop the softer of i, j
//! ```

use super::{check_non_negative, check_positive, hardest_jet, Groomer};
use crate::clustering::{drop_softer, ClusterSequence, MergeDecision, MergeVeto};
use crate::definition::{Algorithm, JetDefinition};
use crate::history::MergeHistory;
use crate::jet::Jet;
use crate::kinematics::FourMomentum;
use crate::JetResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pruner {
    pub z_cut: f64,
    pub r_cut_factor: f64,
    /// Radius of the C/A reclustering, normally the jet radius
    pub radius: f64,
}

impl Default for Pruner {
    fn default() -> Self {
        Self {
            z_cut: 0.1,
            r_cut_factor: 0.5,
            radius: 1.0,
        }
    }
}

impl Pruner {
    pub fn new(z_cut: f64, r_cut_factor: f64, radius: f64) -> JetResult<Self> {
        let pruner = Self {
            z_cut,
            r_cut_factor,
            radius,
        };
        pruner.validate()?;
        Ok(pruner)
    }

    pub fn validate(&self) -> JetResult<()> {
        check_non_negative("pruning", "z_cut", self.z_cut)?;
        check_non_negative("pruning", "r_cut_factor", self.r_cut_factor)?;
        check_positive("pruning", "radius", self.radius)?;
        JetDefinition::new(Algorithm::CambridgeAachen, self.radius).map(|_| ())
    }

    /// Angular cut derived from the jet's own mass and p_T
    pub fn r_cut(&self, jet: &Jet) -> f64 {
        let pt = jet.pt();
        if pt <= 0.0 {
            return 0.0;
        }
        self.r_cut_factor * 2.0 * jet.mass().max(0.0) / pt
    }
}

struct PruningVeto {
    z_cut: f64,
    r_cut: f64,
}

impl MergeVeto for PruningVeto {
    fn check(&self, a: &FourMomentum, b: &FourMomentum) -> MergeDecision {
        let combined_pt = (*a + *b).pt();
        let z = if combined_pt > 0.0 {
            a.pt().min(b.pt()) / combined_pt
        } else {
            0.0
        };
        if z < self.z_cut || a.delta_r(b) > self.r_cut {
            drop_softer(a, b)
        } else {
            MergeDecision::Merge
        }
    }
}

impl Groomer for Pruner {
    fn name(&self) -> &'static str {
        "pruning"
    }

    fn groom(&self, jet: &Jet, _history: &MergeHistory) -> Jet {
        if jet.n_constituents() <= 1 {
            return jet.clone();
        }

        let veto = PruningVeto {
            z_cut: self.z_cut,
            r_cut: self.r_cut(jet),
        };
        let parts: Vec<(usize, FourMomentum)> = jet.indexed_constituents().collect();
        let definition = JetDefinition::unchecked(Algorithm::CambridgeAachen, self.radius);
        let sequence = ClusterSequence::with_veto(&parts, &definition, &veto);
        hardest_jet(&sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::RecombinationScheme;

    fn p(pt: f64, eta: f64, phi: f64) -> FourMomentum {
        FourMomentum::from_pt_eta_phi_m(pt, eta, phi, 0.0)
    }

    fn no_history() -> MergeHistory {
        MergeHistory::new(RecombinationScheme::EScheme)
    }

    fn two_prong_jet() -> Jet {
        Jet::from_constituents(vec![
            (0, p(300.0, 0.0, 1.0)),
            (1, p(150.0, 0.15, 1.1)),
            (2, p(2.0, 0.5, 1.5)),
            (3, p(1.5, -0.4, 0.6)),
        ])
    }

    #[test]
    fn test_soft_constituents_pruned() {
        // A loose angular cut leaves only the z cut active
        let jet = two_prong_jet();
        let pruned = Pruner::new(0.1, 10.0, 1.0).unwrap().groom(&jet, &no_history());
        assert_eq!(pruned.indices, vec![0, 1]);
        assert!(pruned.pt() <= jet.pt());
        assert!(pruned.root.is_none());
    }

    #[test]
    fn test_wide_splitting_pruned() {
        // R_cut ≈ m/p_T ≈ 0.1 is narrower than the 0.18 prong separation
        let jet = two_prong_jet();
        let pruned = Pruner::default().groom(&jet, &no_history());
        assert_eq!(pruned.indices, vec![0]);
        assert!(pruned.n_constituents() <= jet.n_constituents());
    }

    #[test]
    fn test_r_cut_from_jet_kinematics() {
        let jet = two_prong_jet();
        let r_cut = Pruner::default().r_cut(&jet);
        let expected = 0.5 * 2.0 * jet.mass() / jet.pt();
        assert!((r_cut - expected).abs() < 1e-12);
        assert_eq!(Pruner::default().r_cut(&Jet::empty()), 0.0);
    }

    #[test]
    fn test_zero_cuts_keep_everything() {
        let jet = two_prong_jet();
        let pruner = Pruner::new(0.0, 10.0, 1.0).unwrap();
        let pruned = pruner.groom(&jet, &no_history());
        assert_eq!(pruned.indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_single_constituent_unchanged() {
        let jet = Jet::from_constituents(vec![(2, p(40.0, 0.2, 0.3))]);
        assert_eq!(Pruner::default().groom(&jet, &no_history()), jet);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(Pruner::new(-0.1, 0.5, 1.0).is_err());
        assert!(Pruner::new(0.1, 0.5, 0.0).is_err());
    }
}
