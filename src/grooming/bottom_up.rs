//! Bottom-Up Soft Drop
//!
//! Applies the soft-drop condition at every C/A merge as it happens, instead
//! of declustering a finished tree. A failing merge throws away the softer
//! operand; the harder one stays active and can still merge later.

use super::{hardest_jet, Groomer, SoftDropCondition};
use crate::clustering::{drop_softer, ClusterSequence, MergeDecision, MergeVeto};
use crate::definition::{Algorithm, JetDefinition, MAX_ALLOWABLE_R};
use crate::error::JetError;
use crate::history::MergeHistory;
use crate::jet::Jet;
use crate::kinematics::FourMomentum;
use crate::JetResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BottomUpSoftDrop {
    pub z_cut: f64,
    pub beta: f64,
    /// Also the radius of the C/A reclustering
    pub r0: f64,
}

impl Default for BottomUpSoftDrop {
    fn default() -> Self {
        Self {
            z_cut: 0.05,
            beta: 1.0,
            r0: 1.0,
        }
    }
}

impl BottomUpSoftDrop {
    pub fn new(z_cut: f64, beta: f64, r0: f64) -> JetResult<Self> {
        let busd = Self { z_cut, beta, r0 };
        busd.validate()?;
        Ok(busd)
    }

    /// Stricter working point run next to the default one
    pub fn tight() -> Self {
        Self {
            z_cut: 0.1,
            ..Self::default()
        }
    }

    pub fn condition(&self) -> SoftDropCondition {
        SoftDropCondition {
            z_cut: self.z_cut,
            beta: self.beta,
            r0: self.r0,
        }
    }

    pub fn validate(&self) -> JetResult<()> {
        self.condition().validate("bottom_up_soft_drop")?;
        if self.r0 > MAX_ALLOWABLE_R {
            return Err(JetError::InvalidParameter(format!(
                "bottom_up_soft_drop: r0 {} exceeds the maximum {}",
                self.r0, MAX_ALLOWABLE_R
            )));
        }
        Ok(())
    }
}

struct SoftDropVeto(SoftDropCondition);

impl MergeVeto for SoftDropVeto {
    fn check(&self, a: &FourMomentum, b: &FourMomentum) -> MergeDecision {
        if self.0.passes(a, b) {
            MergeDecision::Merge
        } else {
            drop_softer(a, b)
        }
    }
}

impl Groomer for BottomUpSoftDrop {
    fn name(&self) -> &'static str {
        "bottom_up_soft_drop"
    }

    fn groom(&self, jet: &Jet, _history: &MergeHistory) -> Jet {
        if jet.n_constituents() <= 1 {
            return jet.clone();
        }
        let parts: Vec<(usize, FourMomentum)> = jet.indexed_constituents().collect();
        let definition = JetDefinition::unchecked(Algorithm::CambridgeAachen, self.r0);
        let sequence = ClusterSequence::with_veto(&parts, &definition, &SoftDropVeto(self.condition()));
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

    fn jet_with_soft_halo() -> Jet {
        Jet::from_constituents(vec![
            (0, p(200.0, 0.0, 1.0)),
            (1, p(120.0, 0.3, 1.0)),
            (2, p(1.0, -0.6, 1.6)),
            (3, p(0.5, 0.7, 0.3)),
        ])
    }

    #[test]
    fn test_soft_halo_dropped() {
        let jet = jet_with_soft_halo();
        let groomed = BottomUpSoftDrop::default().groom(&jet, &no_history());
        assert_eq!(groomed.indices, vec![0, 1]);
        assert!(groomed.pt() <= jet.pt());
    }

    #[test]
    fn test_tight_is_at_least_as_aggressive() {
        let jet = Jet::from_constituents(vec![
            (0, p(200.0, 0.0, 1.0)),
            (1, p(15.0, 0.4, 1.0)),
            (2, p(120.0, -0.3, 1.2)),
        ]);
        let loose = BottomUpSoftDrop::default().groom(&jet, &no_history());
        let tight = BottomUpSoftDrop::tight().groom(&jet, &no_history());
        assert!(tight.n_constituents() <= loose.n_constituents());
        assert!(tight.indices.iter().all(|i| loose.indices.contains(i)));
    }

    #[test]
    fn test_single_constituent_unchanged() {
        let jet = Jet::from_constituents(vec![(0, p(12.0, 0.0, 0.0))]);
        assert_eq!(BottomUpSoftDrop::tight().groom(&jet, &no_history()), jet);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(BottomUpSoftDrop::new(0.1, f64::INFINITY, 1.0).is_err());
        assert!(BottomUpSoftDrop::new(0.1, 1.0, 0.0).is_err());
        assert!(BottomUpSoftDrop::new(0.1, 1.0, 1.0).is_ok());
    }
}
