//! Trimming: recluster into small subjets and keep the hard ones

use super::{check_non_negative, check_positive, Groomer};
use crate::clustering::ClusterSequence;
use crate::definition::{Algorithm, JetDefinition};
use crate::error::JetError;
use crate::history::MergeHistory;
use crate::jet::Jet;
use crate::kinematics::FourMomentum;
use crate::JetResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Trimmer {
    /// Algorithm for the subjet reclustering
    pub algorithm: Algorithm,
    pub r_sub: f64,
    /// Minimum subjet p_T as a fraction of the jet p_T
    pub f_cut: f64,
}

impl Default for Trimmer {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Kt,
            r_sub: 0.2,
            f_cut: 0.05,
        }
    }
}

impl Trimmer {
    pub fn new(r_sub: f64, f_cut: f64) -> JetResult<Self> {
        let trimmer = Self {
            r_sub,
            f_cut,
            ..Self::default()
        };
        trimmer.validate()?;
        Ok(trimmer)
    }

    pub fn validate(&self) -> JetResult<()> {
        check_positive("trimming", "r_sub", self.r_sub)?;
        check_non_negative("trimming", "f_cut", self.f_cut)?;
        if self.f_cut > 1.0 {
            return Err(JetError::InvalidParameter(format!(
                "trimming: f_cut must lie in [0, 1], got {}",
                self.f_cut
            )));
        }
        Ok(())
    }
}

impl Groomer for Trimmer {
    fn name(&self) -> &'static str {
        "trimming"
    }

    fn groom(&self, jet: &Jet, _history: &MergeHistory) -> Jet {
        if jet.n_constituents() <= 1 {
            return jet.clone();
        }

        let parts: Vec<(usize, FourMomentum)> = jet.indexed_constituents().collect();
        let definition = JetDefinition::unchecked(self.algorithm, self.r_sub);
        let subjets = ClusterSequence::with_indices(&parts, &definition).jets();
        let n_subjets = subjets.len();

        let threshold = self.f_cut * jet.pt();
        let kept: Vec<Jet> = subjets
            .into_iter()
            .filter(|subjet| subjet.pt() >= threshold)
            .collect();
        log::trace!("Trimming kept {}/{} subjets", kept.len(), n_subjets);

        if kept.is_empty() {
            return Jet::empty();
        }
        Jet::join(kept)
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

    #[test]
    fn test_soft_wide_subjet_removed() {
        let jet = Jet::from_constituents(vec![
            (0, p(200.0, 0.0, 1.0)),
            (1, p(100.0, 0.05, 1.05)),
            (2, p(3.0, 0.6, 1.4)),
        ]);
        let trimmed = Trimmer::default().groom(&jet, &no_history());
        assert_eq!(trimmed.indices, vec![0, 1]);
        assert!(trimmed.pt() < jet.pt());
    }

    #[test]
    fn test_collinear_pair_survives_intact() {
        let jet = Jet::from_constituents(vec![(0, p(500.0, 0.0, 0.0)), (1, p(50.0, 0.05, 0.05))]);
        let trimmed = Trimmer::default().groom(&jet, &no_history());
        assert_eq!(trimmed.indices, vec![0, 1]);
        assert!((trimmed.pt() - jet.pt()).abs() < 1e-9);
    }

    #[test]
    fn test_single_constituent_unchanged() {
        let jet = Jet::from_constituents(vec![(5, p(40.0, 0.2, 0.3))]);
        assert_eq!(Trimmer::default().groom(&jet, &no_history()), jet);
    }

    #[test]
    fn test_everything_below_cut_gives_empty_jet() {
        // Two well separated subjets, each softer than f_cut · p_T(jet)
        let jet = Jet::from_constituents(vec![(0, p(10.0, 0.0, 0.0)), (1, p(10.0, 0.0, 1.0))]);
        let trimmer = Trimmer::new(0.2, 1.0).unwrap();
        assert!(trimmer.groom(&jet, &no_history()).is_empty());
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(Trimmer::new(0.0, 0.05).is_err());
        assert!(Trimmer::new(0.2, -0.1).is_err());
        assert!(Trimmer::new(0.2, 1.5).is_err());
        assert!(Trimmer::new(f64::NAN, 0.05).is_err());
    }
}
