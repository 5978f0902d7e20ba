//! N-subjettiness
//!
//! ```text
//!   tau_N = Σ_i pt_i · min_a ΔR_ia^β  /  Σ_i pt_i · R0^β
//! ```
//!
//! The N axes come from reclustering the constituents with kt into a single
//! tree and undoing its last N-1 merges, which is exclusive kt clustering
//! into N subjets. With winner-take-all recombination each axis points
//! along the hardest particle of its subjet.

use crate::clustering::ClusterSequence;
use crate::definition::{Algorithm, JetDefinition, RecombinationScheme};
use crate::error::JetError;
use crate::jet::Jet;
use crate::kinematics::FourMomentum;
use crate::JetResult;
use serde::{Deserialize, Serialize};

/// How the N subjet axes are found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxesMode {
    /// Exclusive kt, E-scheme recombination
    ExclusiveKt,
    /// Exclusive kt, winner-take-all recombination
    #[default]
    WinnerTakeAllKt,
}

impl AxesMode {
    fn scheme(&self) -> RecombinationScheme {
        match self {
            AxesMode::ExclusiveKt => RecombinationScheme::EScheme,
            AxesMode::WinnerTakeAllKt => RecombinationScheme::WinnerTakeAll,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Nsubjettiness {
    pub n: usize,
    pub beta: f64,
    pub r0: f64,
    #[serde(default)]
    pub axes: AxesMode,
}

impl Nsubjettiness {
    pub fn new(n: usize, beta: f64, r0: f64, axes: AxesMode) -> JetResult<Self> {
        let nsub = Self { n, beta, r0, axes };
        nsub.validate()?;
        Ok(nsub)
    }

    pub fn validate(&self) -> JetResult<()> {
        if self.n == 0 {
            return Err(JetError::InvalidParameter(
                "n-subjettiness needs at least one axis".to_string(),
            ));
        }
        if !self.beta.is_finite() || self.beta <= 0.0 {
            return Err(JetError::InvalidParameter(format!(
                "n-subjettiness beta must be positive and finite, got {}",
                self.beta
            )));
        }
        if !self.r0.is_finite() || self.r0 <= 0.0 {
            return Err(JetError::InvalidParameter(format!(
                "n-subjettiness r0 must be positive and finite, got {}",
                self.r0
            )));
        }
        Ok(())
    }

    /// Same settings, different number of axes
    pub fn with_n(self, n: usize) -> Self {
        Self { n, ..self }
    }

    /// Up to `n` axes; fewer when the jet has fewer constituents
    pub fn axes(&self, jet: &Jet) -> Vec<FourMomentum> {
        let parts: Vec<(usize, FourMomentum)> = jet.indexed_constituents().collect();
        let definition = JetDefinition::single_tree(Algorithm::Kt).with_recombination(self.axes.scheme());
        let sequence = ClusterSequence::with_indices(&parts, &definition);
        let history = sequence.history();
        let Some(root) = history.roots().into_iter().max_by_key(|id| *id) else {
            return Vec::new();
        };
        history
            .exclusive_subjets(root, self.n)
            .into_iter()
            .map(|id| history.momentum(id))
            .collect()
    }

    /// tau_N; `None` for a jet without transverse momentum
    pub fn tau(&self, jet: &Jet) -> Option<f64> {
        let normalisation: f64 =
            jet.constituents.iter().map(|c| c.pt()).sum::<f64>() * self.r0.powf(self.beta);
        if jet.is_empty() || normalisation <= 0.0 {
            return None;
        }

        let axes = self.axes(jet);
        let numerator: f64 = jet
            .constituents
            .iter()
            .map(|c| {
                let nearest = axes
                    .iter()
                    .map(|axis| c.delta_r2(axis))
                    .fold(f64::INFINITY, f64::min);
                c.pt() * nearest.sqrt().powf(self.beta)
            })
            .sum();
        Some(numerator / normalisation)
    }

    /// tau_3 / tau_2; `None` when tau_2 is zero or undefined
    pub fn tau32(&self, jet: &Jet) -> Option<f64> {
        let tau2 = self.with_n(2).tau(jet)?;
        if tau2 <= 0.0 {
            return None;
        }
        let tau3 = self.with_n(3).tau(jet)?;
        Some(tau3 / tau2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(pt: f64, eta: f64, phi: f64) -> FourMomentum {
        FourMomentum::from_pt_eta_phi_m(pt, eta, phi, 0.0)
    }

    fn jet(parts: Vec<FourMomentum>) -> Jet {
        Jet::from_constituents(parts.into_iter().enumerate().collect())
    }

    fn nsub(n: usize, axes: AxesMode) -> Nsubjettiness {
        Nsubjettiness::new(n, 1.0, 1.0, axes).unwrap()
    }

    #[test]
    fn test_tau_vanishes_with_enough_axes() {
        let j = jet(vec![p(100.0, 0.0, 0.0), p(50.0, 0.5, 0.2), p(30.0, -0.3, 0.6)]);
        for mode in [AxesMode::ExclusiveKt, AxesMode::WinnerTakeAllKt] {
            assert!(nsub(3, mode).tau(&j).unwrap().abs() < 1e-9);
            assert!(nsub(1, mode).tau(&j).unwrap() > 0.0);
        }
    }

    #[test]
    fn test_wta_axis_on_hardest_particle() {
        let hard = p(100.0, 0.2, 1.0);
        let j = jet(vec![hard, p(10.0, 0.5, 1.3)]);
        let axes = nsub(1, AxesMode::WinnerTakeAllKt).axes(&j);
        assert_eq!(axes.len(), 1);
        assert!(axes[0].delta_r(&hard) < 1e-9);
    }

    #[test]
    fn test_tau1_two_particles() {
        // WTA axis sits on the hard particle: tau_1 = pt_soft · ΔR / Σ pt
        let j = jet(vec![p(90.0, 0.0, 0.0), p(10.0, 0.0, 0.4)]);
        let tau1 = nsub(1, AxesMode::WinnerTakeAllKt).tau(&j).unwrap();
        assert!((tau1 - 10.0 * 0.4 / 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_tau32_totality() {
        let three = jet(vec![p(100.0, 0.0, 0.0), p(80.0, 0.4, 0.1), p(60.0, -0.2, 0.5)]);
        let ratio = nsub(3, AxesMode::WinnerTakeAllKt).tau32(&three).unwrap();
        assert!(ratio.is_finite() && ratio >= 0.0);

        let four = jet(vec![
            p(100.0, 0.0, 0.0),
            p(80.0, 0.4, 0.1),
            p(60.0, -0.2, 0.5),
            p(20.0, 0.3, -0.4),
        ]);
        let ratio = nsub(3, AxesMode::ExclusiveKt).tau32(&four).unwrap();
        assert!(ratio.is_finite() && ratio > 0.0);

        let single = jet(vec![p(40.0, 0.0, 0.0)]);
        assert!(nsub(3, AxesMode::WinnerTakeAllKt).tau32(&single).is_none());
        assert!(nsub(3, AxesMode::WinnerTakeAllKt).tau(&Jet::empty()).is_none());
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(Nsubjettiness::new(0, 1.0, 1.0, AxesMode::default()).is_err());
        assert!(Nsubjettiness::new(2, -1.0, 1.0, AxesMode::default()).is_err());
        assert!(Nsubjettiness::new(2, 1.0, 0.0, AxesMode::default()).is_err());
    }
}
