//! Energy correlation functions
//!
//! ```text
//!   ECF1 = Σ pt_i
//!   ECF2 = Σ_{i<j}   pt_i pt_j      θ_ij^β
//!   ECF3 = Σ_{i<j<k} pt_i pt_j pt_k (θ_ij θ_ik θ_jk)^β
//!
//!   D2   = ECF3 · ECF1³ / ECF2³
//! ```
//!
//! θ is the rapidity-azimuth distance. ECF3 is a triple loop; groomed jets
//! are small enough for that to be cheap.

use crate::error::JetError;
use crate::jet::Jet;
use crate::JetResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyCorrelator {
    pub beta: f64,
}

impl Default for EnergyCorrelator {
    fn default() -> Self {
        Self { beta: 1.0 }
    }
}

/// ECF1, ECF2 and ECF3 of one jet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correlators {
    pub ecf1: f64,
    pub ecf2: f64,
    pub ecf3: f64,
}

impl EnergyCorrelator {
    pub fn new(beta: f64) -> JetResult<Self> {
        let correlator = Self { beta };
        correlator.validate()?;
        Ok(correlator)
    }

    pub fn validate(&self) -> JetResult<()> {
        if self.beta.is_finite() && self.beta > 0.0 {
            Ok(())
        } else {
            Err(JetError::InvalidParameter(format!(
                "energy correlator beta must be positive and finite, got {}",
                self.beta
            )))
        }
    }

    pub fn correlators(&self, jet: &Jet) -> Correlators {
        let pts: Vec<f64> = jet.constituents.iter().map(|c| c.pt()).collect();
        let m = pts.len();

        // θ_ij^β, computed once
        let mut angle = vec![0.0; m * m];
        for i in 0..m {
            for j in (i + 1)..m {
                let theta = jet.constituents[i].delta_r(&jet.constituents[j]).powf(self.beta);
                angle[i * m + j] = theta;
                angle[j * m + i] = theta;
            }
        }

        let ecf1: f64 = pts.iter().sum();
        let mut ecf2 = 0.0;
        let mut ecf3 = 0.0;
        for i in 0..m {
            for j in (i + 1)..m {
                let pair = pts[i] * pts[j];
                let theta_ij = angle[i * m + j];
                ecf2 += pair * theta_ij;
                for k in (j + 1)..m {
                    ecf3 += pair * pts[k] * theta_ij * angle[i * m + k] * angle[j * m + k];
                }
            }
        }
        Correlators { ecf1, ecf2, ecf3 }
    }

    /// D2, or `None` when ECF2 vanishes (fewer than two separated constituents)
    pub fn d2(&self, jet: &Jet) -> Option<f64> {
        let Correlators { ecf1, ecf2, ecf3 } = self.correlators(jet);
        if ecf2 <= 0.0 {
            return None;
        }
        Some(ecf3 * ecf1.powi(3) / ecf2.powi(3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::FourMomentum;

    fn p(pt: f64, eta: f64, phi: f64) -> FourMomentum {
        FourMomentum::from_pt_eta_phi_m(pt, eta, phi, 0.0)
    }

    fn jet(parts: Vec<FourMomentum>) -> Jet {
        Jet::from_constituents(parts.into_iter().enumerate().collect())
    }

    #[test]
    fn test_two_particle_correlators() {
        let j = jet(vec![p(30.0, 0.0, 0.0), p(10.0, 0.0, 0.5)]);
        let c = EnergyCorrelator::default().correlators(&j);
        assert!((c.ecf1 - 40.0).abs() < 1e-9);
        assert!((c.ecf2 - 300.0 * 0.5).abs() < 1e-9);
        assert_eq!(c.ecf3, 0.0);
        assert_eq!(EnergyCorrelator::default().d2(&j), Some(0.0));
    }

    #[test]
    fn test_three_prong_d2_finite() {
        let j = jet(vec![p(100.0, 0.0, 0.0), p(80.0, 0.4, 0.1), p(60.0, -0.2, 0.5)]);
        let d2 = EnergyCorrelator::new(2.0).unwrap().d2(&j).unwrap();
        assert!(d2.is_finite());
        assert!(d2 > 0.0);
    }

    #[test]
    fn test_degenerate_jets_undefined() {
        let correlator = EnergyCorrelator::default();
        assert!(correlator.d2(&Jet::empty()).is_none());
        assert!(correlator.d2(&jet(vec![p(50.0, 0.0, 0.0)])).is_none());
    }

    #[test]
    fn test_invalid_beta() {
        assert!(EnergyCorrelator::new(0.0).is_err());
        assert!(EnergyCorrelator::new(f64::NAN).is_err());
    }
}
