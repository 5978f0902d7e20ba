//! # Jet Substructure
//!
//! Scalar observables computed from a (groomed) jet's constituents:
//!
//! - **D2** from energy correlation functions: small for one-prong jets,
//!   larger for two-prong decays such as W/Z/H → qq̄.
//! - **tau32** from N-subjettiness: small for three-prong jets (top quarks).
//!
//! Both are `Option<f64>`; `None` means the observable is undefined for the
//! jet (too few constituents, vanishing denominator).

mod ecf;
mod nsubjettiness;

pub use ecf::{Correlators, EnergyCorrelator};
pub use nsubjettiness::{AxesMode, Nsubjettiness};

use crate::jet::Jet;
use crate::JetResult;
use serde::{Deserialize, Serialize};

/// Parameters of the substructure calculators
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubstructureSettings {
    pub ecf_beta: f64,
    pub nsub_beta: f64,
    /// N-subjettiness normalisation radius; `None` follows the jet radius
    /// (see [`SubstructureSettings::with_jet_radius`]), or 1.0 standalone
    pub nsub_r0: Option<f64>,
    pub axes: AxesMode,
}

impl Default for SubstructureSettings {
    fn default() -> Self {
        Self {
            ecf_beta: 1.0,
            nsub_beta: 1.0,
            nsub_r0: None,
            axes: AxesMode::WinnerTakeAllKt,
        }
    }
}

/// D2 and tau32 of one jet
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SubstructureValues {
    pub d2: Option<f64>,
    pub tau32: Option<f64>,
}

impl SubstructureSettings {
    pub fn validate(&self) -> JetResult<()> {
        self.energy_correlator().validate()?;
        self.nsubjettiness(3).validate()
    }

    /// Fill an unset normalisation radius with the clustering radius
    pub fn with_jet_radius(mut self, radius: f64) -> Self {
        self.nsub_r0.get_or_insert(radius);
        self
    }

    pub fn energy_correlator(&self) -> EnergyCorrelator {
        EnergyCorrelator {
            beta: self.ecf_beta,
        }
    }

    pub fn nsubjettiness(&self, n: usize) -> Nsubjettiness {
        Nsubjettiness {
            n,
            beta: self.nsub_beta,
            r0: self.nsub_r0.unwrap_or(1.0),
            axes: self.axes,
        }
    }

    pub fn compute(&self, jet: &Jet) -> SubstructureValues {
        SubstructureValues {
            d2: self.energy_correlator().d2(jet),
            tau32: self.nsubjettiness(3).tau32(jet),
        }
    }
}
