//! Four-Momentum Kinematics
//!
//! The immutable kinematic unit every other module works with.
//!
//! | Quantity  | Definition                                  |
//! |-----------|---------------------------------------------|
//! | p_T       | √(p_x² + p_y²)                              |
//! | y         | ½ ln((E + p_z) / (E − p_z))                 |
//! | η         | −ln tan(θ/2)                                |
//! | φ         | atan2(p_y, p_x), mapped into [0, 2π)        |
//! | m         | √(E² − \|p\|²), negative for spacelike input |
//!
//! Angular distances (ΔR) are measured in the (rapidity, azimuth) plane,
//! which is what the clustering metric and all substructure observables use.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::iter::Sum;
use std::ops::Add;

const TWO_PI: f64 = 2.0 * PI;

// ═══════════════════════════════════════════════════════════════════════════════
// FOUR-MOMENTUM
// ═══════════════════════════════════════════════════════════════════════════════

/// Four-momentum vector in natural units (c = 1)
///
/// p^μ = (E, p_x, p_y, p_z)
///
/// Values are never mutated after construction; recombination builds a new
/// four-momentum through [`Add`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FourMomentum {
    /// Energy component (timelike)
    pub e: f64,
    /// Momentum x-component
    pub px: f64,
    /// Momentum y-component
    pub py: f64,
    /// Momentum z-component (beam axis)
    pub pz: f64,
}

impl FourMomentum {
    /// Create from Cartesian components (p_x, p_y, p_z, E)
    pub fn new(px: f64, py: f64, pz: f64, e: f64) -> Self {
        Self { e, px, py, pz }
    }

    /// The zero vector, used as the groomed result when nothing survives
    pub fn zero() -> Self {
        Self::default()
    }

    /// Create from collider coordinates (p_T, η, φ, m)
    pub fn from_pt_eta_phi_m(pt: f64, eta: f64, phi: f64, m: f64) -> Self {
        let px = pt * phi.cos();
        let py = pt * phi.sin();
        let pz = pt * eta.sinh();
        let p2 = px * px + py * py + pz * pz;
        let e = if m >= 0.0 {
            (p2 + m * m).sqrt()
        } else {
            (p2 - m * m).max(0.0).sqrt()
        };
        Self::new(px, py, pz, e)
    }

    /// Create from (p_T, y, φ, m) where y is the rapidity
    pub fn from_pt_rapidity_phi_m(pt: f64, rapidity: f64, phi: f64, m: f64) -> Self {
        let mt = (pt * pt + m * m).sqrt();
        Self::new(
            pt * phi.cos(),
            pt * phi.sin(),
            mt * rapidity.sinh(),
            mt * rapidity.cosh(),
        )
    }

    /// Squared transverse momentum
    pub fn pt2(&self) -> f64 {
        self.px * self.px + self.py * self.py
    }

    /// Transverse momentum: p_T = √(p_x² + p_y²)
    pub fn pt(&self) -> f64 {
        self.pt2().sqrt()
    }

    /// Invariant mass squared: m² = E² − |p|²
    pub fn mass_squared(&self) -> f64 {
        self.e * self.e - self.px * self.px - self.py * self.py - self.pz * self.pz
    }

    /// Invariant mass; spacelike vectors (rounding artefacts) give −√(−m²)
    pub fn mass(&self) -> f64 {
        let m2 = self.mass_squared();
        if m2 < 0.0 {
            -(-m2).sqrt()
        } else {
            m2.sqrt()
        }
    }

    /// Rapidity
    ///
    /// Uses the transverse-mass form so that vectors which are spacelike by
    /// rounding still get a finite rapidity. Requires p_T > 0.
    pub fn rapidity(&self) -> f64 {
        let effective_m2 = self.mass_squared().max(0.0);
        let e_plus_pz = self.e + self.pz.abs();
        let rap = 0.5 * ((self.pt2() + effective_m2) / (e_plus_pz * e_plus_pz)).ln();
        if self.pz > 0.0 {
            -rap
        } else {
            rap
        }
    }

    /// Pseudorapidity: η = asinh(p_z / p_T)
    pub fn eta(&self) -> f64 {
        let pt = self.pt();
        if pt > 0.0 {
            (self.pz / pt).asinh()
        } else if self.pz >= 0.0 {
            f64::INFINITY
        } else {
            f64::NEG_INFINITY
        }
    }

    /// Azimuthal angle in [0, 2π)
    pub fn phi(&self) -> f64 {
        let phi = self.py.atan2(self.px);
        let phi = if phi < 0.0 { phi + TWO_PI } else { phi };
        if phi >= TWO_PI {
            phi - TWO_PI
        } else {
            phi
        }
    }

    /// Squared angular distance in the (y, φ) plane
    pub fn delta_r2(&self, other: &Self) -> f64 {
        let dy = self.rapidity() - other.rapidity();
        let dphi = delta_phi(self.phi(), other.phi());
        dy * dy + dphi * dphi
    }

    /// Angular distance in the (y, φ) plane
    pub fn delta_r(&self, other: &Self) -> f64 {
        self.delta_r2(other).sqrt()
    }

    /// Check the vector is usable as a clustering input
    ///
    /// Rejects non-finite components, negative energy, vectors parallel to
    /// the beam (p_T = 0) and any other vector whose rapidity is not finite,
    /// such as E = p_z = 0.
    pub fn validate(&self) -> Result<(), String> {
        if ![self.e, self.px, self.py, self.pz]
            .iter()
            .all(|c| c.is_finite())
        {
            return Err("non-finite component".to_string());
        }
        if self.e < 0.0 {
            return Err(format!("negative energy {}", self.e));
        }
        if self.pt2() <= 0.0 {
            return Err("zero transverse momentum".to_string());
        }
        let rapidity = self.rapidity();
        if !rapidity.is_finite() {
            return Err(format!("undefined rapidity {}", rapidity));
        }
        Ok(())
    }
}

impl Add for FourMomentum {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            e: self.e + other.e,
            px: self.px + other.px,
            py: self.py + other.py,
            pz: self.pz + other.pz,
        }
    }
}

impl Sum for FourMomentum {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, p| acc + p)
    }
}

impl<'a> Sum<&'a FourMomentum> for FourMomentum {
    fn sum<I: Iterator<Item = &'a FourMomentum>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, p| acc + *p)
    }
}

/// Azimuthal separation folded into [0, π]
///
/// Symmetric in its arguments bit-for-bit, which the clustering tie rule
/// relies on.
pub fn delta_phi(phi1: f64, phi2: f64) -> f64 {
    let d = (phi1 - phi2).abs();
    if d > PI {
        TWO_PI - d
    } else {
        d
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
