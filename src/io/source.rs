//! Event sources: JSON lines on disk and a random boosted-jet generator

use super::{Event, EventSource};
use crate::error::JetError;
use crate::kinematics::FourMomentum;
use crate::JetResult;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

// ═══════════════════════════════════════════════════════════════════════════════
// JSON LINES
// ═══════════════════════════════════════════════════════════════════════════════

/// A particle as written in an input file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParticleRecord {
    PtEtaPhiM {
        pt: f64,
        eta: f64,
        phi: f64,
        #[serde(default)]
        m: f64,
    },
    Cartesian {
        px: f64,
        py: f64,
        pz: f64,
        e: f64,
    },
}

impl ParticleRecord {
    /// Reject records the four-momentum conversion would misread
    ///
    /// A negative p_T in the collider form would come out with φ flipped
    /// by π; everything else is left to [`FourMomentum::validate`].
    pub fn validate(&self) -> Result<(), String> {
        match self {
            ParticleRecord::PtEtaPhiM { pt, .. } if *pt < 0.0 => {
                Err(format!("negative transverse momentum {}", pt))
            }
            _ => Ok(()),
        }
    }
}

impl From<ParticleRecord> for FourMomentum {
    fn from(record: ParticleRecord) -> Self {
        match record {
            ParticleRecord::PtEtaPhiM { pt, eta, phi, m } => {
                FourMomentum::from_pt_eta_phi_m(pt, eta, phi, m)
            }
            ParticleRecord::Cartesian { px, py, pz, e } => FourMomentum::new(px, py, pz, e),
        }
    }
}

#[derive(Debug, Deserialize)]
struct EventRecord {
    #[serde(default = "unit_weight")]
    weight: f64,
    particles: Vec<ParticleRecord>,
}

fn unit_weight() -> f64 {
    1.0
}

/// Reads one JSON object per line:
///
/// ```text
/// {"weight": 0.8, "particles": [{"pt": 512.0, "eta": 0.1, "phi": 2.3, "m": 0.0}, ...]}
/// ```
///
/// Blank lines are skipped. Particles may also be given as `px, py, pz, e`.
pub struct JsonLinesSource<R> {
    reader: R,
    line_number: usize,
    buffer: String,
}

impl JsonLinesSource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> JetResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        log::info!("Reading events from {:?}", path);
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            buffer: String::new(),
        }
    }
}

impl<R: BufRead> EventSource for JsonLinesSource<R> {
    fn next_event(&mut self) -> JetResult<Option<Event>> {
        loop {
            self.buffer.clear();
            if self.reader.read_line(&mut self.buffer)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;
            let line = self.buffer.trim();
            if line.is_empty() {
                continue;
            }
            let record: EventRecord = serde_json::from_str(line).map_err(|e| {
                JetError::Serialization(format!("line {}: {}", self.line_number, e))
            })?;
            let line_number = self.line_number;
            let particles = record
                .particles
                .into_iter()
                .enumerate()
                .filter_map(|(index, particle)| match particle.validate() {
                    Ok(()) => Some(FourMomentum::from(particle)),
                    Err(reason) => {
                        let error = JetError::MalformedParticle { index, reason };
                        log::warn!("Skipping input on line {}: {}", line_number, error);
                        None
                    }
                })
                .collect();
            return Ok(Some(Event {
                weight: record.weight,
                particles,
            }));
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SYNTHETIC EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Random events with one boosted 1-3 prong jet, a recoil jet and soft noise
///
/// Deterministic for a given seed. Momenta in GeV.
pub struct SyntheticSource {
    rng: StdRng,
    remaining: usize,
    /// Uniformly distributed soft particles per event
    pub soft_particles: usize,
    /// Range of the hard jet p_T
    pub pt_range: (f64, f64),
}

impl SyntheticSource {
    pub fn new(n_events: usize, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            remaining: n_events,
            soft_particles: 60,
            pt_range: (300.0, 1200.0),
        }
    }

    /// Split `pt` into collinear-ish fragments around (eta, phi)
    fn spray(&mut self, pt: f64, eta: f64, phi: f64, spread: f64, out: &mut Vec<FourMomentum>) {
        let n = self.rng.gen_range(3..8);
        let mut shares: Vec<f64> = (0..n).map(|_| self.rng.gen_range(0.05..1.0)).collect();
        let total: f64 = shares.iter().sum();
        shares.iter_mut().for_each(|s| *s /= total);
        for share in shares {
            let d_eta = self.rng.gen_range(-spread..spread);
            let d_phi = self.rng.gen_range(-spread..spread);
            out.push(FourMomentum::from_pt_eta_phi_m(
                pt * share,
                eta + d_eta,
                (phi + d_phi).rem_euclid(TAU),
                0.0,
            ));
        }
    }

    fn generate(&mut self) -> Event {
        let mut particles = Vec::new();
        let (pt_lo, pt_hi) = self.pt_range;
        let pt = self.rng.gen_range(pt_lo..pt_hi);
        let eta = self.rng.gen_range(-1.5..1.5);
        let phi = self.rng.gen_range(0.0..TAU);

        let n_prongs = self.rng.gen_range(1..=3);
        let mut remaining = pt;
        for prong in 0..n_prongs {
            let prong_pt = if prong + 1 == n_prongs {
                remaining
            } else {
                let share = self.rng.gen_range(0.2..0.6);
                remaining * share
            };
            remaining -= prong_pt;
            let d_eta = self.rng.gen_range(-0.3..0.3);
            let d_phi = self.rng.gen_range(-0.3..0.3);
            self.spray(prong_pt, eta + d_eta, phi + d_phi, 0.05, &mut particles);
        }

        // Recoil
        let recoil_eta = self.rng.gen_range(-1.5..1.5);
        self.spray(pt, recoil_eta, (phi + PI).rem_euclid(TAU), 0.1, &mut particles);

        for _ in 0..self.soft_particles {
            particles.push(FourMomentum::from_pt_eta_phi_m(
                self.rng.gen_range(0.3..4.0),
                self.rng.gen_range(-2.5..2.5),
                self.rng.gen_range(0.0..TAU),
                0.0,
            ));
        }

        Event {
            weight: self.rng.gen_range(0.5..1.5),
            particles,
        }
    }
}

impl EventSource for SyntheticSource {
    fn next_event(&mut self) -> JetResult<Option<Event>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        Ok(Some(self.generate()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_json_lines_both_particle_forms() {
        let text = r#"{"weight": 0.5, "particles": [{"pt": 100.0, "eta": 0.2, "phi": 1.0, "m": 5.0}]}

{"particles": [{"px": 3.0, "py": 4.0, "pz": 0.0, "e": 5.0}, {"pt": 10.0, "eta": 0.0, "phi": 0.0}]}
"#;
        let mut source = JsonLinesSource::new(Cursor::new(text));
        let first = source.next_event().unwrap().unwrap();
        assert_eq!(first.weight, 0.5);
        assert!((first.particles[0].pt() - 100.0).abs() < 1e-9);
        assert!((first.particles[0].mass() - 5.0).abs() < 1e-6);

        let second = source.next_event().unwrap().unwrap();
        assert_eq!(second.weight, 1.0);
        assert_eq!(second.particles.len(), 2);
        assert!((second.particles[0].pt() - 5.0).abs() < 1e-12);

        assert!(source.next_event().unwrap().is_none());
    }

    #[test]
    fn test_json_lines_error_names_line() {
        let text = "{\"particles\": []}\n{broken\n";
        let mut source = JsonLinesSource::new(Cursor::new(text));
        assert!(source.next_event().unwrap().is_some());
        match source.next_event() {
            Err(JetError::Serialization(message)) => assert!(message.starts_with("line 2")),
            other => panic!("expected a serialization error, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_pt_record_skipped() {
        let text = r#"{"particles": [{"pt": -40.0, "eta": 0.0, "phi": 0.5}, {"pt": 40.0, "eta": 0.0, "phi": 0.5}]}"#;
        let mut source = JsonLinesSource::new(Cursor::new(text));
        let event = source.next_event().unwrap().unwrap();
        assert_eq!(event.particles.len(), 1);
        assert!((event.particles[0].phi() - 0.5).abs() < 1e-12);

        let cartesian = ParticleRecord::Cartesian { px: -3.0, py: 4.0, pz: 0.0, e: 5.0 };
        assert!(cartesian.validate().is_ok());
    }

    #[test]
    fn test_synthetic_events_deterministic() {
        let a = SyntheticSource::new(5, 42).collect_events().unwrap();
        let b = SyntheticSource::new(5, 42).collect_events().unwrap();
        assert_eq!(a.len(), 5);
        assert_eq!(a, b);
        for event in &a {
            assert!(event.particles.iter().all(|p| p.validate().is_ok()));
            assert!(event.particles.len() > 60);
        }
    }
}
