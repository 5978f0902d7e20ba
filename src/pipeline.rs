//! # Event Pipeline
//!
//! Runs the full chain on one event at a time:
//!
//! ```text
//!   particles ──► ClusterSequence ──► leading jets ──┬─► Ungroomed
//!                                                    ├─► Trimmed
//!                                                    ├─► Pruned            ──► pt, η, φ, m
//!                                                    ├─► SoftDrop              D2, tau32
//!                                                    ├─► RecursiveSoftDrop
//!                                                    ├─► BottomUpSoftDrop
//!                                                    └─► BottomUpSoftDropTight
//! ```
//!
//! [`EventProcessor`] only reads its configuration, so one instance is shared
//! by every rayon worker in [`EventProcessor::process_batch`]. Each worker
//! builds and drops its own merge history per event.

use crate::clustering::ClusterSequence;
use crate::definition::{Algorithm, JetDefinition};
use crate::error::JetError;
use crate::grooming::{Groomer, GroomingSettings};
use crate::io::{Event, ObservableSink};
use crate::jet::{sorted_by_pt, Jet};
use crate::kinematics::FourMomentum;
use crate::substructure::{SubstructureSettings, SubstructureValues};
use crate::JetResult;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Events between two progress messages in batch processing
pub const PROGRESS_INTERVAL: usize = 10_000;

// ═══════════════════════════════════════════════════════════════════════════════
// ANALYSIS STEPS AND VARIANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// How far down the chain an analysis runs
///
/// Steps are cumulative: each one includes everything before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStep {
    /// Step 3: ungroomed and trimmed jets
    Reconstruct,
    /// Step 4: every grooming variant
    Groom,
    /// Step 5: substructure of every variant
    #[default]
    Substructure,
}

impl AnalysisStep {
    /// Map the numbered steps of the analysis; 0 means "all steps"
    pub fn from_number(step: u8) -> JetResult<Self> {
        match step {
            0 | 5 => Ok(AnalysisStep::Substructure),
            3 => Ok(AnalysisStep::Reconstruct),
            4 => Ok(AnalysisStep::Groom),
            other => Err(JetError::InvalidParameter(format!(
                "analysis step must be 0, 3, 4 or 5, got {}",
                other
            ))),
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            AnalysisStep::Reconstruct => 3,
            AnalysisStep::Groom => 4,
            AnalysisStep::Substructure => 5,
        }
    }
}

/// One version of a jet: ungroomed or one of the grooming outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Ungroomed,
    Trimmed,
    Pruned,
    SoftDrop,
    RecursiveSoftDrop,
    BottomUpSoftDrop,
    BottomUpSoftDropTight,
}

impl Variant {
    pub const ALL: [Variant; 7] = [
        Variant::Ungroomed,
        Variant::Trimmed,
        Variant::Pruned,
        Variant::SoftDrop,
        Variant::RecursiveSoftDrop,
        Variant::BottomUpSoftDrop,
        Variant::BottomUpSoftDropTight,
    ];

    /// Prefix of the histogram names
    pub fn label(&self) -> &'static str {
        match self {
            Variant::Ungroomed => "Ungroomed",
            Variant::Trimmed => "Trimmed",
            Variant::Pruned => "Pruned",
            Variant::SoftDrop => "SD",
            Variant::RecursiveSoftDrop => "RSD",
            Variant::BottomUpSoftDrop => "BUSD",
            Variant::BottomUpSoftDropTight => "BUSDT",
        }
    }

    /// First step that produces this variant
    pub fn step(&self) -> AnalysisStep {
        match self {
            Variant::Ungroomed | Variant::Trimmed => AnalysisStep::Reconstruct,
            _ => AnalysisStep::Groom,
        }
    }

    /// Groomer for this variant; `None` for the ungroomed jet
    pub fn groomer<'a>(&self, settings: &'a GroomingSettings) -> Option<&'a dyn Groomer> {
        match self {
            Variant::Ungroomed => None,
            Variant::Trimmed => Some(&settings.trimming),
            Variant::Pruned => Some(&settings.pruning),
            Variant::SoftDrop => Some(&settings.soft_drop),
            Variant::RecursiveSoftDrop => Some(&settings.recursive_soft_drop),
            Variant::BottomUpSoftDrop => Some(&settings.bottom_up),
            Variant::BottomUpSoftDropTight => Some(&settings.bottom_up_tight),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Complete analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub jet: JetDefinition,
    pub grooming: GroomingSettings,
    pub substructure: SubstructureSettings,
    pub variants: Vec<Variant>,
    /// Number of leading jets processed per event
    pub max_jets: usize,
    /// Mass is only recorded above this jet p_T (GeV)
    pub mass_pt_threshold: f64,
    /// D2 and tau32 are only recorded above this jet p_T (GeV)
    pub substructure_pt_threshold: f64,
    pub step: AnalysisStep,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            jet: JetDefinition::unchecked(Algorithm::AntiKt, 1.0),
            grooming: GroomingSettings::default(),
            substructure: SubstructureSettings::default(),
            variants: Variant::ALL.to_vec(),
            max_jets: 1,
            mass_pt_threshold: 400.0,
            substructure_pt_threshold: 400.0,
            step: AnalysisStep::Substructure,
        }
    }
}

impl AnalysisConfig {
    /// Load and validate a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> JetResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        log::info!("Loaded analysis configuration from {:?}", path);
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> JetResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> JetResult<()> {
        self.jet.validate()?;
        self.grooming.validate()?;
        self.substructure.validate()?;
        if self.max_jets == 0 {
            return Err(JetError::InvalidParameter(
                "max_jets must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("mass_pt_threshold", self.mass_pt_threshold),
            ("substructure_pt_threshold", self.substructure_pt_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(JetError::InvalidParameter(format!(
                    "{name} must be non-negative and finite, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Configured variants that the selected step produces, in order
    pub fn active_variants(&self) -> Vec<Variant> {
        let mut active: Vec<Variant> = self
            .variants
            .iter()
            .copied()
            .filter(|variant| variant.step() <= self.step)
            .collect();
        active.sort();
        active.dedup();
        active
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Kinematics and substructure of one jet variant
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VariantObservables {
    pub pt: f64,
    pub eta: f64,
    pub phi: f64,
    pub mass: f64,
    pub n_constituents: usize,
    pub d2: Option<f64>,
    pub tau32: Option<f64>,
}

impl VariantObservables {
    /// Kinematics only; an empty jet gives all zeros
    pub fn kinematics(jet: &Jet) -> Self {
        if jet.is_empty() {
            return Self::default();
        }
        Self {
            pt: jet.pt(),
            eta: jet.eta(),
            phi: jet.phi(),
            mass: jet.mass(),
            n_constituents: jet.n_constituents(),
            d2: None,
            tau32: None,
        }
    }

    pub fn with_substructure(mut self, values: SubstructureValues) -> Self {
        self.d2 = values.d2;
        self.tau32 = values.tau32;
        self
    }
}

/// Every requested variant of one clustered jet
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JetObservables {
    pub variants: BTreeMap<Variant, VariantObservables>,
}

impl JetObservables {
    pub fn get(&self, variant: Variant) -> Option<&VariantObservables> {
        self.variants.get(&variant)
    }
}

/// Output of one event
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventResult {
    /// Jets by decreasing ungroomed p_T
    pub jets: Vec<JetObservables>,
    /// Input particles that failed validation
    pub rejected: usize,
}

impl EventResult {
    pub fn leading(&self) -> Option<&JetObservables> {
        self.jets.first()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT PROCESSOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Stateless per-event driver
#[derive(Debug, Clone)]
pub struct EventProcessor {
    config: AnalysisConfig,
    variants: Vec<Variant>,
}

impl EventProcessor {
    pub fn new(mut config: AnalysisConfig) -> JetResult<Self> {
        config.validate()?;
        config.substructure = config.substructure.with_jet_radius(config.jet.radius());
        let variants = config.active_variants();
        log::debug!(
            "Event processor: {} at step {}, variants {:?}",
            config.jet.description(),
            config.step.number(),
            variants
        );
        Ok(Self { config, variants })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    /// Cluster, groom and measure one event
    pub fn process(&self, particles: &[FourMomentum]) -> EventResult {
        let sequence = ClusterSequence::new(particles, &self.config.jet);
        let mut jets = sorted_by_pt(sequence.default_jets());
        jets.truncate(self.config.max_jets);

        let with_substructure = self.config.step >= AnalysisStep::Substructure;
        let observables = jets
            .iter()
            .map(|jet| {
                let variants = self
                    .variants
                    .iter()
                    .map(|variant| {
                        let groomed = match variant.groomer(&self.config.grooming) {
                            Some(groomer) => groomer.groom(jet, sequence.history()),
                            None => jet.clone(),
                        };
                        let mut values = VariantObservables::kinematics(&groomed);
                        if with_substructure {
                            values = values.with_substructure(self.config.substructure.compute(&groomed));
                        }
                        (*variant, values)
                    })
                    .collect();
                JetObservables { variants }
            })
            .collect();

        EventResult {
            jets: observables,
            rejected: sequence.rejected().len(),
        }
    }

    /// Process events in parallel; results keep the input order
    pub fn process_batch(&self, events: &[Event]) -> Vec<EventResult> {
        let done = AtomicUsize::new(0);
        let results: Vec<EventResult> = events
            .par_iter()
            .map(|event| {
                let result = self.process(&event.particles);
                let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                if n % PROGRESS_INTERVAL == 0 {
                    log::info!("Processed {} / {} events", n, events.len());
                }
                result
            })
            .collect();

        let rejected: usize = results.iter().map(|r| r.rejected).sum();
        if rejected > 0 {
            log::warn!("{} particles rejected across {} events", rejected, events.len());
        }
        results
    }

    /// Record the leading jet's observables, following the analysis naming
    ///
    /// | Name                  | Weight       | Condition                    |
    /// |-----------------------|--------------|------------------------------|
    /// | `<Label>_pt`          | event weight | always                       |
    /// | `<Label>_pt_noweight` | 1            | ungroomed and trimmed only   |
    /// | `<Label>_mass`        | event weight | p_T > mass threshold         |
    /// | `<Label>_D2`          | event weight | p_T > substructure threshold |
    /// | `<Label>_Tau32`       | event weight | p_T > substructure threshold |
    pub fn record(&self, result: &EventResult, weight: f64, sink: &mut dyn ObservableSink) {
        let Some(leading) = result.leading() else {
            return;
        };
        for (variant, values) in &leading.variants {
            let label = variant.label();
            sink.record(&format!("{label}_pt"), values.pt, weight);
            if variant.step() == AnalysisStep::Reconstruct {
                sink.record(&format!("{label}_pt_noweight"), values.pt, 1.0);
            }
            if values.pt > self.config.mass_pt_threshold {
                sink.record(&format!("{label}_mass"), values.mass, weight);
            }
            if values.pt > self.config.substructure_pt_threshold {
                if let Some(d2) = values.d2 {
                    sink.record(&format!("{label}_D2"), d2, weight);
                }
                if let Some(tau32) = values.tau32 {
                    sink.record(&format!("{label}_Tau32"), tau32, weight);
                }
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::HistogramBook;

    fn p(pt: f64, eta: f64, phi: f64) -> FourMomentum {
        FourMomentum::from_pt_eta_phi_m(pt, eta, phi, 0.0)
    }

    fn boosted_event() -> Vec<FourMomentum> {
        vec![
            p(500.0, 0.0, 0.0),
            p(50.0, 0.05, 0.05),
            p(10.0, 1.5, 1.5),
            p(150.0, 0.3, 0.2),
            p(2.0, -0.5, 0.6),
        ]
    }

    #[test]
    fn test_step_numbers() {
        assert_eq!(AnalysisStep::from_number(0).unwrap(), AnalysisStep::Substructure);
        assert_eq!(AnalysisStep::from_number(3).unwrap(), AnalysisStep::Reconstruct);
        assert_eq!(AnalysisStep::from_number(4).unwrap().number(), 4);
        assert!(AnalysisStep::from_number(2).is_err());
        assert!(AnalysisStep::from_number(6).is_err());
    }

    #[test]
    fn test_active_variants_follow_step() {
        let config = AnalysisConfig {
            step: AnalysisStep::Reconstruct,
            ..AnalysisConfig::default()
        };
        assert_eq!(config.active_variants(), vec![Variant::Ungroomed, Variant::Trimmed]);
        assert_eq!(AnalysisConfig::default().active_variants().len(), 7);
    }

    #[test]
    fn test_nsubjettiness_normalised_by_jet_radius() {
        let config = AnalysisConfig::from_json_str(
            r#"{"jet":{"algorithm":"anti_kt","radius":0.4}}"#,
        )
        .unwrap();
        let processor = EventProcessor::new(config).unwrap();
        assert_eq!(processor.config().substructure.nsub_r0, Some(0.4));
        assert_eq!(processor.config().substructure.nsubjettiness(2).r0, 0.4);

        let pinned = AnalysisConfig::from_json_str(
            r#"{"jet":{"algorithm":"anti_kt","radius":0.4},"substructure":{"nsub_r0":1.0}}"#,
        )
        .unwrap();
        let processor = EventProcessor::new(pinned).unwrap();
        assert_eq!(processor.config().substructure.nsub_r0, Some(1.0));
    }

    #[test]
    fn test_config_from_json_defaults_and_validation() {
        let config = AnalysisConfig::from_json_str(
            r#"{"jet":{"algorithm":"anti_kt","radius":0.8},"max_jets":2}"#,
        )
        .unwrap();
        assert_eq!(config.jet.radius(), 0.8);
        assert_eq!(config.max_jets, 2);
        assert_eq!(config.mass_pt_threshold, 400.0);

        assert!(AnalysisConfig::from_json_str(r#"{"jet":{"algorithm":"kt","radius":-1.0}}"#).is_err());
        assert!(AnalysisConfig::from_json_str(r#"{"grooming":{"soft_drop":{"z_cut":-0.5}}}"#).is_err());
        assert!(AnalysisConfig::from_json_str("not json").is_err());
    }

    #[test]
    fn test_process_leading_jet() {
        let processor = EventProcessor::new(AnalysisConfig::default()).unwrap();
        let result = processor.process(&boosted_event());
        assert_eq!(result.jets.len(), 1);
        assert_eq!(result.rejected, 0);

        let leading = result.leading().unwrap();
        assert_eq!(leading.variants.len(), 7);
        let ungroomed = leading.get(Variant::Ungroomed).unwrap();
        assert!(ungroomed.pt > 600.0);
        assert!(ungroomed.d2.is_some());
        for variant in [Variant::Trimmed, Variant::Pruned] {
            let groomed = leading.get(variant).unwrap();
            assert!(groomed.pt <= ungroomed.pt + 1e-9);
            assert!(groomed.n_constituents <= ungroomed.n_constituents);
        }
    }

    #[test]
    fn test_reconstruct_step_skips_substructure() {
        let config = AnalysisConfig {
            step: AnalysisStep::Reconstruct,
            ..AnalysisConfig::default()
        };
        let processor = EventProcessor::new(config).unwrap();
        let result = processor.process(&boosted_event());
        let leading = result.leading().unwrap();
        assert_eq!(leading.variants.len(), 2);
        assert!(leading.get(Variant::Ungroomed).unwrap().d2.is_none());
    }

    #[test]
    fn test_rejected_particles_counted() {
        let processor = EventProcessor::new(AnalysisConfig::default()).unwrap();
        let mut particles = boosted_event();
        particles.push(FourMomentum::new(0.0, 0.0, 5.0, 5.0));
        particles.push(FourMomentum::new(f64::INFINITY, 0.0, 0.0, 1.0));
        let result = processor.process(&particles);
        assert_eq!(result.rejected, 2);
        assert_eq!(result.jets.len(), 1);
    }

    #[test]
    fn test_batch_matches_sequential() {
        let processor = EventProcessor::new(AnalysisConfig::default()).unwrap();
        let events: Vec<Event> = (0..8)
            .map(|i| Event {
                weight: 1.0 + i as f64,
                particles: boosted_event()
                    .into_iter()
                    .map(|particle| {
                        FourMomentum::from_pt_eta_phi_m(
                            particle.pt() * (1.0 + 0.1 * i as f64),
                            particle.eta(),
                            particle.phi(),
                            0.0,
                        )
                    })
                    .collect(),
            })
            .collect();
        let batch = processor.process_batch(&events);
        assert_eq!(batch.len(), events.len());
        for (event, result) in events.iter().zip(&batch) {
            assert_eq!(*result, processor.process(&event.particles));
        }
    }

    #[test]
    fn test_record_names_and_thresholds() {
        let processor = EventProcessor::new(AnalysisConfig::default()).unwrap();
        let mut book = HistogramBook::new();

        let hard = processor.process(&boosted_event());
        processor.record(&hard, 2.0, &mut book);
        assert!(book.get("Ungroomed_pt").is_some());
        assert!(book.get("Ungroomed_pt_noweight").is_some());
        assert!(book.get("Ungroomed_mass").is_some());
        assert!(book.get("Ungroomed_D2").is_some());
        assert!(book.get("SD_pt_noweight").is_none());
        assert!((book.get("Ungroomed_pt").unwrap().sum_weights() - 2.0).abs() < 1e-12);
        assert!((book.get("Ungroomed_pt_noweight").unwrap().sum_weights() - 1.0).abs() < 1e-12);

        // A 100 GeV jet fills p_T only
        let mut soft_book = HistogramBook::new();
        let soft = processor.process(&[p(80.0, 0.0, 0.0), p(20.0, 0.1, 0.1)]);
        processor.record(&soft, 1.0, &mut soft_book);
        assert!(soft_book.get("Ungroomed_pt").is_some());
        assert!(soft_book.get("Ungroomed_mass").is_none());
        assert!(soft_book.get("Ungroomed_D2").is_none());
    }

    #[test]
    fn test_empty_event() {
        let processor = EventProcessor::new(AnalysisConfig::default()).unwrap();
        let result = processor.process(&[]);
        assert!(result.jets.is_empty());
        let mut book = HistogramBook::new();
        processor.record(&result, 1.0, &mut book);
        assert!(book.is_empty());
    }
}
