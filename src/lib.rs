//! # jetgroom
//!
//! Sequential-recombination jet clustering, jet grooming and jet substructure
//! for collider events.
//!
//! ## Features
//! - Generalised-kt clustering: anti-kt, kt and Cambridge/Aachen
//! - Naive, nearest-neighbour and tiled strategies with identical results
//! - Arena-based merge history with exclusive subjet access
//! - **Five groomers**: trimming, pruning, soft drop, recursive soft drop,
//!   bottom-up soft drop
//! - **Substructure**: D2 from energy correlators, tau32 from N-subjettiness
//! - Parallel event processing via rayon
//!
//! ## Architecture
//!
//! ```text
//! Four-momenta → ClusterSequence → (Jet, MergeHistory) → Groomer → groomed Jet
//!                      │                                              │
//!         ┌────────────┼────────────┐                     ┌───────────┴──────────┐
//!       Naive   NearestNeighbour   Tiled                ECF → D2        τ_N → tau32
//! ```
//!
//! ## Example
//!
//! ```
//! use jetgroom::prelude::*;
//!
//! let particles = vec![
//!     FourMomentum::from_pt_eta_phi_m(500.0, 0.0, 0.0, 0.0),
//!     FourMomentum::from_pt_eta_phi_m(50.0, 0.05, 0.05, 0.0),
//!     FourMomentum::from_pt_eta_phi_m(10.0, 1.5, 1.5, 0.0),
//! ];
//! let definition = JetDefinition::anti_kt(1.0).unwrap();
//! let sequence = ClusterSequence::new(&particles, &definition);
//! let jets = sorted_by_pt(sequence.jets());
//! assert_eq!(jets.len(), 2);
//!
//! let groomed = SoftDrop::default().groom(&jets[0], sequence.history());
//! assert!(groomed.pt() <= jets[0].pt());
//! ```

// Core primitives
pub mod error;
pub mod kinematics;
pub mod history;
pub mod definition;
pub mod jet;

// Algorithms
pub mod clustering;
pub mod grooming;
pub mod substructure;

// Event processing
pub mod io;
pub mod pipeline;


pub use error::JetError;
pub use kinematics::FourMomentum;
pub use history::{ClusterNode, HistoryStep, MergeHistory, NodeId};
pub use definition::{Algorithm, ClusterStrategy, JetDefinition, RecombinationScheme, MAX_ALLOWABLE_R};
pub use jet::{match_jet, pt_response, sorted_by_pt, Jet};
pub use clustering::{cluster_sorted, drop_softer, ClusterSequence, MergeDecision, MergeVeto};
pub use grooming::{
    BottomUpSoftDrop,
    Groomer,
    Grooming,
    GroomingSettings,
    Pruner,
    RecursiveSoftDrop,
    SoftDrop,
    SoftDropCondition,
    Trimmer,
};
pub use substructure::{
    AxesMode,
    EnergyCorrelator,
    Nsubjettiness,
    SubstructureSettings,
    SubstructureValues,
};
pub use io::{Event, EventSource, HistogramBook, JsonLinesSource, ObservableSink, SyntheticSource};
pub use pipeline::{
    AnalysisConfig,
    AnalysisStep,
    EventProcessor,
    EventResult,
    JetObservables,
    Variant,
    VariantObservables,
};

/// Result type for jet operations
pub type JetResult<T> = Result<T, JetError>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        // Primitives
        FourMomentum,
        Jet,
        MergeHistory,
        NodeId,
        sorted_by_pt,

        // Clustering
        Algorithm,
        ClusterSequence,
        ClusterStrategy,
        JetDefinition,

        // Grooming
        Groomer,
        Grooming,
        SoftDrop,
        Trimmer,

        // Substructure
        EnergyCorrelator,
        Nsubjettiness,

        // Pipeline
        AnalysisConfig,
        EventProcessor,

        // Result type
        JetResult,
        JetError,
    };
}
