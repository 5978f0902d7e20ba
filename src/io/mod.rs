//! # Collaborator Seams
//!
//! The engine itself reads and writes nothing. Events come in through an
//! [`EventSource`] and observables go out through an [`ObservableSink`]:
//!
//! ```text
//!   EventSource ──► Event { weight, particles } ──► EventProcessor
//!                                                        │
//!   ObservableSink ◄── record(name, value, weight) ◄─────┘
//! ```
//!
//! Provided implementations: [`JsonLinesSource`] (one event per line),
//! [`SyntheticSource`] (random boosted-jet events) and [`HistogramBook`]
//! (in-memory weighted histograms).

mod histogram;
mod source;

pub use histogram::{Binning, Histogram, HistogramBook};
pub use source::{JsonLinesSource, ParticleRecord, SyntheticSource};

use crate::kinematics::FourMomentum;
use crate::JetResult;
use serde::{Deserialize, Serialize};

/// One collision event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub weight: f64,
    pub particles: Vec<FourMomentum>,
}

impl Event {
    pub fn unweighted(particles: Vec<FourMomentum>) -> Self {
        Self {
            weight: 1.0,
            particles,
        }
    }
}

/// Anything that yields events one at a time
pub trait EventSource {
    /// Next event, `Ok(None)` once the source is exhausted
    fn next_event(&mut self) -> JetResult<Option<Event>>;

    /// Drain the source into memory
    fn collect_events(&mut self) -> JetResult<Vec<Event>> {
        let mut events = Vec::new();
        while let Some(event) = self.next_event()? {
            events.push(event);
        }
        Ok(events)
    }
}

/// Destination for named scalar observables
pub trait ObservableSink {
    fn record(&mut self, name: &str, value: f64, weight: f64);
}

impl ObservableSink for Vec<(String, f64, f64)> {
    fn record(&mut self, name: &str, value: f64, weight: f64) {
        self.push((name.to_string(), value, weight));
    }
}
