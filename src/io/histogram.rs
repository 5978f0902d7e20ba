//! Weighted 1-D histograms and a named collection of them

use super::ObservableSink;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Uniform binning over [min, max)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Binning {
    pub n_bins: usize,
    pub min: f64,
    pub max: f64,
}

impl Binning {
    pub const PT: Binning = Binning { n_bins: 215, min: 50.0, max: 2200.0 };
    pub const MASS: Binning = Binning { n_bins: 99, min: 10.0, max: 1000.0 };
    pub const D2: Binning = Binning { n_bins: 20, min: 0.0, max: 5.0 };
    pub const TAU32: Binning = Binning { n_bins: 20, min: 0.0, max: 1.0 };
    pub const FALLBACK: Binning = Binning { n_bins: 100, min: 0.0, max: 1000.0 };

    /// Binning picked from the observable name, e.g. `SD_mass` → [`Binning::MASS`]
    pub fn for_observable(name: &str) -> Binning {
        if name.ends_with("_pt") || name.ends_with("_pt_noweight") {
            Binning::PT
        } else if name.ends_with("_mass") {
            Binning::MASS
        } else if name.ends_with("_D2") {
            Binning::D2
        } else if name.ends_with("_Tau32") {
            Binning::TAU32
        } else {
            Binning::FALLBACK
        }
    }
}

/// Weighted histogram with under- and overflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// Bin edges
    pub edges: Vec<f64>,
    /// Sum of weights per bin
    pub counts: Vec<f64>,
    /// Number of fills
    pub entries: u64,
    pub underflow: f64,
    pub overflow: f64,
    sum_w: f64,
    sum_wx: f64,
    sum_wx2: f64,
}

impl Histogram {
    pub fn new(binning: Binning) -> Self {
        let n_bins = binning.n_bins.max(1);
        let step = (binning.max - binning.min) / n_bins as f64;
        let edges: Vec<f64> = (0..=n_bins).map(|i| binning.min + i as f64 * step).collect();
        Self {
            edges,
            counts: vec![0.0; n_bins],
            entries: 0,
            underflow: 0.0,
            overflow: 0.0,
            sum_w: 0.0,
            sum_wx: 0.0,
            sum_wx2: 0.0,
        }
    }

    pub fn fill(&mut self, value: f64, weight: f64) {
        if !value.is_finite() || !weight.is_finite() {
            log::debug!("Ignoring non-finite fill ({}, {})", value, weight);
            return;
        }
        self.entries += 1;
        self.sum_w += weight;
        self.sum_wx += weight * value;
        self.sum_wx2 += weight * value * value;

        let lo = self.edges[0];
        let hi = self.edges[self.edges.len() - 1];
        if value < lo {
            self.underflow += weight;
            return;
        }
        if value >= hi {
            self.overflow += weight;
            return;
        }

        let bin = self.edges.partition_point(|&e| e <= value) - 1;
        if let Some(count) = self.counts.get_mut(bin) {
            *count += weight;
        }
    }

    /// Total weight, including under- and overflow
    pub fn sum_weights(&self) -> f64 {
        self.sum_w
    }

    /// Weighted mean of all filled values
    pub fn mean(&self) -> f64 {
        if self.sum_w != 0.0 {
            self.sum_wx / self.sum_w
        } else {
            0.0
        }
    }

    pub fn variance(&self) -> f64 {
        if self.entries > 1 && self.sum_w != 0.0 {
            let mean = self.mean();
            (self.sum_wx2 / self.sum_w - mean * mean).max(0.0)
        } else {
            0.0
        }
    }

    pub fn std(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Add another histogram with identical binning
    pub fn merge(&mut self, other: &Histogram) {
        if self.edges != other.edges {
            log::warn!("Refusing to merge histograms with different binning");
            return;
        }
        for (mine, theirs) in self.counts.iter_mut().zip(&other.counts) {
            *mine += theirs;
        }
        self.entries += other.entries;
        self.underflow += other.underflow;
        self.overflow += other.overflow;
        self.sum_w += other.sum_w;
        self.sum_wx += other.sum_wx;
        self.sum_wx2 += other.sum_wx2;
    }
}

/// Histograms booked on first use, keyed by observable name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistogramBook {
    histograms: BTreeMap<String, Histogram>,
}

impl HistogramBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Histogram> {
        self.histograms.get(name)
    }

    pub fn len(&self) -> usize {
        self.histograms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histograms.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.histograms.keys().map(String::as_str)
    }

    pub fn merge(&mut self, other: &HistogramBook) {
        for (name, histogram) in &other.histograms {
            match self.histograms.get_mut(name) {
                Some(existing) => existing.merge(histogram),
                None => {
                    self.histograms.insert(name.clone(), histogram.clone());
                }
            }
        }
    }

    pub fn to_json(&self) -> crate::JetResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl ObservableSink for HistogramBook {
    fn record(&mut self, name: &str, value: f64, weight: f64) {
        self.histograms
            .entry(name.to_string())
            .or_insert_with(|| Histogram::new(Binning::for_observable(name)))
            .fill(value, weight);
    }
}
