//! Telemetry Module
//!
//! Hit-rate reporting and effectiveness classification.

use std::fmt;

use serde::Serialize;

use crate::cache::{hit_rate, Cache};
use crate::config::{DEFAULT_EXCELLENT_THRESHOLD, DEFAULT_GOOD_THRESHOLD};

// == Efficiency ==
/// How well the cache is shielding the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Efficiency {
    #[serde(rename = "Excellent")]
    Excellent,
    #[serde(rename = "Good")]
    Good,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
}

impl Efficiency {
    pub fn label(&self) -> &'static str {
        match self {
            Efficiency::Excellent => "Excellent",
            Efficiency::Good => "Good",
            Efficiency::NeedsImprovement => "Needs Improvement",
        }
    }
}

impl fmt::Display for Efficiency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// == Thresholds ==
/// Hit-rate cut-offs, as fractions in `0.0..=1.0`.
///
/// A rate strictly above `excellent` is Excellent, strictly above `good` is Good.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EfficiencyThresholds {
    pub excellent: f64,
    pub good: f64,
}

impl EfficiencyThresholds {
    pub fn new(excellent: f64, good: f64) -> Self {
        Self { excellent, good }
    }

    pub fn classify(&self, hit_rate: f64) -> Efficiency {
        if hit_rate > self.excellent {
            Efficiency::Excellent
        } else if hit_rate > self.good {
            Efficiency::Good
        } else {
            Efficiency::NeedsImprovement
        }
    }
}

impl Default for EfficiencyThresholds {
    fn default() -> Self {
        Self::new(DEFAULT_EXCELLENT_THRESHOLD, DEFAULT_GOOD_THRESHOLD)
    }
}

// == Performance Report ==
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReport {
    pub key_count: usize,
    pub hits: u64,
    pub misses: u64,
    /// hits / (hits + misses)
    pub hit_rate: f64,
    pub efficiency: Efficiency,
}

impl Cache {
    /// Summarizes cache effectiveness from the store's counters.
    pub fn performance(&self) -> PerformanceReport {
        let stats = self.stats();
        let rate = hit_rate(stats.hits, stats.misses);
        PerformanceReport {
            key_count: stats.key_count,
            hits: stats.hits,
            misses: stats.misses,
            hit_rate: rate,
            efficiency: self.thresholds().classify(rate),
        }
    }
}
