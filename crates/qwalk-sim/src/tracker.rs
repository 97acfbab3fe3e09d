//! First-discovery bookkeeping per phenotype.
//!
//! Each phenotype of the declared set owns one [`PhenotypeRecord`]. It is
//! open until the walker is first measured on a genotype expressing that
//! phenotype, at which point hitting time, measurement count and mutation
//! count are written once and frozen.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Discovery record of one phenotype; `None` while undiscovered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PhenotypeRecord {
    /// Simulated time of first discovery.
    pub tau: Option<f64>,
    /// Measurements completed before discovery.
    pub measurements: Option<u64>,
    /// Mutations accumulated before discovery.
    pub mutations: Option<u64>,
}

impl PhenotypeRecord {
    /// True once the phenotype has been found.
    pub fn is_discovered(&self) -> bool {
        self.tau.is_some()
    }
}

/// Reported statistics of one phenotype.
///
/// For an open record `tau` is the provisional current simulated time, an
/// upper bound on the eventual hitting time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhenotypeStats {
    /// Hitting time, or the current simulated time while undiscovered.
    pub tau: f64,
    /// Measurement count at discovery.
    pub measurements: Option<u64>,
    /// Mutation count at discovery.
    pub mutations: Option<u64>,
    /// Whether `tau` is final.
    pub discovered: bool,
}

/// Per-phenotype hitting-time tracker.
#[derive(Debug, Clone, Default)]
pub struct HittingTimeTracker {
    records: BTreeMap<String, PhenotypeRecord>,
}

impl HittingTimeTracker {
    /// Open one record per phenotype.
    pub fn new<S: Into<String>>(phenotypes: impl IntoIterator<Item = S>) -> Self {
        Self {
            records: phenotypes
                .into_iter()
                .map(|p| (p.into(), PhenotypeRecord::default()))
                .collect(),
        }
    }

    /// Freeze the record of `phenotype` if it is still open.
    ///
    /// Returns true on first discovery. Already-discovered and undeclared
    /// phenotypes are left untouched.
    pub fn record_if_novel(
        &mut self,
        phenotype: &str,
        simulated_time: f64,
        measurements: u64,
        mutations: u64,
    ) -> bool {
        match self.records.get_mut(phenotype) {
            Some(record) if !record.is_discovered() => {
                *record = PhenotypeRecord {
                    tau: Some(simulated_time),
                    measurements: Some(measurements),
                    mutations: Some(mutations),
                };
                debug!(
                    phenotype,
                    tau = simulated_time,
                    measurements,
                    mutations,
                    "phenotype discovered"
                );
                true
            }
            _ => false,
        }
    }

    /// Apply [`record_if_novel`](Self::record_if_novel) to every phenotype of
    /// one genotype; returns the number of new discoveries.
    pub fn record_genotype(
        &mut self,
        phenotypes: &[String],
        simulated_time: f64,
        measurements: u64,
        mutations: u64,
    ) -> usize {
        phenotypes
            .iter()
            .filter(|p| self.record_if_novel(p, simulated_time, measurements, mutations))
            .count()
    }

    /// The record of `phenotype`, if declared.
    pub fn get(&self, phenotype: &str) -> Option<&PhenotypeRecord> {
        self.records.get(phenotype)
    }

    /// Number of declared phenotypes.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no phenotype is declared.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of discovered phenotypes.
    pub fn discovered_count(&self) -> usize {
        self.records.values().filter(|r| r.is_discovered()).count()
    }

    /// True once every declared phenotype has been found.
    pub fn all_discovered(&self) -> bool {
        self.records.values().all(PhenotypeRecord::is_discovered)
    }

    /// Statistics for every declared phenotype, with open records reporting
    /// `current_time` as their provisional hitting time.
    pub fn snapshot(&self, current_time: f64) -> BTreeMap<String, PhenotypeStats> {
        self.records
            .iter()
            .map(|(name, r)| {
                let stats = PhenotypeStats {
                    tau: r.tau.unwrap_or(current_time),
                    measurements: r.measurements,
                    mutations: r.mutations,
                    discovered: r.is_discovered(),
                };
                (name.clone(), stats)
            })
            .collect()
    }
}
