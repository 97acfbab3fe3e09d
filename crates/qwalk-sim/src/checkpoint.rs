//! Checkpoint snapshots and their wall-clock schedule.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SimulationConfig;
use crate::tracker::PhenotypeStats;

/// Unique identifier of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SimulationId(pub Uuid);

impl SimulationId {
    /// Create a new random simulation ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a simulation ID from a string.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for SimulationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SimulationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque revision token returned by a sink.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Revision(pub String);

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the walk started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialGenotype {
    /// Genotype index.
    pub index: usize,
    /// Genotype sequence.
    pub sequence: String,
    /// Primary phenotype of the initial genotype.
    pub phenotype: String,
}

/// Aggregate run statistics handed to a checkpoint sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointSnapshot {
    /// Run identity; sinks overwrite per id.
    pub simulation_id: SimulationId,
    /// Name of the genotype space.
    pub space: String,
    /// 1-based checkpoint number; 0 for end-of-run summaries.
    pub checkpoint: u64,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When this snapshot was assembled.
    pub created_at: DateTime<Utc>,
    /// Starting genotype.
    pub initial: InitialGenotype,
    /// Configuration echo.
    pub config: SimulationConfig,
    /// Measurements performed so far.
    pub total_measurements: u64,
    /// Measurements that moved the walker.
    pub total_mutations: u64,
    /// Wall-clock seconds since the run started.
    pub computing_time_secs: f64,
    /// Simulated time reached.
    pub simulated_time: f64,
    /// Per-phenotype statistics.
    pub phenotypes: BTreeMap<String, PhenotypeStats>,
}

impl CheckpointSnapshot {
    /// Number of phenotypes discovered so far.
    pub fn discovered(&self) -> usize {
        self.phenotypes.values().filter(|s| s.discovered).count()
    }
}

/// Source of elapsed wall-clock time.
pub trait Clock {
    /// Time since the clock started.
    fn elapsed(&self) -> Duration;
}

/// Monotonic clock started at construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    /// Start a clock now.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::start()
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Fixed wall-clock schedule `first + k · interval`, `k = 0, 1, ...`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckpointSchedule {
    first_secs: f64,
    interval_secs: f64,
    next: u64,
}

impl CheckpointSchedule {
    /// Schedule starting at `first_secs`.
    pub fn new(first_secs: f64, interval_secs: f64) -> Self {
        Self {
            first_secs,
            interval_secs,
            next: 0,
        }
    }

    /// Offset of the next unreached boundary.
    pub fn next_due_secs(&self) -> f64 {
        self.first_secs + self.next as f64 * self.interval_secs
    }

    /// True if `elapsed_secs` has crossed the next boundary.
    pub fn is_due(&self, elapsed_secs: f64) -> bool {
        elapsed_secs >= self.next_due_secs()
    }

    /// Move to the following boundary; returns the 1-based checkpoint number.
    pub fn advance(&mut self) -> u64 {
        self.next += 1;
        self.next
    }

    /// Boundaries passed so far.
    pub fn passed(&self) -> u64 {
        self.next
    }
}
