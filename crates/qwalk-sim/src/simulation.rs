//! The measured quantum-walk loop.
//!
//! Each iteration, while simulated time and wall-clock budgets last:
//!
//! 1. record phenotypes of the current genotype not seen before;
//! 2. draw a waiting time `T` and advance simulated time;
//! 3. evolve the basis state of the current genotype for `T`;
//! 4. measure, collapsing onto the next genotype;
//! 5. count a mutation if the walker moved;
//! 6. emit a checkpoint if a wall-clock boundary was crossed.
//!
//! Checkpoint failures are logged and skipped; every other error ends the
//! run.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{info, trace, warn};

use crate::checkpoint::{
    CheckpointSchedule, CheckpointSnapshot, Clock, InitialGenotype, SimulationId, SystemClock,
};
use crate::config::SimulationConfig;
use crate::error::SimResult;
use crate::genotype::GenotypeSpace;
use crate::hamiltonian::{SparseMatrix, build_hamiltonian};
use crate::measurement::MeasurementSampler;
use crate::persistence::CheckpointSink;
use crate::propagator::{Propagator, TaylorPropagator, basis_state};
use crate::tracker::HittingTimeTracker;

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Simulated time reached `max_simulated_time`.
    SimulatedTimeReached,
    /// Wall-clock time exceeded `max_execution_time_secs`.
    WallClockExhausted,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::SimulatedTimeReached => write!(f, "simulated time budget reached"),
            StopReason::WallClockExhausted => write!(f, "wall-clock budget exhausted"),
        }
    }
}

/// Walker position and counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WalkState {
    /// Genotype the walker was last measured on.
    pub current: usize,
    /// Simulated time elapsed.
    pub simulated_time: f64,
    /// Completed measurements.
    pub measurements: u64,
    /// Measurements that changed genotype.
    pub mutations: u64,
}

/// One measurement outcome of a recorded trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryStep {
    /// Measurement number; 0 is the initial state.
    pub measurement: u64,
    /// Simulated time of the measurement.
    pub simulated_time: f64,
    /// Genotype observed.
    pub genotype: usize,
    /// Mutations up to and including this measurement.
    pub mutations: u64,
}

impl From<&WalkState> for TrajectoryStep {
    fn from(s: &WalkState) -> Self {
        Self {
            measurement: s.measurements,
            simulated_time: s.simulated_time,
            genotype: s.current,
            mutations: s.mutations,
        }
    }
}

/// End-of-run statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Final statistics, shaped like a checkpoint (`checkpoint == 0`).
    pub summary: CheckpointSnapshot,
    /// Which budget ended the run.
    pub stop_reason: StopReason,
    /// Final walker state.
    pub state: WalkState,
    /// Checkpoints accepted by the sink.
    pub checkpoints_written: u64,
    /// Checkpoints the sink rejected.
    pub checkpoints_failed: u64,
    /// Every measurement outcome, if recording was enabled.
    pub trajectory: Option<Vec<TrajectoryStep>>,
}

/// A configured run over one genotype space.
pub struct Simulation<'a, R = StdRng, C = SystemClock> {
    id: SimulationId,
    space: &'a GenotypeSpace,
    config: SimulationConfig,
    hamiltonian: SparseMatrix,
    propagator: Box<dyn Propagator>,
    sampler: MeasurementSampler<R>,
    clock: C,
    basis: Vec<usize>,
    initial: InitialGenotype,
}

impl<'a> Simulation<'a> {
    /// Validate `config` and build the generator.
    ///
    /// The RNG is seeded from `config.seed` when present.
    pub fn new(space: &'a GenotypeSpace, config: SimulationConfig) -> SimResult<Self> {
        config.validate(space)?;
        let hamiltonian = build_hamiltonian(space, config.gamma, config.matrix_kind)?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let genotype = space.genotype(config.initial_genotype)?;
        let initial = InitialGenotype {
            index: config.initial_genotype,
            sequence: genotype.sequence.clone(),
            phenotype: genotype.primary_phenotype().unwrap_or_default().to_string(),
        };

        Ok(Self {
            id: SimulationId::new(),
            space,
            hamiltonian,
            propagator: Box::new(TaylorPropagator::default()),
            sampler: MeasurementSampler::new(rng),
            clock: SystemClock::start(),
            basis: (0..space.len()).collect(),
            initial,
            config,
        })
    }
}

impl<'a, R: Rng, C: Clock> Simulation<'a, R, C> {
    /// Replace the random number generator.
    pub fn with_rng<R2: Rng>(self, rng: R2) -> Simulation<'a, R2, C> {
        Simulation {
            id: self.id,
            space: self.space,
            config: self.config,
            hamiltonian: self.hamiltonian,
            propagator: self.propagator,
            sampler: MeasurementSampler::new(rng),
            clock: self.clock,
            basis: self.basis,
            initial: self.initial,
        }
    }

    /// Replace the wall clock.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> Simulation<'a, R, C2> {
        Simulation {
            id: self.id,
            space: self.space,
            config: self.config,
            hamiltonian: self.hamiltonian,
            propagator: self.propagator,
            sampler: self.sampler,
            clock,
            basis: self.basis,
            initial: self.initial,
        }
    }

    /// Replace the propagator.
    #[must_use]
    pub fn with_propagator(mut self, propagator: impl Propagator + 'static) -> Self {
        self.propagator = Box::new(propagator);
        self
    }

    /// Use a caller-chosen simulation id.
    #[must_use]
    pub fn with_id(mut self, id: SimulationId) -> Self {
        self.id = id;
        self
    }

    /// Run identity.
    pub fn id(&self) -> SimulationId {
        self.id
    }

    /// The generator matrix.
    pub fn hamiltonian(&self) -> &SparseMatrix {
        &self.hamiltonian
    }

    /// The validated configuration.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Walk until a budget runs out, checkpointing into `sink`.
    pub fn run(mut self, sink: &dyn CheckpointSink) -> SimResult<SimulationReport> {
        let origin = self.clock.elapsed();
        let started_at = Utc::now();
        let dim = self.space.len();

        let mut tracker = HittingTimeTracker::new(self.config.resolve_phenotypes(self.space));
        let mut state = WalkState {
            current: self.config.initial_genotype,
            simulated_time: 0.0,
            measurements: 0,
            mutations: 0,
        };
        let mut schedule = CheckpointSchedule::new(
            self.config.first_checkpoint_secs,
            self.config.checkpoint_interval_secs,
        );
        let mut trajectory = self
            .config
            .record_trajectory
            .then(|| vec![TrajectoryStep::from(&state)]);
        let mut written = 0u64;

        info!(
            id = %self.id,
            space = self.space.name(),
            genotypes = dim,
            phenotypes = tracker.len(),
            initial = state.current,
            "starting simulation"
        );

        let stop_reason = loop {
            if state.simulated_time >= self.config.max_simulated_time {
                break StopReason::SimulatedTimeReached;
            }
            if self.elapsed_secs(origin) > self.config.max_execution_time_secs {
                break StopReason::WallClockExhausted;
            }

            tracker.record_genotype(
                self.space.phenotypes_of(state.current)?,
                state.simulated_time,
                state.measurements,
                state.mutations,
            );

            let wait = self.sampler.sample_wait_time(self.config.measurement_rate)?;
            state.simulated_time += wait;

            let psi = basis_state(state.current, dim)?;
            let evolved = self.propagator.evolve(&self.hamiltonian, &psi, wait)?;
            let next = self.sampler.collapse(&evolved, &self.basis)?;
            state.measurements += 1;
            if next != state.current {
                state.mutations += 1;
            }
            state.current = next;
            trace!(
                measurement = state.measurements,
                t = state.simulated_time,
                genotype = next,
                "measured"
            );
            if let Some(path) = trajectory.as_mut() {
                path.push(TrajectoryStep::from(&state));
            }

            let elapsed = self.elapsed_secs(origin);
            if schedule.is_due(elapsed) {
                let checkpoint = schedule.advance();
                let snapshot =
                    self.snapshot(&tracker, &state, checkpoint, elapsed, started_at);
                match sink.put(snapshot) {
                    Ok(revision) => {
                        written += 1;
                        info!(checkpoint, %revision, "wrote checkpoint");
                    }
                    Err(e) => {
                        warn!(checkpoint, error = %e, "checkpoint failed, continuing");
                    }
                }
            }
        };

        let elapsed = self.elapsed_secs(origin);
        let summary = self.snapshot(&tracker, &state, 0, elapsed, started_at);
        info!(
            id = %self.id,
            reason = %stop_reason,
            measurements = state.measurements,
            mutations = state.mutations,
            simulated_time = state.simulated_time,
            discovered = tracker.discovered_count(),
            complete = tracker.all_discovered(),
            "simulation finished"
        );

        Ok(SimulationReport {
            summary,
            stop_reason,
            state,
            checkpoints_written: written,
            checkpoints_failed: schedule.passed() - written,
            trajectory,
        })
    }

    fn elapsed_secs(&self, origin: std::time::Duration) -> f64 {
        self.clock.elapsed().saturating_sub(origin).as_secs_f64()
    }

    fn snapshot(
        &self,
        tracker: &HittingTimeTracker,
        state: &WalkState,
        checkpoint: u64,
        elapsed_secs: f64,
        started_at: DateTime<Utc>,
    ) -> CheckpointSnapshot {
        CheckpointSnapshot {
            simulation_id: self.id,
            space: self.space.name().to_string(),
            checkpoint,
            started_at,
            created_at: Utc::now(),
            initial: self.initial.clone(),
            config: self.config.clone(),
            total_measurements: state.measurements,
            total_mutations: state.mutations,
            computing_time_secs: elapsed_secs,
            simulated_time: state.simulated_time,
            phenotypes: tracker.snapshot(state.simulated_time),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use crate::genotype::Genotype;
    use crate::persistence::MemorySink;

    fn line(n: usize) -> GenotypeSpace {
        GenotypeSpace::from_parts(
            "line",
            (0..n).map(|i| Genotype::new(format!("G{i}"), [format!("p{i}")])),
            (1..n).map(|i| (i - 1, i)),
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let space = line(3);
        let cfg = SimulationConfig {
            initial_genotype: 5,
            ..Default::default()
        };
        assert!(matches!(
            Simulation::new(&space, cfg),
            Err(SimError::GenotypeOutOfRange { index: 5, size: 3 })
        ));
    }

    #[test]
    fn test_initial_phenotype_recorded_at_time_zero() {
        let space = line(3);
        let cfg = SimulationConfig {
            max_simulated_time: 5.0,
            ..Default::default()
        }
        .with_seed(11);
        let report = Simulation::new(&space, cfg).unwrap().run(&MemorySink::new()).unwrap();

        let p0 = report.summary.phenotypes["p0"];
        assert!(p0.discovered);
        assert_eq!(p0.tau, 0.0);
        assert_eq!(p0.measurements, Some(0));
        assert_eq!(p0.mutations, Some(0));
        assert_eq!(report.stop_reason, StopReason::SimulatedTimeReached);
        assert!(report.state.simulated_time >= 5.0);
    }

    #[test]
    fn test_isolated_genotype_never_moves() {
        let space = GenotypeSpace::from_parts(
            "islands",
            [Genotype::new("A", ["a"]), Genotype::new("B", ["b"])],
            [],
        )
        .unwrap();
        let cfg = SimulationConfig {
            max_simulated_time: 20.0,
            ..Default::default()
        }
        .with_seed(3);
        let report = Simulation::new(&space, cfg).unwrap().run(&MemorySink::new()).unwrap();

        assert_eq!(report.state.current, 0);
        assert_eq!(report.state.mutations, 0);
        assert!(report.state.measurements > 0);
        assert!(!report.summary.phenotypes["b"].discovered);
        assert_eq!(report.summary.phenotypes["b"].tau, report.state.simulated_time);
    }
}
