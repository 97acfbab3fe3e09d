//! `qwalk-sim` — measured continuous-time quantum walks on genotype spaces.
//!
//! A walker starts on one genotype and evolves under `exp(-i t H)` with
//! `H = -γ·A` (adjacency or Laplacian of the genotype graph). At
//! exponentially distributed times it is measured, collapsing onto a single
//! genotype. The first time each phenotype is observed is recorded as its
//! hitting time, together with the measurement and mutation counts spent
//! to get there.
//!
//! - [`hamiltonian`] builds the sparse generator
//! - [`propagator`] applies its exponential to a state vector
//! - [`measurement`] draws waiting times and Born-rule collapses
//! - [`tracker`] keeps per-phenotype discovery records
//! - [`simulation`] runs the loop and emits checkpoints to a
//!   [`persistence::CheckpointSink`]
//!
//! # Quick start
//!
//! ```rust
//! use qwalk_sim::{Genotype, GenotypeSpace, MemorySink, Simulation, SimulationConfig};
//!
//! // Path 0 – 1 – 2, phenotype "p" only on the far end.
//! let space = GenotypeSpace::from_parts(
//!     "path",
//!     [
//!         Genotype::new("AA", ["a"]),
//!         Genotype::new("AB", ["a"]),
//!         Genotype::new("BB", ["p"]),
//!     ],
//!     [(0, 1), (1, 2)],
//! ).unwrap();
//!
//! let config = SimulationConfig {
//!     max_simulated_time: 50.0,
//!     ..Default::default()
//! }
//! .with_seed(42);
//!
//! let report = Simulation::new(&space, config).unwrap().run(&MemorySink::new()).unwrap();
//! assert!(report.summary.phenotypes["a"].discovered);
//! ```

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod genotype;
pub mod hamiltonian;
pub mod measurement;
pub mod persistence;
pub mod propagator;
pub mod simulation;
pub mod tracker;

pub use checkpoint::{CheckpointSnapshot, Clock, Revision, SimulationId, SystemClock};
pub use config::SimulationConfig;
pub use error::{ErrorKind, SimError, SimResult};
pub use genotype::{Genotype, GenotypeSpace};
pub use hamiltonian::{MatrixKind, SparseMatrix, build_hamiltonian};
pub use measurement::MeasurementSampler;
pub use persistence::{CheckpointSink, JsonStore, MemorySink};
pub use propagator::{Propagator, TaylorPropagator, evolve};
pub use simulation::{Simulation, SimulationReport, StopReason, TrajectoryStep, WalkState};
pub use tracker::{HittingTimeTracker, PhenotypeRecord, PhenotypeStats};
