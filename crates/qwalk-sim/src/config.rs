//! Simulation parameters.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::genotype::GenotypeSpace;
use crate::hamiltonian::MatrixKind;

/// Parameters of one measured quantum-walk run.
///
/// All times are in simulation units except the `*_secs` fields, which are
/// wall-clock seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Mutation rate γ scaling the generator.
    pub gamma: f64,

    /// Graph matrix the generator is built from.
    pub matrix_kind: MatrixKind,

    /// Index of the starting genotype.
    pub initial_genotype: usize,

    /// Phenotypes to track; every phenotype of the space when `None`.
    pub phenotypes: Option<Vec<String>>,

    /// Simulated-time budget.
    pub max_simulated_time: f64,

    /// Mean of the exponential waiting time between measurements.
    pub measurement_rate: f64,

    /// Wall-clock budget.
    pub max_execution_time_secs: f64,

    /// Wall-clock delay before the first checkpoint.
    pub first_checkpoint_secs: f64,

    /// Wall-clock spacing of subsequent checkpoints.
    pub checkpoint_interval_secs: f64,

    /// RNG seed; OS entropy when `None`.
    pub seed: Option<u64>,

    /// Keep every measurement outcome in the run report.
    pub record_trajectory: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            gamma: 1.0,
            matrix_kind: MatrixKind::Laplacian,
            initial_genotype: 0,
            phenotypes: None,
            max_simulated_time: 100.0,
            measurement_rate: 1.0,
            max_execution_time_secs: 86_400.0, // 24 hours
            first_checkpoint_secs: 60.0,
            checkpoint_interval_secs: 600.0,
            seed: None,
            record_trajectory: false,
        }
    }
}

impl SimulationConfig {
    /// Set the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the tracked phenotypes.
    #[must_use]
    pub fn with_phenotypes<S: Into<String>>(mut self, phenotypes: impl IntoIterator<Item = S>) -> Self {
        self.phenotypes = Some(phenotypes.into_iter().map(Into::into).collect());
        self
    }

    /// Check every parameter against `space`.
    pub fn validate(&self, space: &GenotypeSpace) -> SimResult<()> {
        if space.is_empty() {
            return Err(SimError::EmptyGenotypeSpace);
        }
        positive("gamma", self.gamma)?;
        positive("max_simulated_time", self.max_simulated_time)?;
        positive("measurement_rate", self.measurement_rate)?;
        positive("max_execution_time_secs", self.max_execution_time_secs)?;
        positive("checkpoint_interval_secs", self.checkpoint_interval_secs)?;
        if !(self.first_checkpoint_secs.is_finite() && self.first_checkpoint_secs >= 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "first_checkpoint_secs must be non-negative, got {}",
                self.first_checkpoint_secs
            )));
        }
        if self.initial_genotype >= space.len() {
            return Err(SimError::GenotypeOutOfRange {
                index: self.initial_genotype,
                size: space.len(),
            });
        }
        if let Some(phenotypes) = &self.phenotypes {
            if phenotypes.is_empty() {
                return Err(SimError::InvalidConfig("phenotype set is empty".into()));
            }
            let known = space.phenotype_names();
            if let Some(unknown) = phenotypes.iter().find(|p| known.binary_search(p).is_err()) {
                return Err(SimError::InvalidConfig(format!(
                    "phenotype '{unknown}' is not expressed by any genotype"
                )));
            }
        }
        Ok(())
    }

    /// The phenotype set to track.
    pub fn resolve_phenotypes(&self, space: &GenotypeSpace) -> Vec<String> {
        self.phenotypes
            .clone()
            .unwrap_or_else(|| space.phenotype_names())
    }
}

fn positive(name: &str, value: f64) -> SimResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidConfig(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genotype::Genotype;

    fn space() -> GenotypeSpace {
        GenotypeSpace::from_parts(
            "s",
            [Genotype::new("A", ["x"]), Genotype::new("B", ["y"])],
            [(0, 1)],
        )
        .unwrap()
    }

    #[test]
    fn test_default_is_valid() {
        SimulationConfig::default().validate(&space()).unwrap();
    }

    #[test]
    fn test_rejects_non_positive_rates() {
        let cfg = SimulationConfig {
            gamma: 0.0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(&space()), Err(SimError::InvalidConfig(_))));

        let cfg = SimulationConfig {
            measurement_rate: f64::NAN,
            ..Default::default()
        };
        assert!(cfg.validate(&space()).is_err());

        let cfg = SimulationConfig {
            first_checkpoint_secs: -1.0,
            ..Default::default()
        };
        assert!(cfg.validate(&space()).is_err());
    }

    #[test]
    fn test_first_checkpoint_may_be_zero() {
        let cfg = SimulationConfig {
            first_checkpoint_secs: 0.0,
            ..Default::default()
        };
        assert!(cfg.validate(&space()).is_ok());
    }

    #[test]
    fn test_rejects_initial_out_of_range() {
        let cfg = SimulationConfig {
            initial_genotype: 2,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(&space()),
            Err(SimError::GenotypeOutOfRange { index: 2, size: 2 })
        ));
    }

    #[test]
    fn test_phenotype_set() {
        let cfg = SimulationConfig::default().with_phenotypes(["y"]);
        assert!(cfg.validate(&space()).is_ok());
        assert_eq!(cfg.resolve_phenotypes(&space()), vec!["y"]);

        let cfg = SimulationConfig::default().with_phenotypes(["nope"]);
        assert!(cfg.validate(&space()).is_err());

        let empty: [&str; 0] = [];
        let cfg = SimulationConfig::default().with_phenotypes(empty);
        assert!(cfg.validate(&space()).is_err());

        assert_eq!(
            SimulationConfig::default().resolve_phenotypes(&space()),
            vec!["x", "y"]
        );
    }
}
