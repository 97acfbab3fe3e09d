//! Stochastic sampling primitives of the walk.
//!
//! Two draws happen per measurement step:
//!
//! - the waiting time until the next measurement, `T ~ Exp(mean = scale)`;
//! - the Born-rule collapse of the evolved state onto a basis index,
//!   `P(v) = |ψ_v|²`.

use num_complex::Complex64;
use rand::Rng;
use rand_distr::{Distribution, Exp};

use crate::error::{SimError, SimResult};

/// Accepted deviation of the total Born probability from one.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Exponential waiting times and projective collapse over one RNG.
#[derive(Debug, Clone)]
pub struct MeasurementSampler<R> {
    rng: R,
    tolerance: f64,
}

impl<R: Rng> MeasurementSampler<R> {
    /// Create a sampler around `rng`.
    ///
    /// Seeding `rng` makes a whole trajectory reproducible:
    /// ```rust
    /// use rand::SeedableRng;
    /// use qwalk_sim::measurement::MeasurementSampler;
    ///
    /// let mut a = MeasurementSampler::new(rand::rngs::StdRng::seed_from_u64(7));
    /// let mut b = MeasurementSampler::new(rand::rngs::StdRng::seed_from_u64(7));
    /// assert_eq!(a.sample_wait_time(2.0).unwrap(), b.sample_wait_time(2.0).unwrap());
    /// ```
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            tolerance: PROBABILITY_TOLERANCE,
        }
    }

    /// Override the normalization tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Draw a waiting time with mean `scale`.
    pub fn sample_wait_time(&mut self, scale: f64) -> SimResult<f64> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "measurement rate must be positive and finite, got {scale}"
            )));
        }
        let exp = Exp::new(1.0 / scale).map_err(|e| SimError::InvalidConfig(e.to_string()))?;
        Ok(exp.sample(&mut self.rng))
    }

    /// Collapse `psi` onto one of `basis`, with probability `|ψ_v|²`.
    ///
    /// The probabilities over `basis` must sum to one within the sampler
    /// tolerance, otherwise the state has drifted and
    /// [`SimError::Unnormalized`] is returned.
    pub fn collapse(&mut self, psi: &[Complex64], basis: &[usize]) -> SimResult<usize> {
        let probs = born_probabilities(psi, basis)?;
        let total: f64 = probs.iter().sum();
        if !total.is_finite() || (total - 1.0).abs() > self.tolerance {
            return Err(SimError::Unnormalized {
                total,
                tolerance: self.tolerance,
            });
        }
        let k = sample_index(&probs, total, &mut self.rng);
        Ok(basis[k])
    }
}

/// `|ψ_v|²` for every `v` in `basis`, in basis order.
pub fn born_probabilities(psi: &[Complex64], basis: &[usize]) -> SimResult<Vec<f64>> {
    if basis.is_empty() {
        return Err(SimError::EmptyBasis);
    }
    basis
        .iter()
        .map(|&v| {
            psi.get(v)
                .map(Complex64::norm_sqr)
                .ok_or(SimError::GenotypeOutOfRange {
                    index: v,
                    size: psi.len(),
                })
        })
        .collect()
}

/// Sample an index from unnormalised weights summing to `total` (CDF method).
fn sample_index<R: Rng>(weights: &[f64], total: f64, rng: &mut R) -> usize {
    let u: f64 = rng.r#gen::<f64>() * total;
    let mut cumsum = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        cumsum += w;
        if u < cumsum {
            return i;
        }
    }
    // Rounding left u past the last bin: take the last index with mass.
    weights.iter().rposition(|&w| w > 0.0).unwrap_or(weights.len() - 1)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn sampler(seed: u64) -> MeasurementSampler<StdRng> {
        MeasurementSampler::new(StdRng::seed_from_u64(seed))
    }

    #[test]
    fn test_collapse_deterministic_state() {
        let psi = vec![
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 1.0),
            Complex64::new(0.0, 0.0),
        ];
        let mut s = sampler(1);
        for _ in 0..100 {
            assert_eq!(s.collapse(&psi, &[0, 1, 2]).unwrap(), 1);
        }
    }

    #[test]
    fn test_collapse_rejects_unnormalized() {
        let psi = vec![Complex64::new(0.5, 0.0), Complex64::new(0.5, 0.0)];
        let err = sampler(2).collapse(&psi, &[0, 1]).unwrap_err();
        assert!(matches!(err, SimError::Unnormalized { .. }));
    }

    #[test]
    fn test_collapse_rejects_empty_and_out_of_range_basis() {
        let psi = vec![Complex64::new(1.0, 0.0)];
        assert!(matches!(
            sampler(3).collapse(&psi, &[]),
            Err(SimError::EmptyBasis)
        ));
        assert!(matches!(
            sampler(3).collapse(&psi, &[4]),
            Err(SimError::GenotypeOutOfRange { index: 4, size: 1 })
        ));
    }

    #[test]
    fn test_wait_time_rejects_bad_scale() {
        assert!(sampler(4).sample_wait_time(0.0).is_err());
        assert!(sampler(4).sample_wait_time(-1.0).is_err());
        assert!(sampler(4).sample_wait_time(f64::INFINITY).is_err());
    }

    #[test]
    fn test_wait_time_mean() {
        let mut s = sampler(5);
        let n = 20_000;
        let mean: f64 = (0..n).map(|_| s.sample_wait_time(3.0).unwrap()).sum::<f64>() / n as f64;
        // Standard error is 3/sqrt(n) ≈ 0.021.
        assert!((mean - 3.0).abs() < 0.15, "mean = {mean}");
    }

    #[test]
    fn test_sample_index_rounding_fallback() {
        let mut rng = StdRng::seed_from_u64(6);
        // No mass at all: last bin.
        let idx = sample_index(&[0.0, 0.0], 0.0, &mut rng);
        assert_eq!(idx, 1);
        let idx = sample_index(&[0.3, 0.7, 0.0], 1.0, &mut rng);
        assert!(idx < 2);
    }
}
