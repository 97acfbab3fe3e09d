//! Tests for waiting-time sampling and Born-rule collapse.

use num_complex::Complex64;
use rand::SeedableRng;
use rand::rngs::StdRng;
use statrs::distribution::{ChiSquared, ContinuousCDF};

use qwalk_sim::ErrorKind;
use qwalk_sim::measurement::{MeasurementSampler, born_probabilities};

fn sampler(seed: u64) -> MeasurementSampler<StdRng> {
    MeasurementSampler::new(StdRng::seed_from_u64(seed))
}

/// State with `|ψ_v|² = probs[v]` and arbitrary phases.
fn state_with(probs: &[f64]) -> Vec<Complex64> {
    probs
        .iter()
        .enumerate()
        .map(|(v, p)| Complex64::from_polar(p.sqrt(), 0.7 * v as f64))
        .collect()
}

// ---------------------------------------------------------------------------
// Collapse
// ---------------------------------------------------------------------------

#[test]
fn collapse_frequencies_follow_born_rule() {
    let probs = [0.1, 0.2, 0.3, 0.4];
    let psi = state_with(&probs);
    let basis = [0, 1, 2, 3];
    let n = 40_000;

    let mut s = sampler(20_240_601);
    let mut counts = [0u64; 4];
    for _ in 0..n {
        let v = s.collapse(&psi, &basis).unwrap();
        counts[v] += 1;
    }

    let chi2: f64 = counts
        .iter()
        .zip(probs)
        .map(|(&c, p)| {
            let expected = n as f64 * p;
            let diff = c as f64 - expected;
            diff * diff / expected
        })
        .sum();
    let p_value = ChiSquared::new(3.0).unwrap().sf(chi2);
    assert!(p_value > 0.001, "chi2 = {chi2}, p = {p_value}, counts = {counts:?}");
}

#[test]
fn collapse_stays_inside_basis() {
    // Mass only on genotypes 1 and 3.
    let psi = state_with(&[0.0, 0.5, 0.0, 0.5]);
    let mut s = sampler(9);
    for _ in 0..500 {
        let v = s.collapse(&psi, &[1, 3]).unwrap();
        assert!(v == 1 || v == 3);
    }
}

#[test]
fn collapse_tolerates_small_drift() {
    let mut psi = state_with(&[0.5, 0.5]);
    psi[0] *= 1.0 + 1e-9;
    assert!(sampler(1).collapse(&psi, &[0, 1]).is_ok());
}

#[test]
fn tightened_tolerance_rejects_small_drift() {
    let mut psi = state_with(&[0.5, 0.5]);
    psi[0] *= 1.0 + 1e-9;
    let err = sampler(1)
        .with_tolerance(1e-12)
        .collapse(&psi, &[0, 1])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Distribution);
}

#[test]
fn collapse_over_partial_basis_is_unnormalized() {
    let psi = state_with(&[0.25, 0.25, 0.5]);
    let err = sampler(2).collapse(&psi, &[0, 1]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Distribution);
}

#[test]
fn born_probabilities_in_basis_order() {
    let psi = state_with(&[0.2, 0.8]);
    let p = born_probabilities(&psi, &[1, 0]).unwrap();
    assert!((p[0] - 0.8).abs() < 1e-12);
    assert!((p[1] - 0.2).abs() < 1e-12);
}

// ---------------------------------------------------------------------------
// Waiting times
// ---------------------------------------------------------------------------

#[test]
fn wait_times_are_non_negative() {
    let mut s = sampler(4);
    for _ in 0..1_000 {
        let t = s.sample_wait_time(0.25).unwrap();
        assert!(t >= 0.0 && t.is_finite());
    }
}

#[test]
fn wait_time_scale_is_the_mean() {
    let mut s = sampler(5);
    let n = 50_000;
    let scale = 0.5;
    let mean = (0..n).map(|_| s.sample_wait_time(scale).unwrap()).sum::<f64>() / n as f64;
    // Standard error is scale/sqrt(n) ≈ 0.0022.
    assert!((mean - scale).abs() < 0.02, "mean = {mean}");
}

#[test]
fn same_seed_same_draws() {
    let psi = state_with(&[0.3, 0.3, 0.4]);
    let mut a = sampler(77);
    let mut b = sampler(77);
    for _ in 0..100 {
        assert_eq!(
            a.sample_wait_time(1.0).unwrap(),
            b.sample_wait_time(1.0).unwrap()
        );
        assert_eq!(
            a.collapse(&psi, &[0, 1, 2]).unwrap(),
            b.collapse(&psi, &[0, 1, 2]).unwrap()
        );
    }
}
