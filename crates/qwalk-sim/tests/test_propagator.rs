//! Tests for the matrix-exponential action.
//!
//! Norm preservation is checked as a property over random sparse symmetric
//! generators; the remaining tests pin exact behaviour on small systems.

use num_complex::Complex64;
use proptest::prelude::*;

use qwalk_sim::genotype::{Genotype, GenotypeSpace};
use qwalk_sim::hamiltonian::{MatrixKind, SparseMatrix, build_hamiltonian};
use qwalk_sim::propagator::{Propagator, TaylorPropagator, basis_state, evolve, norm};
use qwalk_sim::SimError;

/// Random real symmetric matrix with up to `2·k + n` non-zeros.
fn arb_symmetric(n: usize) -> impl Strategy<Value = SparseMatrix> {
    prop::collection::vec((0..n, 0..n, -3.0f64..3.0), 0..=3 * n).prop_map(move |entries| {
        let mut triplets = Vec::new();
        for (i, j, v) in entries {
            triplets.push((i, j, v));
            if i != j {
                triplets.push((j, i, v));
            }
        }
        SparseMatrix::from_triplets(n, triplets).unwrap()
    })
}

/// Random unit vector of length `n`.
fn arb_state(n: usize) -> impl Strategy<Value = Vec<Complex64>> {
    prop::collection::vec((-1.0f64..1.0, -1.0f64..1.0), n)
        .prop_filter("non-negligible norm", |v| {
            v.iter().map(|(a, b)| a * a + b * b).sum::<f64>() > 1e-3
        })
        .prop_map(|v| {
            let psi: Vec<Complex64> = v.into_iter().map(|(a, b)| Complex64::new(a, b)).collect();
            let n = norm(&psi);
            psi.into_iter().map(|z| z / n).collect()
        })
}

fn arb_system() -> impl Strategy<Value = (SparseMatrix, Vec<Complex64>, f64)> {
    (1usize..=8).prop_flat_map(|n| (arb_symmetric(n), arb_state(n), 0.0f64..20.0))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn evolution_preserves_norm((h, psi, t) in arb_system()) {
        let out = evolve(&h, &psi, t).unwrap();
        prop_assert!((norm(&out) - 1.0).abs() < 1e-9, "norm drifted to {}", norm(&out));
    }

    #[test]
    fn evolution_composes((h, psi, t) in arb_system()) {
        // exp(-i t H) = exp(-i t/2 H) · exp(-i t/2 H)
        let whole = evolve(&h, &psi, t).unwrap();
        let half = evolve(&h, &psi, t / 2.0).unwrap();
        let twice = evolve(&h, &half, t / 2.0).unwrap();
        for (a, b) in whole.iter().zip(&twice) {
            prop_assert!((a - b).norm() < 1e-8);
        }
    }
}

#[test]
fn zero_time_returns_input_exactly() {
    let h = SparseMatrix::from_triplets(2, vec![(0, 1, 1.0), (1, 0, 1.0)]).unwrap();
    let psi = vec![Complex64::new(0.6, 0.1), Complex64::new(-0.2, 0.3)];
    assert_eq!(evolve(&h, &psi, 0.0).unwrap(), psi);
}

#[test]
fn path_of_three_adjacency_matches_closed_form() {
    // Adjacency of P3 has eigenvalues 0, ±√2; from the centre node:
    // |ψ₀(t)|² = |ψ₂(t)|² = sin²(√2 γ t) / 2.
    let space = GenotypeSpace::from_parts(
        "p3",
        (0..3).map(|i| Genotype::new(format!("{i}"), ["x"])),
        [(0, 1), (1, 2)],
    )
    .unwrap();
    let gamma = 0.8;
    let h = build_hamiltonian(&space, gamma, MatrixKind::Adjacency).unwrap();
    let psi = basis_state(1, 3).unwrap();
    for &t in &[0.3, 1.0, 2.5, 9.0] {
        let out = evolve(&h, &psi, t).unwrap();
        let expected = (2f64.sqrt() * gamma * t).sin().powi(2) / 2.0;
        assert!((out[0].norm_sqr() - expected).abs() < 1e-10);
        assert!((out[2].norm_sqr() - expected).abs() < 1e-10);
    }
}

#[test]
fn large_time_on_larger_graph_stays_unitary() {
    let n = 60;
    let space = GenotypeSpace::from_parts(
        "ring",
        (0..n).map(|i| Genotype::new(format!("{i}"), ["x"])),
        (0..n).map(|i| (i, (i + 1) % n)),
    )
    .unwrap();
    let h = build_hamiltonian(&space, 1.0, MatrixKind::Laplacian).unwrap();
    let out = evolve(&h, &basis_state(0, n).unwrap(), 150.0).unwrap();
    assert!((norm(&out) - 1.0).abs() < 1e-9);
}

#[test]
fn dimension_mismatch_is_numerical_error() {
    let h = SparseMatrix::from_triplets(3, vec![]).unwrap();
    let err = evolve(&h, &basis_state(0, 2).unwrap(), 1.0).unwrap_err();
    assert!(matches!(err, SimError::DimensionMismatch { expected: 3, found: 2 }));
    assert_eq!(err.kind(), qwalk_sim::ErrorKind::Numerical);
}

#[test]
fn substeps_scale_with_time() {
    let h = SparseMatrix::from_triplets(2, vec![(0, 1, 1.0), (1, 0, 1.0)]).unwrap();
    let prop = TaylorPropagator::new();
    assert_eq!(prop.substeps(&h, 0.0), 1);
    assert!(prop.substeps(&h, 100.0) > prop.substeps(&h, 1.0));
}

#[test]
fn trait_object_dispatch() {
    let prop: Box<dyn Propagator> = Box::new(TaylorPropagator::new().with_tolerance(1e-14));
    let h = SparseMatrix::from_triplets(1, vec![(0, 0, 2.0)]).unwrap();
    let out = prop.evolve(&h, &basis_state(0, 1).unwrap(), 1.0).unwrap();
    assert!((out[0] - Complex64::from_polar(1.0, -2.0)).norm() < 1e-12);
}
