//! Generator (Hamiltonian) construction.
//!
//! The walk is driven by
//!
//!   H = -γ · A
//!
//! where A is either the adjacency matrix of the genotype space or its
//! combinatorial Laplacian L = D - A, and γ > 0 is the mutation rate.
//! H is real symmetric, so `exp(-i t H)` is unitary.
//!
//! # Example
//!
//! ```rust
//! use qwalk_sim::genotype::{Genotype, GenotypeSpace};
//! use qwalk_sim::hamiltonian::{build_hamiltonian, MatrixKind};
//!
//! let space = GenotypeSpace::from_parts(
//!     "pair",
//!     [Genotype::new("A", ["x"]), Genotype::new("B", ["y"])],
//!     [(0, 1)],
//! ).unwrap();
//!
//! let h = build_hamiltonian(&space, 0.5, MatrixKind::Laplacian).unwrap();
//! assert_eq!(h.get(0, 0), -0.5);
//! assert_eq!(h.get(0, 1), 0.5);
//! ```

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SimError, SimResult};
use crate::genotype::GenotypeSpace;

/// Which graph matrix the generator is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatrixKind {
    /// Unweighted adjacency matrix.
    Adjacency,
    /// Degree matrix minus adjacency.
    #[default]
    Laplacian,
}

impl std::fmt::Display for MatrixKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatrixKind::Adjacency => write!(f, "adjacency"),
            MatrixKind::Laplacian => write!(f, "laplacian"),
        }
    }
}

impl std::str::FromStr for MatrixKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "adjacency" | "adj" => Ok(MatrixKind::Adjacency),
            "laplacian" | "lap" => Ok(MatrixKind::Laplacian),
            other => Err(SimError::InvalidConfig(format!(
                "unknown matrix kind '{other}' (expected adjacency or laplacian)"
            ))),
        }
    }
}

/// Square real matrix in compressed-sparse-row form.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    dim: usize,
    /// `row_ptr[i]..row_ptr[i + 1]` indexes the entries of row `i`.
    row_ptr: Vec<usize>,
    /// Column index per stored entry, ascending within each row.
    cols: Vec<usize>,
    values: Vec<f64>,
}

impl SparseMatrix {
    /// Build from `(row, col, value)` triplets.
    ///
    /// Duplicate coordinates are summed; explicit zeros are dropped.
    pub fn from_triplets(dim: usize, mut triplets: Vec<(usize, usize, f64)>) -> SimResult<Self> {
        if let Some(&(r, c, _)) = triplets.iter().find(|(r, c, _)| *r >= dim || *c >= dim) {
            return Err(SimError::GenotypeOutOfRange {
                index: r.max(c),
                size: dim,
            });
        }
        triplets.sort_by_key(|&(r, c, _)| (r, c));

        let mut row_ptr = vec![0usize; dim + 1];
        let mut cols = Vec::with_capacity(triplets.len());
        let mut values: Vec<f64> = Vec::with_capacity(triplets.len());
        let mut last: Option<(usize, usize)> = None;

        for (r, c, v) in triplets {
            if last == Some((r, c)) {
                if let Some(tail) = values.last_mut() {
                    *tail += v;
                }
                continue;
            }
            cols.push(c);
            values.push(v);
            row_ptr[r + 1] += 1;
            last = Some((r, c));
        }
        for i in 0..dim {
            row_ptr[i + 1] += row_ptr[i];
        }

        let mut m = Self {
            dim,
            row_ptr,
            cols,
            values,
        };
        m.prune_zeros();
        Ok(m)
    }

    fn prune_zeros(&mut self) {
        if self.values.iter().all(|v| *v != 0.0) {
            return;
        }
        let mut row_ptr = vec![0usize; self.dim + 1];
        let mut cols = Vec::with_capacity(self.cols.len());
        let mut values = Vec::with_capacity(self.values.len());
        for row in 0..self.dim {
            for k in self.row_ptr[row]..self.row_ptr[row + 1] {
                if self.values[k] != 0.0 {
                    cols.push(self.cols[k]);
                    values.push(self.values[k]);
                }
            }
            row_ptr[row + 1] = cols.len();
        }
        self.row_ptr = row_ptr;
        self.cols = cols;
        self.values = values;
    }

    /// Matrix dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored non-zeros.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Entry `(row, col)`, zero if not stored or out of range.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        if row >= self.dim {
            return 0.0;
        }
        let range = self.row_ptr[row]..self.row_ptr[row + 1];
        match self.cols[range.clone()].binary_search(&col) {
            Ok(k) => self.values[range.start + k],
            Err(_) => 0.0,
        }
    }

    /// Stored `(col, value)` pairs of one row.
    pub fn row(&self, row: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.row_ptr[row]..self.row_ptr[row + 1];
        self.cols[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Sum of the diagonal.
    pub fn trace(&self) -> f64 {
        (0..self.dim).map(|i| self.get(i, i)).sum()
    }

    /// Induced 1-norm: maximum absolute column sum.
    pub fn one_norm(&self) -> f64 {
        self.one_norm_shifted(0.0)
    }

    /// Induced 1-norm of `A - shift·I`.
    pub fn one_norm_shifted(&self, shift: f64) -> f64 {
        let mut col_sums = vec![0.0f64; self.dim];
        let mut diag_seen = vec![false; self.dim];
        for row in 0..self.dim {
            for k in self.row_ptr[row]..self.row_ptr[row + 1] {
                let col = self.cols[k];
                if col == row {
                    col_sums[col] += (self.values[k] - shift).abs();
                    diag_seen[col] = true;
                } else {
                    col_sums[col] += self.values[k].abs();
                }
            }
        }
        for (sum, seen) in col_sums.iter_mut().zip(diag_seen) {
            if !seen {
                *sum += shift.abs();
            }
        }
        col_sums.into_iter().fold(0.0, f64::max)
    }

    /// True if `A[i][j] == A[j][i]` for every stored entry.
    pub fn is_symmetric(&self) -> bool {
        (0..self.dim).all(|i| self.row(i).all(|(j, v)| self.get(j, i) == v))
    }

    /// `out = (A - shift·I) x`.
    pub fn matvec_shifted(
        &self,
        x: &[Complex64],
        shift: f64,
        out: &mut [Complex64],
    ) -> SimResult<()> {
        if x.len() != self.dim || out.len() != self.dim {
            return Err(SimError::DimensionMismatch {
                expected: self.dim,
                found: if x.len() != self.dim { x.len() } else { out.len() },
            });
        }
        for (row, slot) in out.iter_mut().enumerate() {
            let mut acc = -shift * x[row];
            for k in self.row_ptr[row]..self.row_ptr[row + 1] {
                acc += self.values[k] * x[self.cols[k]];
            }
            *slot = acc;
        }
        Ok(())
    }

    /// `A x` as a fresh vector.
    pub fn matvec(&self, x: &[Complex64]) -> SimResult<Vec<Complex64>> {
        let mut out = vec![Complex64::new(0.0, 0.0); self.dim];
        self.matvec_shifted(x, 0.0, &mut out)?;
        Ok(out)
    }
}

/// Build the generator `H = -γ · A` for a genotype space.
pub fn build_hamiltonian(
    space: &GenotypeSpace,
    gamma: f64,
    kind: MatrixKind,
) -> SimResult<SparseMatrix> {
    if !(gamma.is_finite() && gamma > 0.0) {
        return Err(SimError::InvalidConfig(format!(
            "mutation rate gamma must be positive and finite, got {gamma}"
        )));
    }
    if space.is_empty() {
        return Err(SimError::EmptyGenotypeSpace);
    }

    let m = space.len();
    let mut triplets = Vec::with_capacity(2 * space.num_mutations() + m);
    for (a, b) in space.edges() {
        triplets.push((a, b, -gamma));
        triplets.push((b, a, -gamma));
    }
    if kind == MatrixKind::Laplacian {
        // -γ(D - A): off-diagonals +γ, diagonal -γ·deg.
        for t in &mut triplets {
            t.2 = gamma;
        }
        for i in 0..m {
            let degree = space.degree(i)?;
            if degree > 0 {
                triplets.push((i, i, -gamma * degree as f64));
            }
        }
    }

    let h = SparseMatrix::from_triplets(m, triplets)?;
    debug!(
        dim = m,
        nnz = h.nnz(),
        gamma,
        kind = %kind,
        "built generator matrix"
    );
    Ok(h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triplets_sum_duplicates_and_drop_zeros() {
        let m = SparseMatrix::from_triplets(
            2,
            vec![(0, 1, 1.0), (0, 1, 2.0), (1, 0, 0.0), (1, 1, -1.0)],
        )
        .unwrap();
        assert_eq!(m.get(0, 1), 3.0);
        assert_eq!(m.get(1, 0), 0.0);
        assert_eq!(m.nnz(), 2);
        assert_eq!(m.trace(), -1.0);
    }

    #[test]
    fn test_triplets_out_of_range() {
        let err = SparseMatrix::from_triplets(2, vec![(0, 5, 1.0)]).unwrap_err();
        assert!(matches!(err, SimError::GenotypeOutOfRange { index: 5, size: 2 }));
    }

    #[test]
    fn test_one_norm() {
        let m = SparseMatrix::from_triplets(2, vec![(0, 0, -2.0), (1, 0, 1.5), (0, 1, 0.5)])
            .unwrap();
        assert!((m.one_norm() - 3.5).abs() < 1e-15);
    }

    #[test]
    fn test_matvec_dimension_check() {
        let m = SparseMatrix::from_triplets(3, vec![]).unwrap();
        let x = vec![Complex64::new(1.0, 0.0); 2];
        assert!(matches!(
            m.matvec(&x),
            Err(SimError::DimensionMismatch { expected: 3, found: 2 })
        ));
    }

    #[test]
    fn test_matrix_kind_parse() {
        assert_eq!("Laplacian".parse::<MatrixKind>().unwrap(), MatrixKind::Laplacian);
        assert_eq!("adj".parse::<MatrixKind>().unwrap(), MatrixKind::Adjacency);
        assert!("dense".parse::<MatrixKind>().is_err());
    }
}
