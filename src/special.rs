//! Structured matrices: triangular, banded and permutation forms.
//!
//! These are not new storage kinds. Each structured matrix is assembled
//! from the existing representations (dense segments joined with virtual
//! zero segments per row, or one-entry sparse rows), so the structural
//! constraint is enforced by the storage itself: writes inside the profile
//! route to a dense segment and succeed, writes outside it land on a
//! virtual zero and fail with an immutability error. The matrices are
//! therefore partially mutable first-class citizens, not a check bolted
//! onto a mutable base.

use crate::array::{Array, Repr};
use crate::dense::StridedData;
use crate::matrix::Matrix;
use crate::vector::Vector;
use crate::{ArrayError, Result};

// ============================================================================
// Structured constructors
// ============================================================================

impl Matrix {
    /// `n`-by-`n` lower triangular matrix of zeros.
    ///
    /// Slots on and below the diagonal are freely settable; slots above it
    /// are structurally frozen and reject writes.
    pub fn lower_triangular(n: usize) -> Matrix {
        Matrix::lower_triangular_from_fn(n, |_, _| 0.0)
    }

    /// `n`-by-`n` lower triangular matrix with `f(row, col)` filling the
    /// settable profile.
    pub fn lower_triangular_from_fn(n: usize, mut f: impl FnMut(usize, usize) -> f64) -> Matrix {
        profile_matrix(n, |i| (0, i + 1), &mut f)
    }

    /// `n`-by-`n` upper triangular matrix of zeros.
    ///
    /// Slots on and above the diagonal are freely settable; slots below it
    /// are structurally frozen.
    pub fn upper_triangular(n: usize) -> Matrix {
        Matrix::upper_triangular_from_fn(n, |_, _| 0.0)
    }

    /// `n`-by-`n` upper triangular matrix with `f(row, col)` filling the
    /// settable profile.
    pub fn upper_triangular_from_fn(n: usize, mut f: impl FnMut(usize, usize) -> f64) -> Matrix {
        profile_matrix(n, |i| (i, n), &mut f)
    }

    /// `n`-by-`n` band matrix of zeros: row `i` is settable in columns
    /// `[i - lower, i + upper]` clipped to the matrix, frozen elsewhere.
    ///
    /// `band(n, 0, 0)` has the diagonal profile, `band(n, n, n)` is fully
    /// settable.
    pub fn band(n: usize, lower: usize, upper: usize) -> Matrix {
        profile_matrix(
            n,
            |i| (i.saturating_sub(lower), (i + upper + 1).min(n)),
            &mut |_, _| 0.0,
        )
    }

    /// Permutation matrix: row `i` holds a single 1 in column `perm[i]`.
    ///
    /// `perm` must be a permutation of `0..perm.len()`. The result is
    /// immutable in its zero region and value-frozen at the stored ones.
    pub fn permutation(perm: &[usize]) -> Result<Matrix> {
        let n = perm.len();
        let mut seen = vec![false; n];
        for &p in perm {
            if p >= n || seen[p] {
                return Err(ArrayError::InvariantViolation(format!(
                    "{perm:?} is not a permutation of 0..{n}"
                )));
            }
            seen[p] = true;
        }
        if n == 0 {
            return Ok(Matrix::zero(0, 0));
        }
        let rows: Vec<Array> = perm
            .iter()
            .map(|&p| {
                Vector::sparse_indexed(n, vec![p], vec![1.0], false)
                    .unwrap_or_else(|_| unreachable!("one in-range unit cell is always valid"))
                    .into_array()
            })
            .collect();
        let array = Array::from_slices(rows)
            .unwrap_or_else(|_| unreachable!("rows share one length"));
        Matrix::from_array(array)
    }
}

/// Rows of dense segments over `[start, end)` per row, joined with virtual
/// zeros outside; degenerate profiles fall back to fully frozen rows.
fn profile_matrix(
    n: usize,
    profile: impl Fn(usize) -> (usize, usize),
    f: &mut dyn FnMut(usize, usize) -> f64,
) -> Matrix {
    if n == 0 {
        return Matrix::zero(0, 0);
    }
    let rows: Vec<Array> = (0..n)
        .map(|i| {
            let (start, end) = profile(i);
            if start >= end {
                return Array::zero(&[n]);
            }
            let dense = Array::from_fn(&[end - start], |idx| f(i, start + idx[0]));
            let mut row = dense;
            if start > 0 {
                row = Array::zero(&[start])
                    .join(&row, 0)
                    .unwrap_or_else(|_| unreachable!("rank-1 joins always fit"));
            }
            if end < n {
                row = row
                    .join(&Array::zero(&[n - end]), 0)
                    .unwrap_or_else(|_| unreachable!("rank-1 joins always fit"));
            }
            row
        })
        .collect();
    let array =
        Array::from_slices(rows).unwrap_or_else(|_| unreachable!("rows share one length"));
    Matrix::from_array(array).unwrap_or_else(|_| unreachable!("profile rows form rank 2"))
}

// ============================================================================
// Diagonal access and structure predicates
// ============================================================================

impl Matrix {
    /// Sum of the diagonal elements (over `min(rows, cols)` for rectangular
    /// matrices).
    pub fn trace(&self) -> f64 {
        let n = self.row_count().min(self.column_count());
        let mut acc = 0.0;
        for i in 0..n {
            acc += self
                .get(i, i)
                .unwrap_or_else(|_| unreachable!("diagonal index is in range"));
        }
        acc
    }

    /// The diagonal as a vector.
    ///
    /// An aliasing strided view (stride `cols + 1` over the flat buffer)
    /// for dense and strided storage; a dense copy for every other
    /// representation.
    pub fn diagonal_vector(&self) -> Vector {
        let n = self.row_count().min(self.column_count());
        if let Some(s) = self.as_array().as_strided() {
            let data = StridedData {
                buf: s.buf.clone(),
                shape: vec![n],
                strides: vec![s.strides[0] + s.strides[1]],
                offset: s.offset,
            };
            let array = Array::with_repr(vec![n], Repr::Strided(data));
            return Vector::from_array(array)
                .unwrap_or_else(|_| unreachable!("diagonal view is rank 1"));
        }
        let copied = Array::from_fn(&[n], |idx| {
            self.as_array().get_element(&[idx[0], idx[0]])
        });
        Vector::from_array(copied).unwrap_or_else(|_| unreachable!("diagonal copy is rank 1"))
    }

    /// Whether every element above the diagonal is zero.
    pub fn is_lower_triangular(&self) -> bool {
        for i in 0..self.row_count() {
            for j in (i + 1)..self.column_count() {
                if self.as_array().get_element(&[i, j]) != 0.0 {
                    return false;
                }
            }
        }
        true
    }

    /// Whether every element below the diagonal is zero.
    pub fn is_upper_triangular(&self) -> bool {
        for i in 0..self.row_count() {
            for j in 0..i.min(self.column_count()) {
                if self.as_array().get_element(&[i, j]) != 0.0 {
                    return false;
                }
            }
        }
        true
    }

    /// Whether every off-diagonal element is zero.
    pub fn is_diagonal_matrix(&self) -> bool {
        self.is_lower_triangular() && self.is_upper_triangular()
    }

    /// Whether the matrix is square and equal to its transpose within an
    /// absolute tolerance.
    pub fn is_symmetric(&self, tol: f64) -> bool {
        if self.row_count() != self.column_count() {
            return false;
        }
        for i in 0..self.row_count() {
            for j in (i + 1)..self.column_count() {
                let a = self.as_array().get_element(&[i, j]);
                let b = self.as_array().get_element(&[j, i]);
                if (a - b).abs() > tol {
                    return false;
                }
            }
        }
        true
    }
}

// ============================================================================
// Row and column rearrangement
// ============================================================================

impl Matrix {
    /// Swap rows `a` and `b` in place.
    pub fn swap_rows(&mut self, a: usize, b: usize) -> Result<()> {
        if a == b {
            // Still bounds-checked.
            self.as_array().slice(a)?;
            return Ok(());
        }
        let row_a = self.as_array().slice(a)?.to_vec();
        let row_b = self.as_array().slice(b)?.to_vec();
        for (j, (&va, &vb)) in row_a.iter().zip(&row_b).enumerate() {
            self.set(a, j, vb)?;
            self.set(b, j, va)?;
        }
        Ok(())
    }

    /// Swap columns `a` and `b` in place.
    pub fn swap_columns(&mut self, a: usize, b: usize) -> Result<()> {
        if a == b {
            self.as_array().slice_dim(1, a)?;
            return Ok(());
        }
        let col_a = self.as_array().slice_dim(1, a)?.to_vec();
        let col_b = self.as_array().slice_dim(1, b)?.to_vec();
        for (i, (&va, &vb)) in col_a.iter().zip(&col_b).enumerate() {
            self.set(i, a, vb)?;
            self.set(i, b, va)?;
        }
        Ok(())
    }

    /// Per-row sums as a vector of length `row_count`.
    pub fn row_sums(&self) -> Vector {
        let sums = self
            .as_array()
            .sum_dim(1)
            .unwrap_or_else(|_| unreachable!("a matrix always has dimension 1"));
        Vector::from_array(sums).unwrap_or_else(|_| unreachable!("row sums are rank 1"))
    }

    /// Per-column sums as a vector of length `column_count`.
    pub fn column_sums(&self) -> Vector {
        let sums = self
            .as_array()
            .sum_dim(0)
            .unwrap_or_else(|_| unreachable!("a matrix always has dimension 0"));
        Vector::from_array(sums).unwrap_or_else(|_| unreachable!("column sums are rank 1"))
    }
}
