//! Rank-2 wrapper with the matrix-specific API.
//!
//! Row and column access return [`Vector`]s that alias the matrix storage,
//! and [`Matrix::transpose`] is the O(1) stride-swap view for dense and
//! strided storage. Diagonal and identity matrices are built from the
//! sparse machinery and are partially mutable: stored diagonal slots accept
//! non-zero writes, everything else is structurally frozen.

use crate::array::Array;
use crate::vector::Vector;
use crate::{ArrayError, Result};

/// A rank-2 array of `f64` values.
#[derive(Debug, Clone)]
pub struct Matrix(Array);

impl Matrix {
    /// Mutable dense matrix of zeros.
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix(Array::zeros(&[rows, cols]))
    }

    /// Immutable virtual zero matrix.
    pub fn zero(rows: usize, cols: usize) -> Matrix {
        Matrix(Array::zero(&[rows, cols]))
    }

    /// Wrap caller-supplied row-major data as a mutable dense matrix.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Matrix> {
        Ok(Matrix(Array::from_vec(&[rows, cols], data)?))
    }

    /// Dense matrix filled from a function of (row, column).
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Matrix {
        Matrix(Array::from_fn(&[rows, cols], |idx| f(idx[0], idx[1])))
    }

    /// Square diagonal matrix over sparse row storage.
    ///
    /// Partially mutable: a non-zero diagonal slot accepts non-zero writes,
    /// zero diagonal slots and all off-diagonal slots are frozen.
    pub fn diagonal(diag: &[f64]) -> Matrix {
        let n = diag.len();
        if n == 0 {
            return Matrix::zero(0, 0);
        }
        let rows: Vec<Array> = diag
            .iter()
            .enumerate()
            .map(|(i, &d)| {
                let (indices, values) = if d != 0.0 {
                    (vec![i], vec![d])
                } else {
                    (Vec::new(), Vec::new())
                };
                Vector::sparse_indexed(n, indices, values, false)
                    .unwrap_or_else(|_| unreachable!("one in-range cell is always valid"))
                    .into_array()
            })
            .collect();
        Matrix(
            Array::from_slices(rows)
                .unwrap_or_else(|_| unreachable!("rows share one length")),
        )
    }

    /// Identity matrix of order `n`.
    pub fn identity(n: usize) -> Matrix {
        Matrix::diagonal(&vec![1.0; n])
    }

    /// Adopt a rank-2 array (shares its storage).
    pub fn from_array(array: Array) -> Result<Matrix> {
        if array.rank() != 2 {
            return Err(ArrayError::UnsupportedRank {
                expected: 2,
                actual: array.rank(),
            });
        }
        Ok(Matrix(array))
    }
}

impl Matrix {
    #[inline]
    pub fn row_count(&self) -> usize {
        self.0.shape()[0]
    }

    #[inline]
    pub fn column_count(&self) -> usize {
        self.0.shape()[1]
    }

    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        self.0.get(&[row, col])
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        self.0.set(&[row, col], value)
    }

    /// Row `i` as a vector view aliasing this matrix.
    pub fn row(&self, i: usize) -> Result<Vector> {
        Vector::from_array(self.0.slice(i)?)
    }

    /// Column `j` as a vector view aliasing this matrix.
    pub fn column(&self, j: usize) -> Result<Vector> {
        Vector::from_array(self.0.slice_dim(1, j)?)
    }

    /// Transposed view: swaps the row/column stride roles in O(1) for
    /// dense and strided storage.
    pub fn transpose(&self) -> Matrix {
        let t = self
            .0
            .transpose()
            .unwrap_or_else(|_| unreachable!("rank-2 transpose is always defined"));
        Matrix(t)
    }

    pub fn element_sum(&self) -> f64 {
        self.0.element_sum()
    }

    pub fn non_zero_count(&self) -> usize {
        self.0.non_zero_count()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }

    pub fn as_array(&self) -> &Array {
        &self.0
    }

    pub fn as_array_mut(&mut self) -> &mut Array {
        &mut self.0
    }

    pub fn into_array(self) -> Array {
        self.0
    }
}

impl From<Matrix> for Array {
    fn from(m: Matrix) -> Array {
        m.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m2x3() -> Matrix {
        Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap()
    }

    #[test]
    fn test_shape_accessors() {
        let m = m2x3();
        assert_eq!(m.row_count(), 2);
        assert_eq!(m.column_count(), 3);
        assert_eq!(m.get(1, 2).unwrap(), 6.0);
        assert!(m.get(2, 0).is_err());
    }

    #[test]
    fn test_row_and_column_alias() {
        let m = m2x3();
        let mut row = m.row(0).unwrap();
        assert_eq!(row.to_vec(), vec![1.0, 2.0, 3.0]);
        row.set(0, 10.0).unwrap();
        assert_eq!(m.get(0, 0).unwrap(), 10.0);

        let col = m.column(2).unwrap();
        assert_eq!(col.to_vec(), vec![3.0, 6.0]);
    }

    #[test]
    fn test_transpose_shape_and_alias() {
        let m = m2x3();
        let t = m.transpose();
        assert_eq!((t.row_count(), t.column_count()), (3, 2));
        assert_eq!(t.get(2, 1).unwrap(), 6.0);
        let mut t = t;
        t.set(0, 1, 40.0).unwrap();
        assert_eq!(m.get(1, 0).unwrap(), 40.0);
    }

    #[test]
    fn test_identity_and_diagonal() {
        let id = Matrix::identity(3);
        assert_eq!(id.non_zero_count(), 3);
        assert_eq!(id.get(1, 1).unwrap(), 1.0);
        assert_eq!(id.get(0, 2).unwrap(), 0.0);
        assert!(id.as_array().is_sparse());

        let mut d = Matrix::diagonal(&[2.0, 0.0, 4.0]);
        assert_eq!(d.element_sum(), 6.0);
        // Stored diagonal slots take non-zero writes; everything else is
        // structurally frozen.
        d.set(0, 0, 5.0).unwrap();
        assert!(d.set(0, 1, 1.0).is_err());
        assert!(d.set(1, 1, 3.0).is_err());
        assert!(d.as_array().is_mutable());
        assert!(!d.as_array().is_fully_mutable());
    }

    #[test]
    fn test_diagonal_rows_are_sparse_vectors() {
        let d = Matrix::diagonal(&[1.0, 2.0]);
        let row = d.row(1).unwrap();
        assert_eq!(row.non_zero_count(), 1);
        assert_eq!(row.get(1).unwrap(), 2.0);
    }

    #[test]
    fn test_from_array_rank_check() {
        assert!(Matrix::from_array(Array::zeros(&[2])).is_err());
    }
}
