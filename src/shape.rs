//! Pure shape and indexing arithmetic.
//!
//! Everything here operates on shape vectors (`&[usize]`) and stride vectors
//! (`&[isize]`) alone; no storage is involved. The flat position of an index
//! tuple is `offset + Σ index[d] * stride[d]`, with row-major (last dimension
//! fastest, stride 1) as the canonical construction strategy. Strides may be
//! negative or non-monotonic, which is what makes reversed and transposed
//! views possible.

use crate::{ArrayError, Result};

/// Total number of elements described by a shape (1 for rank 0).
#[inline]
pub fn element_count(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Canonical row-major strides for a shape.
pub fn row_major_strides(shape: &[usize]) -> Vec<isize> {
    let mut strides = vec![1isize; shape.len()];
    let mut acc = 1isize;
    for d in (0..shape.len()).rev() {
        strides[d] = acc;
        acc *= shape[d] as isize;
    }
    strides
}

/// Flat buffer position of `index` under `offset`/`strides`.
///
/// The caller must have validated the index; negative strides make the
/// intermediate sum signed.
#[inline]
pub fn linear_index(offset: usize, strides: &[isize], index: &[usize]) -> usize {
    let mut pos = offset as isize;
    for (i, s) in index.iter().zip(strides) {
        pos += *i as isize * s;
    }
    pos as usize
}

/// Flat row-major position of `index` in a packed array of `shape`.
#[inline]
pub fn packed_index(shape: &[usize], index: &[usize]) -> usize {
    let mut pos = 0usize;
    for (i, n) in index.iter().zip(shape) {
        pos = pos * n + i;
    }
    pos
}

/// Validate an index tuple against a shape: arity and per-dimension bounds.
pub fn check_index(shape: &[usize], index: &[usize]) -> Result<()> {
    if index.len() != shape.len() || index.iter().zip(shape).any(|(i, n)| i >= n) {
        return Err(ArrayError::IndexOutOfRange {
            index: index.to_vec(),
            shape: shape.to_vec(),
        });
    }
    Ok(())
}

/// Validate a dimension number against a rank.
pub fn check_dim(rank: usize, dim: usize) -> Result<()> {
    if dim >= rank {
        return Err(ArrayError::DimensionOutOfRange { dim, rank });
    }
    Ok(())
}

/// Validate a rectangular window (`offsets`, `window`) against `shape`.
pub fn check_window(shape: &[usize], offsets: &[usize], window: &[usize]) -> Result<()> {
    if offsets.len() != shape.len() || window.len() != shape.len() {
        return Err(ArrayError::ShapeMismatch(window.to_vec(), shape.to_vec()));
    }
    for d in 0..shape.len() {
        if offsets[d] + window[d] > shape[d] {
            return Err(ArrayError::IndexOutOfRange {
                index: offsets.to_vec(),
                shape: shape.to_vec(),
            });
        }
    }
    Ok(())
}

/// Validate a join of two shapes along `dim` and return the joined shape.
///
/// Every dimension other than `dim` must match exactly.
pub fn join_shape(a: &[usize], b: &[usize], dim: usize) -> Result<Vec<usize>> {
    check_dim(a.len(), dim)?;
    if a.len() != b.len() {
        return Err(ArrayError::ShapeMismatch(a.to_vec(), b.to_vec()));
    }
    for d in 0..a.len() {
        if d != dim && a[d] != b[d] {
            return Err(ArrayError::ShapeMismatch(a.to_vec(), b.to_vec()));
        }
    }
    let mut joined = a.to_vec();
    joined[dim] += b[dim];
    Ok(joined)
}

/// Validate a broadcast of `from` to `target` and return the number of new
/// leading dimensions.
///
/// Only whole-dimension-prepending broadcast is supported: the target must
/// have rank `>= from.len()` and its trailing dimensions must equal `from`
/// exactly. There is no size-1 dimension expansion.
pub fn broadcast_lead(from: &[usize], target: &[usize]) -> Result<usize> {
    if target.len() < from.len() || &target[target.len() - from.len()..] != from {
        return Err(ArrayError::BroadcastIncompatible {
            from: from.to_vec(),
            to: target.to_vec(),
        });
    }
    Ok(target.len() - from.len())
}

/// Whether `strides` describe a canonical row-major layout over `shape`
/// starting at offset 0 of a buffer of exactly `element_count(shape)` slots.
///
/// Dimensions of extent `<= 1` contribute no distinct positions, so their
/// stride is irrelevant.
pub fn is_packed(shape: &[usize], strides: &[isize], offset: usize, buf_len: usize) -> bool {
    if offset != 0 || buf_len != element_count(shape) {
        return false;
    }
    let mut expected = 1isize;
    for d in (0..shape.len()).rev() {
        if shape[d] <= 1 {
            continue;
        }
        if strides[d] != expected {
            return false;
        }
        expected *= shape[d] as isize;
    }
    true
}

/// Odometer iterator over every index tuple of a shape, row-major order.
///
/// A rank-0 shape yields exactly one (empty) tuple. Any zero-sized dimension
/// yields nothing.
pub struct IndexIter {
    shape: Vec<usize>,
    next: Option<Vec<usize>>,
}

impl IndexIter {
    pub fn new(shape: &[usize]) -> Self {
        let next = if element_count(shape) == 0 {
            None
        } else {
            Some(vec![0; shape.len()])
        };
        Self {
            shape: shape.to_vec(),
            next,
        }
    }
}

impl Iterator for IndexIter {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.next.take()?;
        // Advance the odometer, last dimension fastest.
        let mut bumped = current.clone();
        let mut d = self.shape.len();
        loop {
            if d == 0 {
                // Wrapped past the first dimension: exhausted.
                self.next = None;
                break;
            }
            d -= 1;
            bumped[d] += 1;
            if bumped[d] < self.shape[d] {
                self.next = Some(bumped);
                break;
            }
            bumped[d] = 0;
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_count() {
        assert_eq!(element_count(&[]), 1);
        assert_eq!(element_count(&[4]), 4);
        assert_eq!(element_count(&[2, 3, 4]), 24);
        assert_eq!(element_count(&[2, 0, 4]), 0);
    }

    #[test]
    fn test_row_major_strides() {
        assert_eq!(row_major_strides(&[]), Vec::<isize>::new());
        assert_eq!(row_major_strides(&[5]), vec![1]);
        assert_eq!(row_major_strides(&[2, 3, 4]), vec![12, 4, 1]);
    }

    #[test]
    fn test_linear_index_negative_stride() {
        // Reversed length-4 vector over a buffer: offset 3, stride -1.
        assert_eq!(linear_index(3, &[-1], &[0]), 3);
        assert_eq!(linear_index(3, &[-1], &[3]), 0);
    }

    #[test]
    fn test_packed_index_matches_strides() {
        let shape = [2, 3, 4];
        let strides = row_major_strides(&shape);
        for idx in IndexIter::new(&shape) {
            assert_eq!(
                packed_index(&shape, &idx),
                linear_index(0, &strides, &idx)
            );
        }
    }

    #[test]
    fn test_check_index() {
        assert!(check_index(&[2, 3], &[1, 2]).is_ok());
        assert!(check_index(&[2, 3], &[1, 3]).is_err());
        assert!(check_index(&[2, 3], &[1]).is_err());
        assert!(check_index(&[], &[]).is_ok());
    }

    #[test]
    fn test_join_shape() {
        assert_eq!(join_shape(&[2, 3], &[5, 3], 0).unwrap(), vec![7, 3]);
        assert!(join_shape(&[2, 3], &[5, 4], 0).is_err());
        assert!(join_shape(&[2, 3], &[2, 3], 2).is_err());
    }

    #[test]
    fn test_broadcast_lead() {
        assert_eq!(broadcast_lead(&[3], &[4, 3]).unwrap(), 1);
        assert_eq!(broadcast_lead(&[2, 3], &[2, 3]).unwrap(), 0);
        assert!(broadcast_lead(&[2, 3], &[3]).is_err());
        assert!(broadcast_lead(&[3], &[4, 5]).is_err());
    }

    #[test]
    fn test_is_packed() {
        assert!(is_packed(&[2, 3], &[3, 1], 0, 6));
        assert!(!is_packed(&[2, 3], &[1, 2], 0, 6)); // column-major
        assert!(!is_packed(&[2, 3], &[3, 1], 1, 7)); // offset window
        assert!(is_packed(&[], &[], 0, 1)); // packed scalar
        assert!(is_packed(&[1, 3], &[7, 1], 0, 3)); // unit dim stride ignored
    }

    #[test]
    fn test_index_iter_order() {
        let idx: Vec<_> = IndexIter::new(&[2, 2]).collect();
        assert_eq!(
            idx,
            vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]]
        );
    }

    #[test]
    fn test_index_iter_rank0_and_empty() {
        assert_eq!(IndexIter::new(&[]).count(), 1);
        assert_eq!(IndexIter::new(&[0, 3]).count(), 0);
    }
}
