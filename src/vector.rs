//! Rank-1 wrapper with the vector-specific API.
//!
//! A [`Vector`] is an [`Array`] whose rank is statically known to be 1, so
//! indexing takes a single coordinate and length questions need no rank
//! check. All storage strategies of `Array` are available through the
//! constructors here; `into_array`/`as_array` drop back to the generic
//! contract at any time (the wrapper and the array share storage).

use crate::array::{Array, Repr};
use crate::sparse::{SingleElementData, SparseHashedData, SparseIndexedData};
use crate::{ArrayError, Result};

/// A rank-1 array of `f64` values.
#[derive(Debug, Clone)]
pub struct Vector(Array);

impl Vector {
    /// Mutable dense vector of zeros.
    pub fn zeros(len: usize) -> Vector {
        Vector(Array::zeros(&[len]))
    }

    /// Immutable virtual zero vector.
    pub fn zero(len: usize) -> Vector {
        Vector(Array::zero(&[len]))
    }

    /// Immutable virtual vector repeating `value`.
    pub fn constant(len: usize, value: f64) -> Vector {
        Vector(Array::constant(&[len], value))
    }

    /// Wrap caller-supplied data as a mutable dense vector.
    pub fn from_vec(data: Vec<f64>) -> Vector {
        let len = data.len();
        Array::from_vec(&[len], data)
            .map(Vector)
            .unwrap_or_else(|_| unreachable!("length always matches"))
    }

    /// Sorted-index sparse vector. `index_mutable` picks the mutability
    /// policy: a frozen index set (values-only writes) or full insertion
    /// and eviction support.
    pub fn sparse_indexed(
        len: usize,
        indices: Vec<usize>,
        values: Vec<f64>,
        index_mutable: bool,
    ) -> Result<Vector> {
        let data = SparseIndexedData::new(len, indices, values, index_mutable)?;
        Ok(Vector(Array::with_repr(
            vec![len],
            Repr::SparseIndexed(data),
        )))
    }

    /// Empty hashed sparse vector: O(1) average point mutation anywhere.
    pub fn sparse_hashed(len: usize) -> Vector {
        Vector(Array::with_repr(
            vec![len],
            Repr::SparseHashed(SparseHashedData::zeros(len)),
        ))
    }

    /// Hashed sparse vector seeded from (index, value) pairs.
    pub fn sparse_hashed_from(
        len: usize,
        pairs: impl IntoIterator<Item = (usize, f64)>,
    ) -> Result<Vector> {
        let data = SparseHashedData::from_pairs(len, pairs)?;
        Ok(Vector(Array::with_repr(vec![len], Repr::SparseHashed(data))))
    }

    /// Vector holding exactly one non-zero slot.
    pub fn single_element(len: usize, index: usize, value: f64) -> Result<Vector> {
        let data = SingleElementData::new(len, index, value)?;
        Ok(Vector(Array::with_repr(
            vec![len],
            Repr::SingleElement(data),
        )))
    }

    /// Adopt a rank-1 array (shares its storage).
    pub fn from_array(array: Array) -> Result<Vector> {
        if array.rank() != 1 {
            return Err(ArrayError::UnsupportedRank {
                expected: 1,
                actual: array.rank(),
            });
        }
        Ok(Vector(array))
    }
}

impl Vector {
    #[inline]
    pub fn len(&self) -> usize {
        self.0.shape()[0]
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, i: usize) -> Result<f64> {
        self.0.get(&[i])
    }

    pub fn set(&mut self, i: usize, value: f64) -> Result<()> {
        self.0.set(&[i], value)
    }

    pub fn element_sum(&self) -> f64 {
        self.0.element_sum()
    }

    pub fn non_zero_count(&self) -> usize {
        self.0.non_zero_count()
    }

    pub fn dot(&self, other: &Vector) -> Result<f64> {
        self.0.dot(&other.0)
    }

    /// Euclidean norm.
    pub fn magnitude(&self) -> f64 {
        self.0
            .dot(&self.0)
            .unwrap_or_else(|_| unreachable!("a vector always dots with itself"))
            .sqrt()
    }

    /// Add `alpha * x` elementwise in place.
    pub fn axpy(&mut self, alpha: f64, x: &Vector) -> Result<()> {
        self.0.zip_apply(&x.0, |a, b| a + alpha * b)
    }

    /// A unit-magnitude copy; a zero vector comes back unchanged.
    pub fn normalized(&self) -> Vector {
        let m = self.magnitude();
        if m == 0.0 {
            return Vector(self.0.duplicate());
        }
        Vector(self.0.map(|x| x / m))
    }

    /// Dense vector of running prefix sums (inclusive).
    pub fn cumulative_sum(&self) -> Vector {
        let mut acc = 0.0;
        let data: Vec<f64> = self
            .0
            .elements()
            .map(|v| {
                acc += v;
                acc
            })
            .collect();
        Vector::from_vec(data)
    }

    /// The underlying array (same storage).
    pub fn as_array(&self) -> &Array {
        &self.0
    }

    pub fn as_array_mut(&mut self) -> &mut Array {
        &mut self.0
    }

    pub fn into_array(self) -> Array {
        self.0
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }
}

impl From<Vector> for Array {
    fn from(v: Vector) -> Array {
        v.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dense_vector_basics() {
        let mut v = Vector::from_vec(vec![1.0, 2.0, 3.0]);
        assert_eq!(v.len(), 3);
        v.set(1, 5.0).unwrap();
        assert_eq!(v.get(1).unwrap(), 5.0);
        assert!(v.get(3).is_err());
        assert_eq!(v.element_sum(), 9.0);
    }

    #[test]
    fn test_sparse_scenario() {
        // Length-5, non-zeros 2.0 at index 1 and 3.0 at index 3.
        let v = Vector::sparse_indexed(5, vec![1, 3], vec![2.0, 3.0], false).unwrap();
        assert_eq!(v.element_sum(), 5.0);
        assert_eq!(v.non_zero_count(), 2);
        let r = v.as_array().reciprocal();
        assert_eq!(r.get(&[0]).unwrap(), f64::INFINITY);
    }

    #[test]
    fn test_hashed_vector_point_mutation() {
        let mut v = Vector::sparse_hashed(100);
        v.set(42, 2.0).unwrap();
        v.set(7, 3.0).unwrap();
        assert_eq!(v.non_zero_count(), 2);
        v.set(42, 0.0).unwrap();
        assert_eq!(v.non_zero_count(), 1);
        assert!(v.as_array().is_fully_mutable());
    }

    #[test]
    fn test_single_element_partial_mutability() {
        let mut v = Vector::single_element(4, 2, 5.0).unwrap();
        assert!(v.as_array().is_mutable());
        assert!(!v.as_array().is_fully_mutable());
        v.set(2, 6.0).unwrap();
        assert!(v.set(0, 1.0).is_err());
    }

    #[test]
    fn test_magnitude_and_dot() {
        let a = Vector::from_vec(vec![3.0, 4.0]);
        assert_relative_eq!(a.magnitude(), 5.0);
        let b = Vector::from_vec(vec![1.0, 0.5]);
        assert_relative_eq!(a.dot(&b).unwrap(), 5.0);
    }

    #[test]
    fn test_from_array_rank_check() {
        assert!(Vector::from_array(Array::zeros(&[2, 2])).is_err());
        let v = Vector::from_array(Array::zeros(&[4])).unwrap();
        assert_eq!(v.len(), 4);
    }

    #[test]
    fn test_axpy() {
        let mut y = Vector::from_vec(vec![1.0, 2.0, 3.0]);
        let x = Vector::from_vec(vec![10.0, 20.0, 30.0]);
        y.axpy(0.5, &x).unwrap();
        assert_eq!(y.to_vec(), vec![6.0, 12.0, 18.0]);
        assert!(y.axpy(1.0, &Vector::zeros(2)).is_err());
    }

    #[test]
    fn test_normalized() {
        let v = Vector::from_vec(vec![3.0, 4.0]);
        let u = v.normalized();
        assert_relative_eq!(u.magnitude(), 1.0);
        assert_relative_eq!(u.get(0).unwrap(), 0.6);
        // The source is untouched.
        assert_eq!(v.get(0).unwrap(), 3.0);
        assert_eq!(Vector::zeros(3).normalized().to_vec(), vec![0.0; 3]);
    }

    #[test]
    fn test_cumulative_sum() {
        let v = Vector::from_vec(vec![1.0, 2.0, 3.0]);
        assert_eq!(v.cumulative_sum().to_vec(), vec![1.0, 3.0, 6.0]);
        let s = Vector::sparse_indexed(4, vec![1, 3], vec![2.0, 3.0], false).unwrap();
        assert_eq!(s.cumulative_sum().to_vec(), vec![0.0, 2.0, 2.0, 5.0]);
        assert!(Vector::zeros(0).cumulative_sum().is_empty());
    }
}
