//! Elementwise operations and reductions.
//!
//! Every operation has one *defining* semantics, expressed recursively: for
//! rank > 0 apply the operation to each slice and recurse; for rank 0 apply
//! it to the scalar value. The `*_recursive` free functions in this module
//! implement exactly that definition and are always correct for every
//! storage kind. The methods on [`Array`] are the fast paths (bulk buffer
//! scans for packed dense storage, non-zero-only walks for sparse storage,
//! closed forms for constants, joins and broadcasts), and each of them must
//! produce results identical to the recursive definition (the conformance
//! tests in `tests/correctness.rs` hold them to it).
//!
//! Binary operations follow the whole-dimension broadcast rule: equal ranks
//! require exactly equal shapes; a strictly-lower-rank right operand is
//! repeated once per leading index of the left one; rank-0 operands apply
//! everywhere. There is no size-1 dimension expansion.
//!
//! Unary transforms distinguish `f(0) == 0` from `f(0) != 0`. The former
//! preserve sparsity and touch only stored entries; the latter conceptually
//! fill the implicit zero region with `f(0)`: an empty sparse array
//! collapses to a repeated-constant virtual array, anything else
//! materializes densely. `reciprocal` on a sparse vector therefore reads
//! `+inf` at implicit zeros rather than silently keeping them.

use crate::array::{Array, Repr};
use crate::shape::IndexIter;
use crate::sparse::{merge_nonzero, SparseIndexedData};
use crate::{ArrayError, Result};

// ============================================================================
// Recursive reference definitions
// ============================================================================

/// Visit every element depth-first by recursive slice descent. This is the
/// defining order and semantics for all reductions.
pub fn for_each_recursive(a: &Array, f: &mut dyn FnMut(f64)) {
    if a.rank() == 0 {
        f(a.get_element(&[]));
        return;
    }
    for i in 0..a.shape()[0] {
        for_each_recursive(&a.slice_unchecked(0, i), f);
    }
}

/// Defining semantics of every in-place unary transform.
pub fn apply_recursive(a: &mut Array, f: &dyn Fn(f64) -> f64) -> Result<()> {
    if a.rank() == 0 {
        let v = a.get_element(&[]);
        let nv = f(v);
        if nv != v {
            a.set_element(&[], nv)?;
        }
        return Ok(());
    }
    for i in 0..a.shape()[0] {
        let mut s = a.slice_unchecked(0, i);
        apply_recursive(&mut s, f)?;
    }
    Ok(())
}

/// Defining semantics of every in-place binary operation between
/// shape-equal operands.
pub fn zip_apply_recursive(
    a: &mut Array,
    b: &Array,
    f: &dyn Fn(f64, f64) -> f64,
) -> Result<()> {
    debug_assert_eq!(a.shape(), b.shape());
    if a.rank() == 0 {
        let v = a.get_element(&[]);
        let nv = f(v, b.get_element(&[]));
        if nv != v {
            a.set_element(&[], nv)?;
        }
        return Ok(());
    }
    for i in 0..a.shape()[0] {
        let mut s = a.slice_unchecked(0, i);
        zip_apply_recursive(&mut s, &b.slice_unchecked(0, i), f)?;
    }
    Ok(())
}

/// Defining semantics of `element_sum`.
pub fn sum_recursive(a: &Array) -> f64 {
    let mut acc = 0.0;
    for_each_recursive(a, &mut |v| acc += v);
    acc
}

// ============================================================================
// In-place unary operations
// ============================================================================

impl Array {
    /// Set every element to `value`.
    pub fn fill(&mut self, value: f64) -> Result<()> {
        match &self.repr {
            Repr::Dense(d) => {
                d.fill(value);
                Ok(())
            }
            Repr::Strided(s) if s.is_packed() => {
                s.buf.with_mut(|b| b.fill(value));
                Ok(())
            }
            _ => self.apply_unary(|_| value),
        }
    }

    /// Transform every element in place with `f`.
    ///
    /// Sparse storage with a zero-preserving `f` touches stored entries
    /// only. A write that `f` makes necessary but the storage cannot
    /// represent (an insertion into a frozen index set, a fill of a
    /// constant) fails with an immutability error; writes that leave a
    /// value unchanged are not performed at all.
    pub fn apply_unary<F: Fn(f64) -> f64>(&mut self, f: F) -> Result<()> {
        self.apply_unary_impl(&f)
    }

    fn apply_unary_impl(&mut self, f: &dyn Fn(f64) -> f64) -> Result<()> {
        match &self.repr {
            Repr::Dense(d) => {
                d.buf.with_mut(|b| {
                    for x in b.iter_mut() {
                        *x = f(*x);
                    }
                });
                Ok(())
            }
            Repr::Strided(s) if s.is_packed() => {
                s.buf.with_mut(|b| {
                    for x in b.iter_mut() {
                        *x = f(*x);
                    }
                });
                Ok(())
            }
            Repr::SparseHashed(h) if f(0.0) == 0.0 => {
                for (i, v) in h.pairs() {
                    h.set(i, f(v));
                }
                Ok(())
            }
            Repr::SparseIndexed(s) if f(0.0) == 0.0 => {
                for (i, v) in s.pairs() {
                    let nv = f(v);
                    if nv != v {
                        s.set(i, nv)?;
                    }
                }
                Ok(())
            }
            _ => apply_recursive(self, f),
        }
    }

    /// Multiply every element by `factor` (zero-preserving, sparse-safe).
    pub fn scale(&mut self, factor: f64) -> Result<()> {
        self.apply_unary(|x| x * factor)
    }

    /// Negate every element in place.
    pub fn negate(&mut self) -> Result<()> {
        self.apply_unary(|x| -x)
    }

    /// Clamp every element into `[min, max]`.
    pub fn clamp(&mut self, min: f64, max: f64) -> Result<()> {
        if min > max {
            return Err(ArrayError::InvariantViolation(format!(
                "clamp range [{min}, {max}] is empty"
            )));
        }
        self.apply_unary(move |x| x.clamp(min, max))
    }
}

// ============================================================================
// Allocating unary operations
// ============================================================================

impl Array {
    /// A new array holding `f` of every element.
    ///
    /// Zero-preserving transforms keep sparse structure; others fill the
    /// implicit zero region with `f(0)`, collapsing to a virtual constant
    /// when nothing else is stored.
    pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Array {
        self.map_impl(&f)
    }

    fn map_impl(&self, f: &dyn Fn(f64) -> f64) -> Array {
        match &self.repr {
            Repr::Constant(c) => Array::constant(self.shape(), f(c.value)),
            Repr::Dense(_) => {
                let data = self.to_vec().into_iter().map(f).collect();
                Array::with_repr_dense(self.shape(), data)
            }
            Repr::Strided(s) if s.is_packed() => {
                let data = self.to_vec().into_iter().map(f).collect();
                Array::with_repr_dense(self.shape(), data)
            }
            Repr::SparseSlices(s) => {
                let mapped: Vec<Array> = s.slices.iter().map(|x| x.map_impl(f)).collect();
                Array::from_slices(mapped)
                    .unwrap_or_else(|_| unreachable!("mapped slices keep one shape"))
            }
            _ => {
                if let Some(pairs) = self.sparse_pairs() {
                    let fz = f(0.0);
                    if fz == 0.0 {
                        let len = self.shape()[0];
                        let mut indices = Vec::with_capacity(pairs.len());
                        let mut values = Vec::with_capacity(pairs.len());
                        for (i, v) in pairs {
                            let nv = f(v);
                            if nv != 0.0 {
                                indices.push(i);
                                values.push(nv);
                            }
                        }
                        let data = SparseIndexedData::new(len, indices, values, true)
                            .unwrap_or_else(|_| {
                                unreachable!("mapped pairs stay sorted and non-zero")
                            });
                        return Array::with_repr(vec![len], Repr::SparseIndexed(data));
                    }
                    if pairs.is_empty() {
                        // The whole region collapses to f(0): keep it virtual.
                        return Array::constant(self.shape(), fz);
                    }
                }
                Array::from_fn(self.shape(), |idx| f(self.get_element(idx)))
            }
        }
    }

    /// Elementwise reciprocal. Implicit sparse zeros read back `1/0 = +inf`.
    pub fn reciprocal(&self) -> Array {
        self.map(|x| 1.0 / x)
    }

    /// Elementwise `e^x`. Fills the implicit zero region of sparse storage
    /// with 1.
    pub fn exp(&self) -> Array {
        self.map(f64::exp)
    }

    /// Elementwise natural logarithm. Implicit sparse zeros read `-inf`.
    pub fn ln(&self) -> Array {
        self.map(f64::ln)
    }

    /// Elementwise square root (zero-preserving).
    pub fn sqrt(&self) -> Array {
        self.map(f64::sqrt)
    }

    /// Elementwise absolute value (zero-preserving).
    pub fn abs(&self) -> Array {
        self.map(f64::abs)
    }

    /// Elementwise power. Zero-preserving for positive exponents; a
    /// non-positive exponent fills the implicit zero region (`0^0 = 1`,
    /// negative exponents read `inf` at zeros).
    pub fn pow(&self, exponent: f64) -> Array {
        self.map(move |x| x.powf(exponent))
    }

    /// Elementwise floor (zero-preserving).
    pub fn floor(&self) -> Array {
        self.map(f64::floor)
    }

    /// Elementwise ceiling (zero-preserving).
    pub fn ceil(&self) -> Array {
        self.map(f64::ceil)
    }

    /// Elementwise rounding to nearest, ties away from zero
    /// (zero-preserving).
    pub fn round(&self) -> Array {
        self.map(f64::round)
    }

    /// Elementwise sign: -1, 0 or 1. `signum` in the `f64` sense maps 0 to
    /// 0 here so sparsity is preserved.
    pub fn sign(&self) -> Array {
        self.map(|x| {
            if x == 0.0 {
                0.0
            } else {
                x.signum()
            }
        })
    }

    /// Elementwise minimum with `other` into a new array.
    pub fn min_with(&self, other: &Array) -> Result<Array> {
        self.zip_with(other, f64::min)
    }

    /// Elementwise maximum with `other` into a new array.
    pub fn max_with(&self, other: &Array) -> Result<Array> {
        self.zip_with(other, f64::max)
    }
}

impl std::ops::Neg for &Array {
    type Output = Array;

    /// Elementwise negation into a new array (sparse structure preserved).
    fn neg(self) -> Array {
        self.map(|x| -x)
    }
}

impl Array {
    fn with_repr_dense(shape: &[usize], data: Vec<f64>) -> Array {
        Array::from_vec(shape, data)
            .unwrap_or_else(|_| unreachable!("element count is preserved"))
    }

    /// Sorted (index, value) snapshot of a rank-1 sparse representation.
    pub(crate) fn sparse_pairs(&self) -> Option<Vec<(usize, f64)>> {
        if self.rank() != 1 {
            return None;
        }
        match &self.repr {
            Repr::Constant(c) if c.value == 0.0 => Some(Vec::new()),
            Repr::SingleElement(s) => Some(vec![(s.index, s.value.get())]),
            Repr::SparseIndexed(s) => Some(s.pairs()),
            Repr::SparseHashed(h) => Some(h.pairs()),
            Repr::Immutable(inner) => inner.sparse_pairs(),
            _ => None,
        }
    }

    /// Right operand prepared for the broadcast rule, shape-equal to self.
    fn broadcast_operand(&self, other: &Array) -> Result<Array> {
        if other.rank() > self.rank() {
            return Err(ArrayError::ShapeMismatch(
                self.shape().to_vec(),
                other.shape().to_vec(),
            ));
        }
        if other.rank() == self.rank() {
            if other.shape() != self.shape() {
                return Err(ArrayError::ShapeMismatch(
                    self.shape().to_vec(),
                    other.shape().to_vec(),
                ));
            }
            return Ok(other.clone());
        }
        other.broadcast(self.shape())
    }
}

// ============================================================================
// Binary operations
// ============================================================================

impl Array {
    /// Combine with `other` elementwise into a new array.
    ///
    /// Applies the broadcast rule to `other`. Sparse operands under a
    /// zero-preserving `f` combine by walking the union of their non-zero
    /// index sets; no dense intermediate is built.
    pub fn zip_with<F: Fn(f64, f64) -> f64>(&self, other: &Array, f: F) -> Result<Array> {
        self.zip_impl(other, &f)
    }

    fn zip_impl(&self, other: &Array, f: &dyn Fn(f64, f64) -> f64) -> Result<Array> {
        let rhs = self.broadcast_operand(other)?;
        if let (Repr::Constant(a), Repr::Constant(b)) = (&self.repr, &rhs.repr) {
            return Ok(Array::constant(self.shape(), f(a.value, b.value)));
        }
        if self.rank() == 1 && f(0.0, 0.0) == 0.0 {
            if let (Some(a), Some(b)) = (self.sparse_pairs(), rhs.sparse_pairs()) {
                let len = self.shape()[0];
                let mut indices = Vec::new();
                let mut values = Vec::new();
                merge_nonzero(&a, &b, |i, x, y| {
                    let v = f(x, y);
                    if v != 0.0 {
                        indices.push(i);
                        values.push(v);
                    }
                });
                let data = SparseIndexedData::new(len, indices, values, true)
                    .unwrap_or_else(|_| unreachable!("merge walk stays sorted"));
                return Ok(Array::with_repr(vec![len], Repr::SparseIndexed(data)));
            }
        }
        Ok(Array::from_fn(self.shape(), |idx| {
            f(self.get_element(idx), rhs.get_element(idx))
        }))
    }

    /// Combine with `other` elementwise in place.
    pub fn zip_apply<F: Fn(f64, f64) -> f64>(&mut self, other: &Array, f: F) -> Result<()> {
        let rhs = self.broadcast_operand(other)?;
        if let (Repr::Dense(d), Some(s)) = (&self.repr, rhs.as_strided()) {
            if s.is_packed() && !d.buf.ptr_eq(&s.buf) {
                d.buf.with_mut(|dst| {
                    s.buf.with(|src| {
                        for (x, y) in dst.iter_mut().zip(src) {
                            *x = f(*x, *y);
                        }
                    })
                });
                return Ok(());
            }
        }
        zip_apply_recursive(self, &rhs, &f)
    }

    /// Elementwise sum into a new array.
    pub fn add(&self, other: &Array) -> Result<Array> {
        self.zip_with(other, |a, b| a + b)
    }

    /// Elementwise difference into a new array.
    pub fn sub(&self, other: &Array) -> Result<Array> {
        self.zip_with(other, |a, b| a - b)
    }

    /// Elementwise product into a new array.
    pub fn mul(&self, other: &Array) -> Result<Array> {
        self.zip_with(other, |a, b| a * b)
    }

    /// Elementwise quotient into a new array. Division by zero follows IEEE
    /// 754 (`inf`/`nan`), it is not an error.
    pub fn div(&self, other: &Array) -> Result<Array> {
        self.zip_with(other, |a, b| a / b)
    }

    /// Elementwise sum in place.
    pub fn add_assign_array(&mut self, other: &Array) -> Result<()> {
        self.zip_apply(other, |a, b| a + b)
    }

    /// Elementwise difference in place.
    pub fn sub_assign_array(&mut self, other: &Array) -> Result<()> {
        self.zip_apply(other, |a, b| a - b)
    }

    /// Elementwise product in place.
    pub fn mul_assign_array(&mut self, other: &Array) -> Result<()> {
        self.zip_apply(other, |a, b| a * b)
    }
}

// ============================================================================
// Reductions
// ============================================================================

impl Array {
    /// Sum of all elements.
    pub fn element_sum(&self) -> f64 {
        match &self.repr {
            Repr::Dense(d) => d.buf.with(|s| s.iter().sum()),
            Repr::Strided(s) if s.is_packed() => s.buf.with(|b| b.iter().sum()),
            Repr::Constant(c) => c.value * self.element_count() as f64,
            Repr::SingleElement(s) => s.value.get(),
            Repr::SparseIndexed(s) => s.pairs().iter().map(|&(_, v)| v).sum(),
            Repr::SparseHashed(h) => h.pairs().iter().map(|&(_, v)| v).sum(),
            Repr::SparseSlices(s) => s.slices.iter().map(Array::element_sum).sum(),
            Repr::Broadcast(b) => {
                let inner_count = b.inner.element_count();
                if inner_count == 0 {
                    0.0
                } else {
                    b.inner.element_sum() * (self.element_count() / inner_count) as f64
                }
            }
            Repr::Joined(j) => j.left.element_sum() + j.right.element_sum(),
            Repr::Immutable(inner) => inner.element_sum(),
            _ => sum_recursive(self),
        }
    }

    /// Smallest element; `+inf` for an empty array.
    pub fn element_min(&self) -> f64 {
        match &self.repr {
            Repr::Constant(c) if self.element_count() > 0 => c.value,
            _ => {
                if let Some(pairs) = self.sparse_pairs() {
                    let stored = pairs.iter().map(|&(_, v)| v).fold(f64::INFINITY, f64::min);
                    return if pairs.len() < self.element_count() {
                        stored.min(0.0)
                    } else {
                        stored
                    };
                }
                let mut acc = f64::INFINITY;
                for_each_recursive(self, &mut |v| acc = acc.min(v));
                acc
            }
        }
    }

    /// Largest element; `-inf` for an empty array.
    pub fn element_max(&self) -> f64 {
        match &self.repr {
            Repr::Constant(c) if self.element_count() > 0 => c.value,
            _ => {
                if let Some(pairs) = self.sparse_pairs() {
                    let stored = pairs
                        .iter()
                        .map(|&(_, v)| v)
                        .fold(f64::NEG_INFINITY, f64::max);
                    return if pairs.len() < self.element_count() {
                        stored.max(0.0)
                    } else {
                        stored
                    };
                }
                let mut acc = f64::NEG_INFINITY;
                for_each_recursive(self, &mut |v| acc = acc.max(v));
                acc
            }
        }
    }

    /// Number of non-zero elements.
    pub fn non_zero_count(&self) -> usize {
        match &self.repr {
            Repr::Dense(d) => d.buf.with(|s| s.iter().filter(|&&v| v != 0.0).count()),
            Repr::Constant(c) => {
                if c.value == 0.0 {
                    0
                } else {
                    self.element_count()
                }
            }
            Repr::SingleElement(_) => 1,
            Repr::SparseIndexed(s) => s.non_zero_count(),
            Repr::SparseHashed(h) => h.non_zero_count(),
            Repr::SparseSlices(s) => s.slices.iter().map(Array::non_zero_count).sum(),
            Repr::Broadcast(b) => {
                let inner_count = b.inner.element_count();
                if inner_count == 0 {
                    0
                } else {
                    b.inner.non_zero_count() * (self.element_count() / inner_count)
                }
            }
            Repr::Joined(j) => j.left.non_zero_count() + j.right.non_zero_count(),
            Repr::Immutable(inner) => inner.non_zero_count(),
            _ => {
                let mut n = 0;
                for_each_recursive(self, &mut |v| {
                    if v != 0.0 {
                        n += 1;
                    }
                });
                n
            }
        }
    }

    /// Whether every element is zero.
    pub fn is_zero(&self) -> bool {
        self.non_zero_count() == 0
    }

    /// Inner product of two equal-length vectors.
    ///
    /// Sparse operands are combined over their non-zero index sets only.
    pub fn dot(&self, other: &Array) -> Result<f64> {
        if self.rank() != 1 {
            return Err(ArrayError::UnsupportedRank {
                expected: 1,
                actual: self.rank(),
            });
        }
        if other.rank() != 1 {
            return Err(ArrayError::UnsupportedRank {
                expected: 1,
                actual: other.rank(),
            });
        }
        if self.shape() != other.shape() {
            return Err(ArrayError::ShapeMismatch(
                self.shape().to_vec(),
                other.shape().to_vec(),
            ));
        }
        if let (Some(a), Some(b)) = (self.sparse_pairs(), other.sparse_pairs()) {
            let mut acc = 0.0;
            merge_nonzero(&a, &b, |_, x, y| acc += x * y);
            return Ok(acc);
        }
        if let Some(pairs) = self.sparse_pairs().or_else(|| other.sparse_pairs()) {
            let dense = if self.sparse_pairs().is_some() {
                other
            } else {
                self
            };
            let mut acc = 0.0;
            for (i, v) in pairs {
                acc += v * dense.get_element(&[i]);
            }
            return Ok(acc);
        }
        let mut acc = 0.0;
        for i in 0..self.shape()[0] {
            acc += self.get_element(&[i]) * other.get_element(&[i]);
        }
        Ok(acc)
    }

    /// Exact elementwise equality. Shapes must match; representations need
    /// not. Sparse pairs are compared over the union of their index sets.
    pub fn eq_elements(&self, other: &Array) -> bool {
        self.approx_eq(other, 0.0)
    }

    /// Elementwise equality within an absolute tolerance.
    pub fn approx_eq(&self, other: &Array, tol: f64) -> bool {
        if self.shape() != other.shape() {
            return false;
        }
        if let (Some(a), Some(b)) = (self.sparse_pairs(), other.sparse_pairs()) {
            let mut equal = true;
            merge_nonzero(&a, &b, |_, x, y| {
                if (x - y).abs() > tol {
                    equal = false;
                }
            });
            return equal;
        }
        for idx in IndexIter::new(self.shape()) {
            let (a, b) = (self.get_element(&idx), other.get_element(&idx));
            if (a - b).abs() > tol {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vector;
    use approx::assert_relative_eq;

    fn dense(values: &[f64]) -> Array {
        Array::from_vec(&[values.len()], values.to_vec()).unwrap()
    }

    #[test]
    fn test_fill_and_scale() {
        let mut a = Array::zeros(&[2, 3]);
        a.fill(2.0).unwrap();
        assert_eq!(a.element_sum(), 12.0);
        a.scale(0.5).unwrap();
        assert_eq!(a.element_sum(), 6.0);
    }

    #[test]
    fn test_apply_through_view() {
        let m = Array::from_vec(&[2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let mut row = m.slice(1).unwrap();
        row.apply_unary(|x| x * 10.0).unwrap();
        assert_eq!(m.to_vec(), vec![1.0, 2.0, 30.0, 40.0]);
    }

    #[test]
    fn test_apply_sparse_zero_preserving() {
        let mut v = dense(&[0.0, 2.0, 0.0, 3.0]).to_sparse();
        v.scale(2.0).unwrap();
        assert_eq!(v.to_vec(), vec![0.0, 4.0, 0.0, 6.0]);
        assert_eq!(v.non_zero_count(), 2);
        assert!(v.is_sparse());
    }

    #[test]
    fn test_map_reciprocal_fills_implicit_zeros() {
        let v = Vector::sparse_indexed(5, vec![1, 3], vec![2.0, 4.0], false)
            .unwrap()
            .into_array();
        let r = v.reciprocal();
        assert_eq!(r.get(&[0]).unwrap(), f64::INFINITY);
        assert_eq!(r.get(&[1]).unwrap(), 0.5);
        assert_eq!(r.get(&[3]).unwrap(), 0.25);
    }

    #[test]
    fn test_map_empty_sparse_collapses_to_constant() {
        let z = Array::zero(&[4]);
        let e = z.exp();
        assert!(!e.is_view());
        assert_eq!(e.to_vec(), vec![1.0; 4]);
        // No data growth for the uniform fill.
        assert_eq!(e.non_zero_count(), 4);
        assert!(!e.is_mutable());
    }

    #[test]
    fn test_map_keeps_sparse_when_zero_preserving() {
        let v = dense(&[0.0, -2.0, 0.0, 3.0]).to_sparse();
        let a = v.abs();
        assert!(a.is_sparse());
        assert_eq!(a.to_vec(), vec![0.0, 2.0, 0.0, 3.0]);
    }

    #[test]
    fn test_clamp() {
        let mut a = dense(&[-2.0, 0.5, 3.0]);
        a.clamp(0.0, 1.0).unwrap();
        assert_eq!(a.to_vec(), vec![0.0, 0.5, 1.0]);
        assert!(a.clamp(2.0, 1.0).is_err());
    }

    #[test]
    fn test_add_equal_rank_shape_check() {
        let a = Array::zeros(&[2, 3]);
        let b = Array::zeros(&[3, 2]);
        assert!(matches!(a.add(&b), Err(ArrayError::ShapeMismatch(..))));
        // Higher-rank right operand is never broadcast.
        let c = Array::zeros(&[4, 2, 3]);
        assert!(a.add(&c).is_err());
    }

    #[test]
    fn test_add_broadcast_lower_rank() {
        let m = Array::from_vec(&[2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let row = dense(&[10.0, 20.0, 30.0]);
        let out = m.add(&row).unwrap();
        assert_eq!(out.to_vec(), vec![11.0, 22.0, 33.0, 14.0, 25.0, 36.0]);
    }

    #[test]
    fn test_add_scalar_operand() {
        let m = Array::from_vec(&[2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let out = m.add(&Array::scalar(0.5)).unwrap();
        assert_eq!(out.to_vec(), vec![1.5, 2.5, 3.5, 4.5]);
    }

    #[test]
    fn test_sparse_add_stays_sparse() {
        let a = Vector::sparse_indexed(6, vec![1, 3], vec![2.0, 3.0], false)
            .unwrap()
            .into_array();
        let b = Vector::sparse_indexed(6, vec![3, 5], vec![1.0, 4.0], false)
            .unwrap()
            .into_array();
        let out = a.add(&b).unwrap();
        assert!(out.is_sparse());
        assert_eq!(out.non_zero_count(), 3);
        assert_eq!(out.to_vec(), vec![0.0, 2.0, 0.0, 4.0, 0.0, 4.0]);
    }

    #[test]
    fn test_sparse_sub_cancellation_evicts() {
        let a = Vector::sparse_indexed(4, vec![2], vec![5.0], false)
            .unwrap()
            .into_array();
        let out = a.sub(&a).unwrap();
        assert_eq!(out.non_zero_count(), 0);
        assert!(out.is_zero());
    }

    #[test]
    fn test_zip_apply_in_place() {
        let mut a = Array::from_vec(&[2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let b = Array::from_vec(&[2, 2], vec![10.0, 10.0, 10.0, 10.0]).unwrap();
        a.add_assign_array(&b).unwrap();
        assert_eq!(a.to_vec(), vec![11.0, 12.0, 13.0, 14.0]);
        a.mul_assign_array(&a.clone()).unwrap();
        assert_eq!(a.get(&[0, 0]).unwrap(), 121.0);
    }

    #[test]
    fn test_reductions_dense() {
        let a = Array::from_vec(&[2, 3], vec![1.0, -2.0, 3.0, 0.0, 5.0, -6.0]).unwrap();
        assert_eq!(a.element_sum(), 1.0);
        assert_eq!(a.element_min(), -6.0);
        assert_eq!(a.element_max(), 5.0);
        assert_eq!(a.non_zero_count(), 5);
    }

    #[test]
    fn test_reductions_sparse_consider_implicit_zeros() {
        let v = Vector::sparse_indexed(5, vec![1, 3], vec![2.0, 3.0], false)
            .unwrap()
            .into_array();
        assert_eq!(v.element_sum(), 5.0);
        assert_eq!(v.non_zero_count(), 2);
        assert_eq!(v.element_min(), 0.0);
        assert_eq!(v.element_max(), 3.0);
    }

    #[test]
    fn test_reductions_virtual() {
        let c = Array::constant(&[2, 3], 2.0);
        assert_eq!(c.element_sum(), 12.0);
        let b = dense(&[1.0, 2.0]).broadcast(&[3, 2]).unwrap();
        assert_eq!(b.element_sum(), 9.0);
        assert_eq!(b.non_zero_count(), 6);
        let j = c.join(&Array::zero(&[2, 3]), 0).unwrap();
        assert_eq!(j.element_sum(), 12.0);
        assert_eq!(j.non_zero_count(), 6);
    }

    #[test]
    fn test_dot_sparse_dense() {
        let s = Vector::sparse_indexed(4, vec![0, 2], vec![2.0, 3.0], false)
            .unwrap()
            .into_array();
        let d = dense(&[1.0, 5.0, 2.0, 7.0]);
        assert_relative_eq!(s.dot(&d).unwrap(), 8.0);
        assert_relative_eq!(d.dot(&s).unwrap(), 8.0);
        assert_relative_eq!(s.dot(&s).unwrap(), 13.0);
        assert_relative_eq!(d.dot(&d).unwrap(), 79.0);
        assert!(s.dot(&dense(&[1.0])).is_err());
        assert!(s.dot(&Array::zeros(&[2, 2])).is_err());
    }

    #[test]
    fn test_eq_elements_across_representations() {
        let d = dense(&[0.0, 2.0, 0.0, 3.0]);
        let s = d.to_sparse();
        assert!(d.eq_elements(&s));
        assert!(s.eq_elements(&d));
        assert!(!s.eq_elements(&dense(&[0.0, 2.0, 0.0, 4.0])));
        assert!(!s.eq_elements(&Array::zeros(&[4])));
        assert!(Array::zero(&[4]).eq_elements(&Array::zeros(&[4])));
    }

    #[test]
    fn test_fast_paths_match_recursive_definition() {
        let arrays = vec![
            Array::scalar(3.0),
            dense(&[1.0, 0.0, -2.0]),
            Array::from_vec(&[2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap(),
            dense(&[0.0, 2.0, 0.0, 3.0]).to_sparse(),
            Array::constant(&[2, 2], 1.5),
            dense(&[1.0, 2.0]).broadcast(&[2, 3, 2]).unwrap(),
            dense(&[1.0, 2.0]).join(&dense(&[0.0, 4.0]), 0).unwrap(),
        ];
        for a in &arrays {
            assert_relative_eq!(a.element_sum(), sum_recursive(a), epsilon = 1e-12);
            let mut n = 0;
            for_each_recursive(a, &mut |v| {
                if v != 0.0 {
                    n += 1;
                }
            });
            assert_eq!(a.non_zero_count(), n);
        }
    }

    #[test]
    fn test_pow_and_sign() {
        let v = dense(&[0.0, 4.0, -9.0]);
        assert_eq!(v.pow(2.0).to_vec(), vec![0.0, 16.0, 81.0]);
        // 0^0 fills the zero region with 1.
        assert_eq!(v.pow(0.0).get(&[0]).unwrap(), 1.0);
        assert_eq!(v.sign().to_vec(), vec![0.0, 1.0, -1.0]);

        let s = dense(&[0.0, 4.0, 0.0]).to_sparse();
        assert!(s.pow(2.0).is_sparse());
        assert_eq!(s.pow(-1.0).get(&[0]).unwrap(), f64::INFINITY);
    }

    #[test]
    fn test_neg_operator() {
        let v = dense(&[1.0, 0.0, -2.0]);
        assert_eq!((-&v).to_vec(), vec![-1.0, 0.0, 2.0]);
        let s = dense(&[0.0, 3.0]).to_sparse();
        assert!((-&s).is_sparse());
    }

    #[test]
    fn test_rounding_family() {
        let v = dense(&[-1.5, 0.0, 2.3]);
        assert_eq!(v.floor().to_vec(), vec![-2.0, 0.0, 2.0]);
        assert_eq!(v.ceil().to_vec(), vec![-1.0, 0.0, 3.0]);
        assert_eq!(v.round().to_vec(), vec![-2.0, 0.0, 2.0]);
    }

    #[test]
    fn test_min_max_with() {
        let a = dense(&[1.0, 5.0, 3.0]);
        let b = dense(&[2.0, 4.0, 3.0]);
        assert_eq!(a.min_with(&b).unwrap().to_vec(), vec![1.0, 4.0, 3.0]);
        assert_eq!(a.max_with(&b).unwrap().to_vec(), vec![2.0, 5.0, 3.0]);
        assert!(a.min_with(&dense(&[1.0])).is_err());
    }

    #[test]
    fn test_immutable_rejects_elementwise_mutation() {
        let mut frozen = dense(&[1.0, 2.0]).immutable();
        assert!(matches!(
            frozen.fill(0.0),
            Err(ArrayError::ImmutableViolation { .. })
        ));
        assert!(frozen.scale(2.0).is_err());
    }
}
