//! Map-reduce over array elements and reductions along one dimension.
//!
//! [`Array::map_reduce`] is the workhorse: it folds a mapped value per
//! element into an accumulator, scanning the contiguous buffer directly for
//! packed dense storage and falling back to the recursive slice descent
//! everywhere else. The scalar reductions here (`mean`, `variance`, norms,
//! predicates) and the per-dimension reductions (`sum_dim`, `min_dim`,
//! `max_dim`) are all defined through it or through repeated elementwise
//! combination of slices, so they inherit the defining recursive semantics.

use crate::array::{Array, Repr};
use crate::ops::for_each_recursive;
use crate::shape::{self, IndexIter};
use crate::Result;

// ============================================================================
// Generic map-reduce
// ============================================================================

impl Array {
    /// Fold `fold(acc, map(element))` over every element, starting from
    /// `init`, in row-major order.
    pub fn map_reduce<U, M, R>(&self, map: M, fold: R, init: U) -> U
    where
        M: Fn(f64) -> U,
        R: Fn(U, U) -> U,
    {
        match &self.repr {
            Repr::Dense(d) => d.buf.with(|b| {
                let mut acc = init;
                for &v in b.iter() {
                    acc = fold(acc, map(v));
                }
                acc
            }),
            Repr::Strided(s) if s.is_packed() => s.buf.with(|b| {
                let mut acc = init;
                for &v in b.iter() {
                    acc = fold(acc, map(v));
                }
                acc
            }),
            Repr::Constant(c) => {
                let mut acc = init;
                for _ in 0..self.element_count() {
                    acc = fold(acc, map(c.value));
                }
                acc
            }
            Repr::Immutable(inner) => inner.map_reduce(map, fold, init),
            _ => {
                let mut acc = Some(init);
                for_each_recursive(self, &mut |v| {
                    let current = acc.take().unwrap_or_else(|| unreachable!("acc is always put back"));
                    acc = Some(fold(current, map(v)));
                });
                acc.unwrap_or_else(|| unreachable!("acc is always put back"))
            }
        }
    }

    /// Arithmetic mean of all elements; `NaN` for an empty array.
    pub fn mean(&self) -> f64 {
        self.element_sum() / self.element_count() as f64
    }

    /// Population variance of all elements; `NaN` for an empty array.
    ///
    /// Two-pass: the mean first, then the averaged squared deviation.
    pub fn variance(&self) -> f64 {
        let n = self.element_count();
        if n == 0 {
            return f64::NAN;
        }
        let m = self.mean();
        let sq = self.map_reduce(|v| (v - m) * (v - m), |a, b| a + b, 0.0);
        sq / n as f64
    }

    /// Population standard deviation.
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Product of all elements; 1 for an empty array.
    pub fn element_product(&self) -> f64 {
        match &self.repr {
            // Any implicit zero forces the product to zero.
            Repr::Constant(c) => {
                if self.element_count() == 0 {
                    1.0
                } else {
                    c.value.powi(self.element_count() as i32)
                }
            }
            _ => {
                if self.is_sparse() && self.non_zero_count() < self.element_count() {
                    return 0.0;
                }
                self.map_reduce(|v| v, |a, b| a * b, 1.0)
            }
        }
    }

    /// Sum of absolute values.
    pub fn norm_l1(&self) -> f64 {
        self.map_reduce(f64::abs, |a, b| a + b, 0.0)
    }

    /// Euclidean norm over all elements.
    pub fn norm_l2(&self) -> f64 {
        self.map_reduce(|v| v * v, |a, b| a + b, 0.0).sqrt()
    }

    /// Largest absolute value; 0 for an empty array.
    pub fn norm_max(&self) -> f64 {
        self.map_reduce(f64::abs, f64::max, 0.0)
    }

    /// Number of elements satisfying `pred`.
    pub fn count_where<P: Fn(f64) -> bool>(&self, pred: P) -> usize {
        self.map_reduce(|v| usize::from(pred(v)), |a, b| a + b, 0)
    }

    /// Whether every element satisfies `pred`; true for an empty array.
    pub fn all<P: Fn(f64) -> bool>(&self, pred: P) -> bool {
        self.map_reduce(&pred, |a, b| a && b, true)
    }

    /// Whether any element satisfies `pred`; false for an empty array.
    pub fn any<P: Fn(f64) -> bool>(&self, pred: P) -> bool {
        self.map_reduce(&pred, |a, b| a || b, false)
    }
}

// ============================================================================
// Extreme positions
// ============================================================================

impl Array {
    /// Index tuple of the smallest element, first in row-major order.
    /// `None` for an empty array.
    pub fn argmin(&self) -> Option<Vec<usize>> {
        self.arg_extreme(|candidate, best| candidate < best)
    }

    /// Index tuple of the largest element, first in row-major order.
    /// `None` for an empty array.
    pub fn argmax(&self) -> Option<Vec<usize>> {
        self.arg_extreme(|candidate, best| candidate > best)
    }

    fn arg_extreme(&self, better: impl Fn(f64, f64) -> bool) -> Option<Vec<usize>> {
        let mut best: Option<(Vec<usize>, f64)> = None;
        for idx in IndexIter::new(self.shape()) {
            let v = self.get_element(&idx);
            match &best {
                Some((_, b)) if !better(v, *b) => {}
                _ => best = Some((idx, v)),
            }
        }
        best.map(|(idx, _)| idx)
    }
}

// ============================================================================
// Reductions along one dimension
// ============================================================================

impl Array {
    /// Fold the slices along `dim` into a rank-(N-1) dense array.
    ///
    /// The result starts as `init` everywhere; each slice is combined in
    /// with `fold` elementwise, in index order.
    pub fn reduce_dim<R>(&self, dim: usize, init: f64, fold: R) -> Result<Array>
    where
        R: Fn(f64, f64) -> f64,
    {
        shape::check_dim(self.rank(), dim)?;
        let reduced: Vec<usize> = self
            .shape()
            .iter()
            .enumerate()
            .filter(|&(d, _)| d != dim)
            .map(|(_, &s)| s)
            .collect();
        let mut acc = Array::from_fn(&reduced, |_| init);
        for i in 0..self.shape()[dim] {
            acc.zip_apply(&self.slice_unchecked(dim, i), &fold)?;
        }
        Ok(acc)
    }

    /// Sum along `dim`, dropping that dimension.
    pub fn sum_dim(&self, dim: usize) -> Result<Array> {
        self.reduce_dim(dim, 0.0, |a, b| a + b)
    }

    /// Minimum along `dim`, dropping that dimension.
    pub fn min_dim(&self, dim: usize) -> Result<Array> {
        self.reduce_dim(dim, f64::INFINITY, f64::min)
    }

    /// Maximum along `dim`, dropping that dimension.
    pub fn max_dim(&self, dim: usize) -> Result<Array> {
        self.reduce_dim(dim, f64::NEG_INFINITY, f64::max)
    }

    /// Mean along `dim`, dropping that dimension.
    pub fn mean_dim(&self, dim: usize) -> Result<Array> {
        let mut acc = self.sum_dim(dim)?;
        let n = self.shape()[dim] as f64;
        acc.scale(1.0 / n)?;
        Ok(acc)
    }
}
