//! Sparse storage: constants, single-element, sorted-index and hashed sets.
//!
//! Every sparse representation maintains one invariant: only non-zero values
//! are stored, and positions are implied zero unless present. Writing an
//! explicit zero either evicts the stored entry (hashed, index-mutable
//! sorted) or is rejected where the index structure is frozen. The sorted
//! variant answers `get` with a binary search and is the bulk-scan-friendly
//! choice; the hashed variant is the point-mutation-friendly one.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::{ArrayError, Result};

fn frozen_write(index: usize) -> ArrayError {
    ArrayError::ImmutableViolation {
        index: vec![index],
    }
}

// ============================================================================
// Constant (covers the zero array)
// ============================================================================

/// Virtual array repeating one value over an arbitrary shape. Immutable;
/// `value == 0.0` is the zero array of that shape. Also used to represent
/// the result of a uniform `f(0)` fill without data growth.
#[derive(Debug, Clone)]
pub(crate) struct ConstantData {
    pub shape: Vec<usize>,
    pub value: f64,
}

// ============================================================================
// Single-element vector
// ============================================================================

/// Rank-1 storage holding exactly one addressable slot. The held slot can be
/// overwritten with any non-zero value; every other write is rejected.
#[derive(Debug, Clone)]
pub(crate) struct SingleElementData {
    pub len: usize,
    pub index: usize,
    pub value: Rc<Cell<f64>>,
}

impl SingleElementData {
    pub fn new(len: usize, index: usize, value: f64) -> Result<Self> {
        if index >= len {
            return Err(ArrayError::IndexOutOfRange {
                index: vec![index],
                shape: vec![len],
            });
        }
        if value == 0.0 {
            return Err(ArrayError::InvariantViolation(
                "single-element vector must hold a non-zero value".into(),
            ));
        }
        Ok(SingleElementData {
            len,
            index,
            value: Rc::new(Cell::new(value)),
        })
    }

    #[inline]
    pub fn get(&self, i: usize) -> f64 {
        if i == self.index {
            self.value.get()
        } else {
            0.0
        }
    }

    pub fn set(&self, i: usize, v: f64) -> Result<()> {
        if i != self.index || v == 0.0 {
            return Err(frozen_write(i));
        }
        self.value.set(v);
        Ok(())
    }
}

// ============================================================================
// Sorted-index sparse
// ============================================================================

/// Parallel index/value arrays; indices strictly increasing, values
/// non-zero.
#[derive(Debug, Clone)]
pub(crate) struct SparseCells {
    pub indices: Vec<usize>,
    pub values: Vec<f64>,
}

impl SparseCells {
    #[inline]
    pub fn get(&self, i: usize) -> f64 {
        match self.indices.binary_search(&i) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Insert, overwrite or evict so that position `i` reads back `v`.
    pub fn put(&mut self, i: usize, v: f64) {
        match self.indices.binary_search(&i) {
            Ok(pos) => {
                if v == 0.0 {
                    // Storing an explicit zero evicts the index.
                    self.indices.remove(pos);
                    self.values.remove(pos);
                } else {
                    self.values[pos] = v;
                }
            }
            Err(pos) => {
                if v != 0.0 {
                    self.indices.insert(pos, i);
                    self.values.insert(pos, v);
                }
            }
        }
    }
}

/// Rank-1 sorted-index sparse storage.
///
/// `index_mutable` is the single mutability policy knob: when `false` the
/// index set is frozen at construction and only stored values may change
/// (to non-zero values, since eviction would alter the structure); when `true`
/// any position is settable, with insertion and zero-eviction re-sorting the
/// cell arrays.
#[derive(Debug, Clone)]
pub(crate) struct SparseIndexedData {
    pub len: usize,
    pub cells: Rc<RefCell<SparseCells>>,
    pub index_mutable: bool,
}

impl SparseIndexedData {
    pub fn new(
        len: usize,
        indices: Vec<usize>,
        values: Vec<f64>,
        index_mutable: bool,
    ) -> Result<Self> {
        if indices.len() != values.len() {
            return Err(ArrayError::InvariantViolation(
                "sparse index and value arrays differ in length".into(),
            ));
        }
        if !indices.windows(2).all(|w| w[0] < w[1]) {
            return Err(ArrayError::InvariantViolation(
                "sparse indices must be strictly increasing".into(),
            ));
        }
        if let Some(&last) = indices.last() {
            if last >= len {
                return Err(ArrayError::IndexOutOfRange {
                    index: vec![last],
                    shape: vec![len],
                });
            }
        }
        if values.iter().any(|&v| v == 0.0) {
            return Err(ArrayError::InvariantViolation(
                "sparse values must be non-zero".into(),
            ));
        }
        Ok(SparseIndexedData {
            len,
            cells: Rc::new(RefCell::new(SparseCells { indices, values })),
            index_mutable,
        })
    }

    #[inline]
    pub fn get(&self, i: usize) -> f64 {
        self.cells.borrow().get(i)
    }

    pub fn set(&self, i: usize, v: f64) -> Result<()> {
        let mut cells = self.cells.borrow_mut();
        if self.index_mutable {
            cells.put(i, v);
            return Ok(());
        }
        match cells.indices.binary_search(&i) {
            Ok(pos) if v != 0.0 => {
                cells.values[pos] = v;
                Ok(())
            }
            _ => Err(frozen_write(i)),
        }
    }

    pub fn non_zero_count(&self) -> usize {
        self.cells.borrow().indices.len()
    }

    /// Snapshot of the stored (index, value) pairs in index order.
    pub fn pairs(&self) -> Vec<(usize, f64)> {
        let cells = self.cells.borrow();
        cells
            .indices
            .iter()
            .copied()
            .zip(cells.values.iter().copied())
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        let cells = self.cells.borrow();
        let probe = Self::new(
            self.len,
            cells.indices.clone(),
            cells.values.clone(),
            self.index_mutable,
        );
        probe.map(|_| ())
    }
}

// ============================================================================
// Hashed sparse
// ============================================================================

/// Rank-1 hashed sparse storage: index -> non-zero value. O(1) average
/// get/set including arbitrary insertion; writing zero removes the entry.
#[derive(Debug, Clone)]
pub(crate) struct SparseHashedData {
    pub len: usize,
    pub map: Rc<RefCell<HashMap<usize, f64>>>,
}

impl SparseHashedData {
    pub fn zeros(len: usize) -> Self {
        SparseHashedData {
            len,
            map: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    pub fn from_pairs(len: usize, pairs: impl IntoIterator<Item = (usize, f64)>) -> Result<Self> {
        let out = Self::zeros(len);
        {
            let mut map = out.map.borrow_mut();
            for (i, v) in pairs {
                if i >= len {
                    return Err(ArrayError::IndexOutOfRange {
                        index: vec![i],
                        shape: vec![len],
                    });
                }
                if v != 0.0 {
                    map.insert(i, v);
                }
            }
        }
        Ok(out)
    }

    #[inline]
    pub fn get(&self, i: usize) -> f64 {
        self.map.borrow().get(&i).copied().unwrap_or(0.0)
    }

    pub fn set(&self, i: usize, v: f64) {
        let mut map = self.map.borrow_mut();
        if v == 0.0 {
            map.remove(&i);
        } else {
            map.insert(i, v);
        }
    }

    pub fn non_zero_count(&self) -> usize {
        self.map.borrow().len()
    }

    /// Snapshot of the stored (index, value) pairs, sorted by index.
    pub fn pairs(&self) -> Vec<(usize, f64)> {
        let mut pairs: Vec<_> = self
            .map
            .borrow()
            .iter()
            .map(|(&i, &v)| (i, v))
            .collect();
        pairs.sort_unstable_by_key(|&(i, _)| i);
        pairs
    }

    pub fn validate(&self) -> Result<()> {
        for (&i, &v) in self.map.borrow().iter() {
            if i >= self.len {
                return Err(ArrayError::InvariantViolation(format!(
                    "hashed sparse entry {} outside length {}",
                    i, self.len
                )));
            }
            if v == 0.0 {
                return Err(ArrayError::InvariantViolation(
                    "hashed sparse map stores an explicit zero".into(),
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Merge walk over two sorted non-zero sets
// ============================================================================

/// Walk the union of two sorted (index, value) snapshots, calling `f` with
/// the pair of values at each index where either side is non-zero. Neither
/// side is ever densified.
pub(crate) fn merge_nonzero(
    a: &[(usize, f64)],
    b: &[(usize, f64)],
    mut f: impl FnMut(usize, f64, f64),
) {
    let (mut i, mut j) = (0, 0);
    while i < a.len() || j < b.len() {
        match (a.get(i), b.get(j)) {
            (Some(&(ia, va)), Some(&(ib, vb))) => {
                if ia == ib {
                    f(ia, va, vb);
                    i += 1;
                    j += 1;
                } else if ia < ib {
                    f(ia, va, 0.0);
                    i += 1;
                } else {
                    f(ib, 0.0, vb);
                    j += 1;
                }
            }
            (Some(&(ia, va)), None) => {
                f(ia, va, 0.0);
                i += 1;
            }
            (None, Some(&(ib, vb))) => {
                f(ib, 0.0, vb);
                j += 1;
            }
            (None, None) => unreachable!(),
        }
    }
}
