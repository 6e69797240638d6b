//! The dynamic-rank array type and its closed set of storage variants.
//!
//! [`Array`] is the single public entry point for every storage strategy.
//! Internally it is a shape vector plus a [`Repr`] tag; every operation
//! dispatches by matching on the tag. Variants fall into three groups:
//!
//! - roots that own storage: `Dense`, `SingleElement`, `SparseIndexed`,
//!   `SparseHashed`, `SparseSlices`
//! - virtual roots with no storage at all: `Constant`
//! - views that reference other arrays or buffers: `Strided`, `Broadcast`,
//!   `Joined`, `SliceView`, `Window`, `Immutable`
//!
//! `Clone` is a cheap handle copy: the clone aliases the same storage, so a
//! mutation through either handle is visible through both. Deep copies are
//! [`Array::duplicate`] (semantically equal, preferred representation) and
//! [`Array::exact_clone`] (same representation, structure preserved).

use std::rc::Rc;

use crate::buffer::Buffer;
use crate::dense::{DenseData, StridedData};
use crate::shape;
use crate::sparse::{
    ConstantData, SingleElementData, SparseHashedData, SparseIndexedData,
};
use crate::view::{BroadcastData, JoinedData, SliceViewData, WindowData};
use crate::{ArrayError, Result};

/// Closed set of storage variants behind [`Array`].
#[derive(Debug, Clone)]
pub(crate) enum Repr {
    Dense(DenseData),
    Strided(StridedData),
    Constant(ConstantData),
    SingleElement(SingleElementData),
    SparseIndexed(SparseIndexedData),
    SparseHashed(SparseHashedData),
    SparseSlices(SparseSlicesData),
    Broadcast(BroadcastData),
    Joined(JoinedData),
    SliceView(SliceViewData),
    Window(WindowData),
    Immutable(Box<Array>),
}

/// Rank-N sparse storage built from a list of rank-(N-1) slices sharing no
/// common buffer; the generalization of a sparse-row matrix.
#[derive(Debug, Clone)]
pub(crate) struct SparseSlicesData {
    pub slices: Rc<Vec<Array>>,
}

/// An N-dimensional array of `f64` values.
///
/// Rank 0 is a scalar, rank 1 a vector, rank 2 a matrix. The shape is the
/// ordered sequence of dimension sizes; `element_count` is its product. See
/// the crate docs for the aliasing rules shared by all view-producing
/// operations.
#[derive(Debug, Clone)]
pub struct Array {
    shape: Vec<usize>,
    pub(crate) repr: Repr,
}

// ============================================================================
// Construction
// ============================================================================

impl Array {
    pub(crate) fn with_repr(shape: Vec<usize>, repr: Repr) -> Array {
        Array { shape, repr }
    }

    /// Mutable dense array of zeros.
    pub fn zeros(shape: &[usize]) -> Array {
        Array::with_repr(shape.to_vec(), Repr::Dense(DenseData::zeros(shape)))
    }

    /// Immutable virtual zero array: O(1) storage regardless of shape.
    pub fn zero(shape: &[usize]) -> Array {
        Array::constant(shape, 0.0)
    }

    /// Immutable virtual array repeating `value` over `shape`.
    pub fn constant(shape: &[usize], value: f64) -> Array {
        Array::with_repr(
            shape.to_vec(),
            Repr::Constant(ConstantData {
                shape: shape.to_vec(),
                value,
            }),
        )
    }

    /// Mutable rank-0 scalar.
    pub fn scalar(value: f64) -> Array {
        Array::with_repr(
            Vec::new(),
            Repr::Dense(DenseData {
                buf: Buffer::from_vec(vec![value]),
                shape: Vec::new(),
            }),
        )
    }

    /// Wrap caller-supplied row-major data as a mutable dense array.
    ///
    /// Fails when the data length does not match the shape's element count.
    pub fn from_vec(shape: &[usize], data: Vec<f64>) -> Result<Array> {
        Ok(Array::with_repr(
            shape.to_vec(),
            Repr::Dense(DenseData::from_vec(shape, data)?),
        ))
    }

    /// Mutable dense array filled from a function of the index tuple.
    pub fn from_fn(shape: &[usize], mut f: impl FnMut(&[usize]) -> f64) -> Array {
        let data = shape::IndexIter::new(shape).map(|idx| f(&idx)).collect();
        Array::with_repr(
            shape.to_vec(),
            Repr::Dense(DenseData {
                buf: Buffer::from_vec(data),
                shape: shape.to_vec(),
            }),
        )
    }

    /// Rank-N sparse array from per-index rank-(N-1) slices.
    ///
    /// All slices must share one shape. The result owns the slice handles;
    /// its mutability is whatever the slices allow.
    pub fn from_slices(slices: Vec<Array>) -> Result<Array> {
        let inner = match slices.first() {
            Some(s) => s.shape().to_vec(),
            None => {
                return Err(ArrayError::InvariantViolation(
                    "cannot build an array from zero slices".into(),
                ))
            }
        };
        for s in &slices {
            if s.shape() != inner {
                return Err(ArrayError::ShapeMismatch(
                    s.shape().to_vec(),
                    inner.clone(),
                ));
            }
        }
        let mut full = Vec::with_capacity(inner.len() + 1);
        full.push(slices.len());
        full.extend_from_slice(&inner);
        Ok(Array::with_repr(
            full,
            Repr::SparseSlices(SparseSlicesData {
                slices: Rc::new(slices),
            }),
        ))
    }
}

// ============================================================================
// Shape
// ============================================================================

impl Array {
    /// Ordered per-dimension sizes.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of dimensions; 0 for scalars.
    #[inline]
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Size of dimension `dim`.
    pub fn dim(&self, dim: usize) -> Result<usize> {
        shape::check_dim(self.rank(), dim)?;
        Ok(self.shape[dim])
    }

    /// Total number of elements (1 for rank 0).
    #[inline]
    pub fn element_count(&self) -> usize {
        shape::element_count(&self.shape)
    }
}

// ============================================================================
// Element access
// ============================================================================

impl Array {
    /// Read the element at `index`, bounds-checked.
    pub fn get(&self, index: &[usize]) -> Result<f64> {
        shape::check_index(&self.shape, index)?;
        Ok(self.get_element(index))
    }

    /// Write the element at `index`, bounds-checked.
    ///
    /// Fails with an immutability error when this storage cannot represent
    /// the write; it never silently ignores it.
    pub fn set(&mut self, index: &[usize], value: f64) -> Result<()> {
        shape::check_index(&self.shape, index)?;
        self.set_element(index, value)
    }

    /// Read without bounds checks, for hot loops over pre-validated shapes.
    ///
    /// # Safety
    /// `index` must have arity `rank()` with every coordinate in range.
    #[inline]
    pub unsafe fn get_unchecked(&self, index: &[usize]) -> f64 {
        debug_assert!(shape::check_index(&self.shape, index).is_ok());
        self.get_element(index)
    }

    /// Write without bounds checks. Immutability is still enforced.
    ///
    /// # Safety
    /// `index` must have arity `rank()` with every coordinate in range.
    #[inline]
    pub unsafe fn set_unchecked(&mut self, index: &[usize], value: f64) -> Result<()> {
        debug_assert!(shape::check_index(&self.shape, index).is_ok());
        self.set_element(index, value)
    }

    /// Value of a rank-0 array.
    pub fn scalar_value(&self) -> Result<f64> {
        if self.rank() != 0 {
            return Err(ArrayError::UnsupportedRank {
                expected: 0,
                actual: self.rank(),
            });
        }
        Ok(self.get_element(&[]))
    }

    /// Set the value of a rank-0 array.
    pub fn set_scalar(&mut self, value: f64) -> Result<()> {
        if self.rank() != 0 {
            return Err(ArrayError::UnsupportedRank {
                expected: 0,
                actual: self.rank(),
            });
        }
        self.set_element(&[], value)
    }

    /// Pre-validated read; the dispatch every public accessor funnels into.
    pub(crate) fn get_element(&self, index: &[usize]) -> f64 {
        match &self.repr {
            Repr::Dense(d) => d.get(index),
            Repr::Strided(s) => s.get(index),
            Repr::Constant(c) => c.value,
            Repr::SingleElement(s) => s.get(index[0]),
            Repr::SparseIndexed(s) => s.get(index[0]),
            Repr::SparseHashed(s) => s.get(index[0]),
            Repr::SparseSlices(s) => s.slices[index[0]].get_element(&index[1..]),
            Repr::Broadcast(b) => {
                b.inner.get_element(&index[index.len() - b.inner.rank()..])
            }
            Repr::Joined(j) => {
                if index[j.dim] < j.split {
                    j.left.get_element(index)
                } else {
                    let mut idx = index.to_vec();
                    idx[j.dim] -= j.split;
                    j.right.get_element(&idx)
                }
            }
            Repr::SliceView(s) => {
                let mut idx = index.to_vec();
                idx.insert(s.dim, s.index);
                s.source.get_element(&idx)
            }
            Repr::Window(w) => {
                let idx: Vec<usize> =
                    index.iter().zip(&w.offsets).map(|(i, o)| i + o).collect();
                w.source.get_element(&idx)
            }
            Repr::Immutable(inner) => inner.get_element(index),
        }
    }

    /// Pre-validated write. Interior mutability lets views route writes into
    /// shared storage through a shared reference.
    pub(crate) fn set_element(&self, index: &[usize], value: f64) -> Result<()> {
        match &self.repr {
            Repr::Dense(d) => {
                d.set(index, value);
                Ok(())
            }
            Repr::Strided(s) => {
                s.set(index, value);
                Ok(())
            }
            Repr::Constant(_) | Repr::Broadcast(_) | Repr::Immutable(_) => {
                Err(ArrayError::ImmutableViolation {
                    index: index.to_vec(),
                })
            }
            Repr::SingleElement(s) => s.set(index[0], value),
            Repr::SparseIndexed(s) => s.set(index[0], value),
            Repr::SparseHashed(s) => {
                s.set(index[0], value);
                Ok(())
            }
            Repr::SparseSlices(s) => s.slices[index[0]].set_element(&index[1..], value),
            Repr::Joined(j) => {
                if index[j.dim] < j.split {
                    j.left.set_element(index, value)
                } else {
                    let mut idx = index.to_vec();
                    idx[j.dim] -= j.split;
                    j.right.set_element(&idx, value)
                }
            }
            Repr::SliceView(s) => {
                let mut idx = index.to_vec();
                idx.insert(s.dim, s.index);
                s.source.set_element(&idx, value)
            }
            Repr::Window(w) => {
                let idx: Vec<usize> =
                    index.iter().zip(&w.offsets).map(|(i, o)| i + o).collect();
                w.source.set_element(&idx, value)
            }
        }
    }
}

// ============================================================================
// Classification
// ============================================================================

impl Array {
    /// Whether some element can be changed through this handle.
    pub fn is_mutable(&self) -> bool {
        match &self.repr {
            Repr::Dense(_) | Repr::Strided(_) | Repr::SparseHashed(_) => true,
            Repr::SingleElement(_) => true,
            Repr::SparseIndexed(s) => s.index_mutable || s.non_zero_count() > 0,
            Repr::SparseSlices(s) => s.slices.iter().any(Array::is_mutable),
            Repr::Joined(j) => j.left.is_mutable() || j.right.is_mutable(),
            Repr::SliceView(s) => s.source.is_mutable(),
            Repr::Window(w) => w.source.is_mutable(),
            Repr::Constant(_) | Repr::Broadcast(_) | Repr::Immutable(_) => false,
        }
    }

    /// Whether every index is independently settable to an arbitrary value.
    pub fn is_fully_mutable(&self) -> bool {
        match &self.repr {
            Repr::Dense(_) | Repr::Strided(_) | Repr::SparseHashed(_) => true,
            Repr::SparseIndexed(s) => s.index_mutable,
            Repr::SparseSlices(s) => s.slices.iter().all(Array::is_fully_mutable),
            Repr::Joined(j) => j.left.is_fully_mutable() && j.right.is_fully_mutable(),
            Repr::SliceView(s) => s.source.is_fully_mutable(),
            Repr::Window(w) => w.source.is_fully_mutable(),
            Repr::SingleElement(_)
            | Repr::Constant(_)
            | Repr::Broadcast(_)
            | Repr::Immutable(_) => false,
        }
    }

    /// Whether this handle references storage it does not own.
    pub fn is_view(&self) -> bool {
        matches!(
            &self.repr,
            Repr::Strided(_)
                | Repr::Broadcast(_)
                | Repr::Joined(_)
                | Repr::SliceView(_)
                | Repr::Window(_)
                | Repr::Immutable(_)
        )
    }

    /// Whether the representation stores only non-zero elements.
    pub fn is_sparse(&self) -> bool {
        match &self.repr {
            Repr::SingleElement(_) | Repr::SparseIndexed(_) | Repr::SparseHashed(_) => true,
            Repr::Constant(c) => c.value == 0.0,
            Repr::SparseSlices(s) => s.slices.iter().any(Array::is_sparse),
            Repr::Immutable(inner) => inner.is_sparse(),
            _ => false,
        }
    }

    /// Whether the dense view exactly covers its buffer in canonical
    /// row-major order, enabling bulk operations.
    pub fn is_packed(&self) -> bool {
        match &self.repr {
            Repr::Dense(_) => true,
            Repr::Strided(s) => s.is_packed(),
            _ => false,
        }
    }
}

// ============================================================================
// Mutability conversion and cloning
// ============================================================================

impl Array {
    /// This handle if it is already fully mutable and not a view; otherwise
    /// a freshly materialized mutable dense copy.
    pub fn ensure_mutable(&self) -> Array {
        if self.is_fully_mutable() && !self.is_view() {
            self.clone()
        } else {
            self.to_dense()
        }
    }

    /// A read-only handle over the same elements, copying nothing.
    ///
    /// An already-immutable array comes back as an aliasing handle of
    /// itself.
    pub fn immutable(&self) -> Array {
        match &self.repr {
            Repr::Constant(_) | Repr::Immutable(_) => self.clone(),
            _ => Array::with_repr(
                self.shape.clone(),
                Repr::Immutable(Box::new(self.clone())),
            ),
        }
    }

    /// A writable array with the same elements, copying only when this
    /// handle is not already fully mutable.
    pub fn mutable(&self) -> Array {
        if self.is_fully_mutable() {
            self.clone()
        } else {
            self.to_dense()
        }
    }

    /// Semantically-equal deep copy in the representation's preferred
    /// materialized form: storage roots keep their kind, views materialize
    /// as packed dense arrays.
    pub fn duplicate(&self) -> Array {
        match &self.repr {
            Repr::Dense(_) => self.to_dense(),
            Repr::Constant(_) => self.clone(),
            Repr::SingleElement(_)
            | Repr::SparseIndexed(_)
            | Repr::SparseHashed(_)
            | Repr::SparseSlices(_) => self.exact_clone(),
            Repr::Immutable(inner) => inner.duplicate().immutable(),
            Repr::Strided(_)
            | Repr::Broadcast(_)
            | Repr::Joined(_)
            | Repr::SliceView(_)
            | Repr::Window(_) => self.to_dense(),
        }
    }

    /// Structure-preserving deep copy: the same representation over fresh
    /// storage, sharing nothing with this handle.
    pub fn exact_clone(&self) -> Array {
        let repr = match &self.repr {
            Repr::Dense(d) => Repr::Dense(DenseData {
                buf: d.buf.deep_clone(),
                shape: d.shape.clone(),
            }),
            Repr::Strided(s) => Repr::Strided(StridedData {
                buf: s.buf.deep_clone(),
                shape: s.shape.clone(),
                strides: s.strides.clone(),
                offset: s.offset,
            }),
            Repr::Constant(c) => Repr::Constant(c.clone()),
            Repr::SingleElement(s) => Repr::SingleElement(SingleElementData {
                len: s.len,
                index: s.index,
                value: Rc::new(std::cell::Cell::new(s.value.get())),
            }),
            Repr::SparseIndexed(s) => Repr::SparseIndexed(SparseIndexedData {
                len: s.len,
                cells: Rc::new(std::cell::RefCell::new(s.cells.borrow().clone())),
                index_mutable: s.index_mutable,
            }),
            Repr::SparseHashed(s) => Repr::SparseHashed(SparseHashedData {
                len: s.len,
                map: Rc::new(std::cell::RefCell::new(s.map.borrow().clone())),
            }),
            Repr::SparseSlices(s) => Repr::SparseSlices(SparseSlicesData {
                slices: Rc::new(s.slices.iter().map(Array::exact_clone).collect()),
            }),
            Repr::Broadcast(b) => Repr::Broadcast(BroadcastData {
                inner: Box::new(b.inner.exact_clone()),
            }),
            Repr::Joined(j) => Repr::Joined(JoinedData {
                left: Box::new(j.left.exact_clone()),
                right: Box::new(j.right.exact_clone()),
                dim: j.dim,
                split: j.split,
            }),
            Repr::SliceView(s) => Repr::SliceView(SliceViewData {
                source: Box::new(s.source.exact_clone()),
                dim: s.dim,
                index: s.index,
            }),
            Repr::Window(w) => Repr::Window(WindowData {
                source: Box::new(w.source.exact_clone()),
                offsets: w.offsets.clone(),
            }),
            Repr::Immutable(inner) => Repr::Immutable(Box::new(inner.exact_clone())),
        };
        Array::with_repr(self.shape.clone(), repr)
    }

    /// Packed dense deep copy of the elements.
    pub fn to_dense(&self) -> Array {
        Array::with_repr(
            self.shape.clone(),
            Repr::Dense(DenseData {
                buf: Buffer::from_vec(self.to_vec()),
                shape: self.shape.clone(),
            }),
        )
    }

    /// Sparse deep copy of the elements: sorted-index vectors at rank 1,
    /// slice lists above, a constant at rank 0. Dense arrays sparse-clone
    /// into a sparse copy rather than failing.
    pub fn to_sparse(&self) -> Array {
        match self.rank() {
            0 => Array::constant(&[], self.get_element(&[])),
            1 => {
                let len = self.shape[0];
                let mut indices = Vec::new();
                let mut values = Vec::new();
                for i in 0..len {
                    let v = self.get_element(&[i]);
                    if v != 0.0 {
                        indices.push(i);
                        values.push(v);
                    }
                }
                let data = SparseIndexedData::new(len, indices, values, true)
                    .unwrap_or_else(|_| unreachable!("scan produces sorted non-zero cells"));
                Array::with_repr(vec![len], Repr::SparseIndexed(data))
            }
            _ => {
                let slices: Vec<Array> = (0..self.shape[0])
                    .map(|i| self.slice_unchecked(0, i).to_sparse())
                    .collect();
                Array::with_repr(
                    self.shape.clone(),
                    Repr::SparseSlices(SparseSlicesData {
                        slices: Rc::new(slices),
                    }),
                )
            }
        }
    }
}

// ============================================================================
// Bulk extraction
// ============================================================================

impl Array {
    /// Row-major copy of every element into a fresh `Vec`.
    pub fn to_vec(&self) -> Vec<f64> {
        match &self.repr {
            Repr::Dense(d) => d.buf.to_vec(),
            Repr::Strided(s) if s.contiguous_span().is_some() => {
                let (start, len) = s
                    .contiguous_span()
                    .unwrap_or_else(|| unreachable!("guard checked the span"));
                s.buf.with(|b| b[start..start + len].to_vec())
            }
            Repr::Constant(c) => vec![c.value; self.element_count()],
            _ => {
                let mut out = Vec::with_capacity(self.element_count());
                for idx in shape::IndexIter::new(&self.shape) {
                    out.push(self.get_element(&idx));
                }
                out
            }
        }
    }

    /// Copy every element, row-major, into `dest` starting at `offset`.
    pub fn copy_elements_to(&self, dest: &mut [f64], offset: usize) -> Result<()> {
        let count = self.element_count();
        if offset + count > dest.len() {
            return Err(ArrayError::IndexOutOfRange {
                index: vec![offset + count],
                shape: vec![dest.len()],
            });
        }
        match &self.repr {
            Repr::Dense(d) => d.buf.with(|s| dest[offset..offset + count].copy_from_slice(s)),
            Repr::Strided(s) if s.contiguous_span().is_some() => {
                let (start, len) = s
                    .contiguous_span()
                    .unwrap_or_else(|| unreachable!("guard checked the span"));
                s.buf
                    .with(|b| dest[offset..offset + count].copy_from_slice(&b[start..start + len]))
            }
            Repr::Constant(c) => dest[offset..offset + count].fill(c.value),
            _ => {
                for (k, idx) in shape::IndexIter::new(&self.shape).enumerate() {
                    dest[offset + k] = self.get_element(&idx);
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Self-check
// ============================================================================

impl Array {
    /// Internal consistency check, intended for tests and debugging rather
    /// than normal control flow.
    pub fn validate(&self) -> Result<()> {
        fn mismatch(what: &str) -> ArrayError {
            ArrayError::InvariantViolation(format!("{what} inconsistent with array shape"))
        }
        match &self.repr {
            Repr::Dense(d) => {
                if d.shape != self.shape {
                    return Err(mismatch("dense storage shape"));
                }
                d.validate()
            }
            Repr::Strided(s) => {
                if s.shape != self.shape {
                    return Err(mismatch("strided descriptor shape"));
                }
                s.validate()
            }
            Repr::Constant(c) => {
                if c.shape != self.shape {
                    return Err(mismatch("constant shape"));
                }
                Ok(())
            }
            Repr::SingleElement(s) => {
                if self.shape != [s.len] {
                    return Err(mismatch("single-element length"));
                }
                if s.index >= s.len || s.value.get() == 0.0 {
                    return Err(ArrayError::InvariantViolation(
                        "single-element cell out of range or zero".into(),
                    ));
                }
                Ok(())
            }
            Repr::SparseIndexed(s) => {
                if self.shape != [s.len] {
                    return Err(mismatch("sparse vector length"));
                }
                s.validate()
            }
            Repr::SparseHashed(s) => {
                if self.shape != [s.len] {
                    return Err(mismatch("hashed vector length"));
                }
                s.validate()
            }
            Repr::SparseSlices(s) => {
                if self.shape.first() != Some(&s.slices.len()) {
                    return Err(mismatch("slice count"));
                }
                for slice in s.slices.iter() {
                    if slice.shape() != &self.shape[1..] {
                        return Err(mismatch("slice shape"));
                    }
                    slice.validate()?;
                }
                Ok(())
            }
            Repr::Broadcast(b) => {
                shape::broadcast_lead(b.inner.shape(), &self.shape)
                    .map_err(|_| mismatch("broadcast shapes"))?;
                b.inner.validate()
            }
            Repr::Joined(j) => {
                let joined = shape::join_shape(j.left.shape(), j.right.shape(), j.dim)
                    .map_err(|_| mismatch("joined operand shapes"))?;
                if joined != self.shape || j.split != j.left.shape()[j.dim] {
                    return Err(mismatch("join split point"));
                }
                j.left.validate()?;
                j.right.validate()
            }
            Repr::SliceView(s) => {
                if s.source.rank() != self.rank() + 1
                    || s.index >= s.source.shape()[s.dim]
                {
                    return Err(mismatch("slice view coordinates"));
                }
                s.source.validate()
            }
            Repr::Window(w) => {
                shape::check_window(w.source.shape(), &w.offsets, &self.shape)
                    .map_err(|_| mismatch("window bounds"))?;
                w.source.validate()
            }
            Repr::Immutable(inner) => {
                if inner.shape() != self.shape {
                    return Err(mismatch("immutable wrapper shape"));
                }
                inner.validate()
            }
        }
    }
}
