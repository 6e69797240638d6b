//! Dense storage: packed buffers and strided descriptors.
//!
//! [`DenseData`] is the efficient subtype: its buffer is covered exactly, in
//! canonical row-major order, so bulk operations (fill, whole-buffer scans,
//! `memcpy`-style extraction) can bypass per-element indexing. Every other
//! double-buffer-backed layout (offset windows, transposes, reversed axes,
//! column views) is a [`StridedData`]: the same shared buffer plus an
//! offset/stride descriptor.

use crate::buffer::Buffer;
use crate::shape;
use crate::{ArrayError, Result};

/// Packed row-major storage. Offset 0, canonical strides, buffer length
/// equal to the element count; all of that is implied rather than stored.
#[derive(Debug, Clone)]
pub(crate) struct DenseData {
    pub buf: Buffer,
    pub shape: Vec<usize>,
}

impl DenseData {
    pub fn zeros(shape: &[usize]) -> Self {
        DenseData {
            buf: Buffer::zeros(shape::element_count(shape)),
            shape: shape.to_vec(),
        }
    }

    pub fn from_vec(shape: &[usize], data: Vec<f64>) -> Result<Self> {
        if data.len() != shape::element_count(shape) {
            return Err(ArrayError::InvariantViolation(format!(
                "buffer of {} elements cannot back shape {:?}",
                data.len(),
                shape
            )));
        }
        Ok(DenseData {
            buf: Buffer::from_vec(data),
            shape: shape.to_vec(),
        })
    }

    #[inline]
    pub fn get(&self, index: &[usize]) -> f64 {
        self.buf.get(shape::packed_index(&self.shape, index))
    }

    #[inline]
    pub fn set(&self, index: &[usize], value: f64) {
        self.buf.set(shape::packed_index(&self.shape, index), value);
    }

    pub fn fill(&self, value: f64) {
        self.buf.with_mut(|s| s.fill(value));
    }

    pub fn validate(&self) -> Result<()> {
        if self.buf.len() != shape::element_count(&self.shape) {
            return Err(ArrayError::InvariantViolation(format!(
                "packed buffer length {} does not match shape {:?}",
                self.buf.len(),
                self.shape
            )));
        }
        Ok(())
    }
}

/// General strided storage: a shared buffer plus offset and per-dimension
/// strides. Strides may be negative (reversed axes) or permuted
/// (transposes); a `StridedData` is always a view over some root buffer.
#[derive(Debug, Clone)]
pub(crate) struct StridedData {
    pub buf: Buffer,
    pub shape: Vec<usize>,
    pub strides: Vec<isize>,
    pub offset: usize,
}

impl StridedData {
    #[inline]
    pub fn position(&self, index: &[usize]) -> usize {
        shape::linear_index(self.offset, &self.strides, index)
    }

    #[inline]
    pub fn get(&self, index: &[usize]) -> f64 {
        self.buf.get(self.position(index))
    }

    #[inline]
    pub fn set(&self, index: &[usize], value: f64) {
        self.buf.set(self.position(index), value);
    }

    /// Whether this view covers its buffer exactly with canonical row-major
    /// strides, i.e. it could have been a `DenseData`.
    pub fn is_packed(&self) -> bool {
        shape::is_packed(&self.shape, &self.strides, self.offset, self.buf.len())
    }

    /// The `(start, length)` buffer range this view covers when its
    /// elements are contiguous in row-major order (row slices, leading-dim
    /// windows), enabling bulk copies without per-element indexing.
    pub fn contiguous_span(&self) -> Option<(usize, usize)> {
        let canonical = shape::row_major_strides(&self.shape);
        for d in 0..self.shape.len() {
            if self.shape[d] > 1 && self.strides[d] != canonical[d] {
                return None;
            }
        }
        Some((self.offset, shape::element_count(&self.shape)))
    }

    /// Drop dimension `dim` by fixing it at `index`. Caller validates.
    pub fn slice_dim(&self, dim: usize, index: usize) -> StridedData {
        let mut s = self.shape.clone();
        let mut st = self.strides.clone();
        s.remove(dim);
        let stride = st.remove(dim);
        StridedData {
            buf: self.buf.clone(),
            shape: s,
            strides: st,
            offset: (self.offset as isize + index as isize * stride) as usize,
        }
    }

    /// Rectangular window at `offsets` of extent `window`. Caller validates.
    pub fn window(&self, offsets: &[usize], window: &[usize]) -> StridedData {
        StridedData {
            buf: self.buf.clone(),
            shape: window.to_vec(),
            strides: self.strides.clone(),
            offset: self.position(offsets),
        }
    }

    /// Reorder dimensions according to `perm`. Caller validates the
    /// permutation.
    pub fn permute(&self, perm: &[usize]) -> StridedData {
        StridedData {
            buf: self.buf.clone(),
            shape: perm.iter().map(|&d| self.shape[d]).collect(),
            strides: perm.iter().map(|&d| self.strides[d]).collect(),
            offset: self.offset,
        }
    }

    /// Reverse dimension `dim` by negating its stride. Caller validates.
    pub fn reverse_dim(&self, dim: usize) -> StridedData {
        let mut out = self.clone();
        if self.shape[dim] > 0 {
            out.offset = (self.offset as isize
                + (self.shape[dim] as isize - 1) * self.strides[dim])
                as usize;
            out.strides[dim] = -self.strides[dim];
        }
        out
    }

    /// Check that every addressable position lands inside the buffer.
    pub fn validate(&self) -> Result<()> {
        if self.strides.len() != self.shape.len() {
            return Err(ArrayError::InvariantViolation(
                "stride descriptor arity does not match shape".into(),
            ));
        }
        if shape::element_count(&self.shape) == 0 {
            return Ok(());
        }
        // Extreme corners of the index box bound every reachable position.
        let mut lo = self.offset as isize;
        let mut hi = self.offset as isize;
        for d in 0..self.shape.len() {
            let span = (self.shape[d] as isize - 1) * self.strides[d];
            if span < 0 {
                lo += span;
            } else {
                hi += span;
            }
        }
        if lo < 0 || hi >= self.buf.len() as isize {
            return Err(ArrayError::InvariantViolation(format!(
                "strided view spans positions {}..={} outside buffer of length {}",
                lo,
                hi,
                self.buf.len()
            )));
        }
        Ok(())
    }
}

impl From<&DenseData> for StridedData {
    /// View a packed array through an explicit stride descriptor.
    fn from(d: &DenseData) -> StridedData {
        StridedData {
            buf: d.buf.clone(),
            strides: shape::row_major_strides(&d.shape),
            shape: d.shape.clone(),
            offset: 0,
        }
    }
}
