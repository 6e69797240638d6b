//! View composition: slices, windows, joins, broadcasts, transposes,
//! rotations.
//!
//! Every operation here returns a new lightweight `Array` handle that
//! aliases existing storage; nothing is copied unless explicitly noted.
//! Operations compose freely: `rotate_view` is nothing but two windows
//! joined in reversed order, and a slice of a join routes into whichever
//! operand holds the coordinate.
//!
//! Where the source has a stride descriptor (dense or strided storage), the
//! composed view is itself a strided descriptor over the same buffer, the
//! fast representation. Every other source gets a generic routing view
//! (`SliceView`, `Window`) that rewrites coordinates and delegates, which is
//! what keeps slicing uniform across sparse, joined and broadcast storage.

use crate::array::{Array, Repr};
use crate::dense::StridedData;
use crate::shape;
use crate::sparse::ConstantData;
use crate::{ArrayError, Result};

/// Virtual repetition of a lower-rank array across new leading dimensions.
/// The inner array is shared, not copied, so every repeated slice is the
/// same object; broadcast views are therefore never writable.
#[derive(Debug, Clone)]
pub(crate) struct BroadcastData {
    pub inner: Box<Array>,
}

/// Virtual concatenation of two arrays along one dimension. `split` is the
/// extent of the left operand along `dim`; reads and writes route by
/// comparing the coordinate against it.
#[derive(Debug, Clone)]
pub(crate) struct JoinedData {
    pub left: Box<Array>,
    pub right: Box<Array>,
    pub dim: usize,
    pub split: usize,
}

/// Generic rank-reducing view: fixes `source`'s dimension `dim` at `index`
/// and delegates with the coordinate re-inserted.
#[derive(Debug, Clone)]
pub(crate) struct SliceViewData {
    pub source: Box<Array>,
    pub dim: usize,
    pub index: usize,
}

/// Generic rectangular window view over a non-strided source.
#[derive(Debug, Clone)]
pub(crate) struct WindowData {
    pub source: Box<Array>,
    pub offsets: Vec<usize>,
}

impl Array {
    /// Stride descriptor over the backing buffer, when this representation
    /// has one.
    pub(crate) fn as_strided(&self) -> Option<StridedData> {
        match &self.repr {
            Repr::Dense(d) => Some(StridedData::from(d)),
            Repr::Strided(s) => Some(s.clone()),
            _ => None,
        }
    }
}

// ============================================================================
// Slicing
// ============================================================================

impl Array {
    /// Fix the first dimension at `index`, dropping one rank. A rank-1
    /// array slices to a rank-0 scalar view over the same storage.
    pub fn slice(&self, index: usize) -> Result<Array> {
        self.slice_dim(0, index)
    }

    /// Fix dimension `dim` at `index`, dropping one rank.
    pub fn slice_dim(&self, dim: usize, index: usize) -> Result<Array> {
        shape::check_dim(self.rank(), dim)?;
        if index >= self.shape()[dim] {
            return Err(ArrayError::IndexOutOfRange {
                index: vec![index],
                shape: vec![self.shape()[dim]],
            });
        }
        Ok(self.slice_unchecked(dim, index))
    }

    /// Slice with pre-validated coordinates; the routing core of
    /// `slice_dim` and the iterators.
    pub(crate) fn slice_unchecked(&self, dim: usize, index: usize) -> Array {
        debug_assert!(dim < self.rank() && index < self.shape()[dim]);
        let mut reduced = self.shape().to_vec();
        reduced.remove(dim);

        if let Some(s) = self.as_strided() {
            return Array::with_repr(reduced, Repr::Strided(s.slice_dim(dim, index)));
        }
        match &self.repr {
            Repr::Constant(c) => Array::constant(&reduced, c.value),
            Repr::SparseSlices(s) if dim == 0 => s.slices[index].clone(),
            Repr::Broadcast(b) => {
                let lead = self.rank() - b.inner.rank();
                if dim < lead {
                    if lead == 1 {
                        (*b.inner).clone()
                    } else {
                        Array::with_repr(reduced, Repr::Broadcast(b.clone()))
                    }
                } else {
                    let inner = b.inner.slice_unchecked(dim - lead, index);
                    if inner.rank() == reduced.len() {
                        inner
                    } else {
                        Array::with_repr(
                            reduced,
                            Repr::Broadcast(BroadcastData {
                                inner: Box::new(inner),
                            }),
                        )
                    }
                }
            }
            Repr::Joined(j) if dim == j.dim => {
                if index < j.split {
                    j.left.slice_unchecked(dim, index)
                } else {
                    j.right.slice_unchecked(dim, index - j.split)
                }
            }
            Repr::Joined(j) => {
                let adjusted = if j.dim > dim { j.dim - 1 } else { j.dim };
                Array::with_repr(
                    reduced,
                    Repr::Joined(JoinedData {
                        left: Box::new(j.left.slice_unchecked(dim, index)),
                        right: Box::new(j.right.slice_unchecked(dim, index)),
                        dim: adjusted,
                        split: j.split,
                    }),
                )
            }
            Repr::Immutable(inner) => inner.slice_unchecked(dim, index).immutable(),
            _ => Array::with_repr(
                reduced,
                Repr::SliceView(SliceViewData {
                    source: Box::new(self.clone()),
                    dim,
                    index,
                }),
            ),
        }
    }

    /// Number of slices along the first dimension.
    pub fn slice_count(&self) -> Result<usize> {
        self.dim(0)
    }
}

// ============================================================================
// Windows
// ============================================================================

impl Array {
    /// Rectangular window view at `offsets` with extent `window`.
    ///
    /// Returns an aliasing handle of the whole array when the window covers
    /// it entirely at zero offset.
    pub fn sub_array(&self, offsets: &[usize], window: &[usize]) -> Result<Array> {
        shape::check_window(self.shape(), offsets, window)?;
        if offsets.iter().all(|&o| o == 0) && window == self.shape() {
            return Ok(self.clone());
        }
        if let Some(s) = self.as_strided() {
            return Ok(Array::with_repr(
                window.to_vec(),
                Repr::Strided(s.window(offsets, window)),
            ));
        }
        Ok(match &self.repr {
            Repr::Constant(c) => Array::constant(window, c.value),
            Repr::Immutable(inner) => inner.sub_array(offsets, window)?.immutable(),
            _ => Array::with_repr(
                window.to_vec(),
                Repr::Window(WindowData {
                    source: Box::new(self.clone()),
                    offsets: offsets.to_vec(),
                }),
            ),
        })
    }
}

// ============================================================================
// Join
// ============================================================================

impl Array {
    /// Virtual concatenation with `other` along `dim`; no data moves.
    ///
    /// Every dimension other than `dim` must match exactly.
    pub fn join(&self, other: &Array, dim: usize) -> Result<Array> {
        let joined = shape::join_shape(self.shape(), other.shape(), dim)?;
        // Two constants of one value join into a larger constant.
        if let (Repr::Constant(a), Repr::Constant(b)) = (&self.repr, &other.repr) {
            if a.value == b.value {
                return Ok(Array::constant(&joined, a.value));
            }
        }
        Ok(Array::with_repr(
            joined,
            Repr::Joined(JoinedData {
                left: Box::new(self.clone()),
                right: Box::new(other.clone()),
                dim,
                split: self.shape()[dim],
            }),
        ))
    }
}

impl Array {
    /// Split into two window views along `dim` at index `at`: the first
    /// covers `[0, at)`, the second `[at, extent)`. Inverse of [`join`]:
    /// joining the pair along `dim` reads back the original elements.
    ///
    /// [`join`]: Array::join
    pub fn split_dim(&self, dim: usize, at: usize) -> Result<(Array, Array)> {
        shape::check_dim(self.rank(), dim)?;
        let extent = self.shape()[dim];
        if at > extent {
            return Err(ArrayError::IndexOutOfRange {
                index: vec![at],
                shape: self.shape().to_vec(),
            });
        }
        let mut offsets = vec![0; self.rank()];
        let mut window = self.shape().to_vec();
        window[dim] = at;
        let front = self.sub_array(&offsets, &window)?;
        offsets[dim] = at;
        window[dim] = extent - at;
        let back = self.sub_array(&offsets, &window)?;
        Ok((front, back))
    }
}

// ============================================================================
// Broadcast
// ============================================================================

impl Array {
    /// Virtual expansion to `target` by repeating this array once per new
    /// leading index. Equal shapes come back as an aliasing handle; a
    /// lower-rank target or mismatched trailing dimensions fail.
    pub fn broadcast(&self, target: &[usize]) -> Result<Array> {
        let lead = shape::broadcast_lead(self.shape(), target)?;
        if lead == 0 {
            return Ok(self.clone());
        }
        Ok(match &self.repr {
            Repr::Constant(c) => Array::constant(target, c.value),
            _ => Array::with_repr(
                target.to_vec(),
                Repr::Broadcast(BroadcastData {
                    inner: Box::new(self.clone()),
                }),
            ),
        })
    }
}

// ============================================================================
// Transpose and axis permutation
// ============================================================================

impl Array {
    /// Reorder dimensions according to `perm`.
    ///
    /// A zero-copy view for dense/strided storage and constants; any other
    /// representation is materialized as a dense array first, and the
    /// permuted view is over that copy.
    pub fn permute_dims(&self, perm: &[usize]) -> Result<Array> {
        if perm.len() != self.rank() || !is_permutation(perm) {
            return Err(ArrayError::InvariantViolation(format!(
                "{:?} is not a permutation of 0..{}",
                perm,
                self.rank()
            )));
        }
        let permuted: Vec<usize> = perm.iter().map(|&d| self.shape()[d]).collect();
        if let Some(s) = self.as_strided() {
            return Ok(Array::with_repr(permuted, Repr::Strided(s.permute(perm))));
        }
        Ok(match &self.repr {
            Repr::Constant(c) => Array::constant(&permuted, c.value),
            _ => {
                let dense = self.to_dense();
                let s = dense.as_strided().unwrap_or_else(|| {
                    unreachable!("to_dense always yields strided-representable storage")
                });
                Array::with_repr(permuted, Repr::Strided(s.permute(perm)))
            }
        })
    }

    /// Transpose: reverse the dimension order. For rank 2 this swaps the
    /// row/column stride roles in O(1) on dense/strided storage; rank 0 and
    /// 1 come back as aliasing handles.
    pub fn transpose(&self) -> Result<Array> {
        if self.rank() <= 1 {
            return Ok(self.clone());
        }
        let perm: Vec<usize> = (0..self.rank()).rev().collect();
        self.permute_dims(&perm)
    }

    /// Materialized transpose: a detached copy, never an aliasing view.
    pub fn transpose_copy(&self) -> Result<Array> {
        Ok(self.transpose()?.duplicate())
    }
}

// ============================================================================
// Rotation and reversal
// ============================================================================

impl Array {
    /// Cyclic rotation along `dim`: element `i` of the result reads element
    /// `(i + shift) mod extent` of the source.
    ///
    /// Built entirely from existing operators: two windows joined in
    /// reversed order, aliasing the source.
    pub fn rotate_view(&self, dim: usize, shift: isize) -> Result<Array> {
        shape::check_dim(self.rank(), dim)?;
        let n = self.shape()[dim];
        if n == 0 {
            return Ok(self.clone());
        }
        let s = shift.rem_euclid(n as isize) as usize;
        if s == 0 {
            return Ok(self.clone());
        }
        let mut offsets = vec![0; self.rank()];
        let mut head_shape = self.shape().to_vec();
        offsets[dim] = s;
        head_shape[dim] = n - s;
        let head = self.sub_array(&offsets, &head_shape)?;

        offsets[dim] = 0;
        head_shape[dim] = s;
        let tail = self.sub_array(&offsets, &head_shape)?;
        head.join(&tail, dim)
    }

    /// Reverse dimension `dim`.
    ///
    /// A negative-stride view for dense/strided storage and constants; any
    /// other representation is materialized first.
    pub fn reverse_view(&self, dim: usize) -> Result<Array> {
        shape::check_dim(self.rank(), dim)?;
        if let Some(s) = self.as_strided() {
            return Ok(Array::with_repr(
                self.shape().to_vec(),
                Repr::Strided(s.reverse_dim(dim)),
            ));
        }
        Ok(match &self.repr {
            Repr::Constant(_) => self.clone(),
            _ => {
                let dense = self.to_dense();
                let s = dense.as_strided().unwrap_or_else(|| {
                    unreachable!("to_dense always yields strided-representable storage")
                });
                Array::with_repr(self.shape().to_vec(), Repr::Strided(s.reverse_dim(dim)))
            }
        })
    }
}

fn is_permutation(perm: &[usize]) -> bool {
    let mut seen = vec![false; perm.len()];
    for &p in perm {
        if p >= perm.len() || seen[p] {
            return false;
        }
        seen[p] = true;
    }
    true
}
