//! N-dimensional arrays, matrices and vectors over `f64` with interchangeable
//! storage strategies.
//!
//! Every array in this crate satisfies one polymorphic contract regardless of
//! how its elements are stored: dense contiguous buffers, strided views,
//! sorted-index or hashed sparse sets, virtual constants, broadcasts and
//! joins all answer the same `get`/`set`/`slice`/shape questions and can be
//! mixed freely in elementwise operations.
//!
//! # Core Types
//!
//! - [`Array`]: dynamic-rank array; the single entry point for every storage
//!   strategy. Rank-0 arrays are scalars.
//! - [`Vector`] / [`Matrix`]: rank-1 and rank-2 wrappers with the
//!   specialization-specific API (length, row/column access, transpose, dot).
//!
//! # Views and aliasing
//!
//! View operations ([`Array::slice`], [`Array::sub_array`], [`Array::join`],
//! [`Array::broadcast`], [`Matrix::transpose`], [`Array::rotate_view`])
//! return lightweight objects that reference the same backing storage as
//! their source. Mutating an element through any view is observable through
//! every alias of that storage, including the root array. `Clone` on
//! [`Array`] is a cheap handle copy with the same aliasing behavior; the
//! deep-copy operations are [`Array::duplicate`] and [`Array::exact_clone`].
//!
//! Backing buffers are reference-counted and interiorly mutable
//! (`Rc<RefCell<_>>`), so arrays are `!Send` and `!Sync`: the whole crate is
//! single-threaded by construction, and a buffer lives as long as any view
//! of it.
//!
//! # Example
//!
//! ```rust
//! use polyarray::Array;
//!
//! let m = Array::from_vec(&[2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
//!
//! // Row slice is a view into the same buffer.
//! let mut row = m.slice(0).unwrap();
//! assert_eq!(row.get(&[1]).unwrap(), 2.0);
//! row.set(&[1], 20.0).unwrap();
//! assert_eq!(m.get(&[0, 1]).unwrap(), 20.0);
//!
//! // Virtual concatenation, no copy.
//! let j = m.join(&m, 0).unwrap();
//! assert_eq!(j.shape(), &[4, 3]);
//! ```
//!
//! # Sparse storage
//!
//! ```rust
//! use polyarray::Vector;
//!
//! let v = Vector::sparse_indexed(5, vec![1, 3], vec![2.0, 3.0], true).unwrap();
//! assert_eq!(v.element_sum(), 5.0);
//! assert_eq!(v.non_zero_count(), 2);
//! ```

mod array;
mod buffer;
mod dense;
mod fmt;
pub mod io;
mod iter;
mod matrix;
pub mod ops;
mod reduce;
mod shape;
mod sparse;
mod special;
mod vector;
mod view;

pub use array::Array;
pub use iter::{ElementIter, IndexedElementIter, SliceIter};
pub use matrix::Matrix;
pub use vector::Vector;

// ============================================================================
// Error types
// ============================================================================

/// Errors raised by array operations.
///
/// All errors are unrecoverable at the point of the call and propagate
/// immediately; the crate never retries and never silently coerces an
/// invalid argument (an out-of-range index is never clamped).
#[derive(Debug, thiserror::Error)]
pub enum ArrayError {
    /// Index tuple has the wrong arity or a coordinate outside the shape.
    #[error("index {index:?} out of bounds for shape {shape:?}")]
    IndexOutOfRange { index: Vec<usize>, shape: Vec<usize> },

    /// Dimension number outside `[0, rank)`.
    #[error("dimension {dim} out of range for rank {rank}")]
    DimensionOutOfRange { dim: usize, rank: usize },

    /// Binary operation between incompatible shapes.
    #[error("shape mismatch: {0:?} vs {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    /// Broadcast target has lower rank than the source, or mismatched
    /// trailing dimensions.
    #[error("cannot broadcast shape {from:?} to {to:?}")]
    BroadcastIncompatible { from: Vec<usize>, to: Vec<usize> },

    /// Attempted `set` on an immutable array, or at a structurally
    /// disallowed index of a partially mutable one.
    #[error("write at {index:?} not permitted by this storage")]
    ImmutableViolation { index: Vec<usize> },

    /// Operation requires a specific rank (e.g. the scalar accessor on a
    /// higher-rank array).
    #[error("operation requires rank {expected}, array has rank {actual}")]
    UnsupportedRank { expected: usize, actual: usize },

    /// Internal consistency check failure, raised by `validate()`.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// Underlying I/O failure while reading or writing a persisted form.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed persisted form.
    #[error("malformed input: {0}")]
    Parse(String),
}

/// Result type for array operations.
pub type Result<T> = std::result::Result<T, ArrayError>;
