//! Slice and element iteration.
//!
//! Two protocols, both lazy, finite and uniform across every storage kind:
//!
//! - [`SliceIter`] yields one rank-(N-1) view per top-level index. The views
//!   alias the source's storage like any other slice.
//! - [`ElementIter`] yields scalar values by descending depth-first into
//!   slice iterators until rank 0 is reached and concatenating the
//!   sequences; a rank-0 array yields exactly one value.
//!
//! Neither protocol materializes intermediate dense copies: a joined,
//! broadcast or sparse array is walked through the same slice routing its
//! `get` uses.

use crate::array::Array;
use crate::shape::IndexIter;

/// Lazy, non-restartable sequence of top-level slices.
pub struct SliceIter {
    source: Array,
    index: usize,
    count: usize,
}

impl SliceIter {
    pub(crate) fn new(source: &Array) -> SliceIter {
        debug_assert!(source.rank() > 0);
        let count = source.shape()[0];
        SliceIter {
            source: source.clone(),
            index: 0,
            count,
        }
    }
}

impl Iterator for SliceIter {
    type Item = Array;

    fn next(&mut self) -> Option<Array> {
        if self.index >= self.count {
            return None;
        }
        let slice = self.source.slice_unchecked(0, self.index);
        self.index += 1;
        Some(slice)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SliceIter {}

/// Lazy depth-first sequence of every element value.
pub struct ElementIter {
    stack: Vec<SliceIter>,
    cursor: Option<Array>,
}

impl ElementIter {
    pub(crate) fn new(source: &Array) -> ElementIter {
        ElementIter {
            stack: Vec::with_capacity(source.rank()),
            cursor: Some(source.clone()),
        }
    }
}

impl Iterator for ElementIter {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        loop {
            if let Some(a) = self.cursor.take() {
                if a.rank() == 0 {
                    return Some(a.get_element(&[]));
                }
                let mut it = SliceIter::new(&a);
                self.cursor = it.next();
                self.stack.push(it);
                continue;
            }
            // Advance the deepest iterator that still has slices; exhausted
            // levels pop off until the whole descent is spent.
            loop {
                match self.stack.last_mut() {
                    None => return None,
                    Some(it) => match it.next() {
                        Some(a) => {
                            self.cursor = Some(a);
                            break;
                        }
                        None => {
                            self.stack.pop();
                        }
                    },
                }
            }
        }
    }
}

impl Array {
    /// Iterator over the top-level slices; fails conceptually only at rank 0
    /// (a scalar has no slices), which yields an empty iterator here.
    pub fn slices(&self) -> SliceIter {
        if self.rank() == 0 {
            return SliceIter {
                source: self.clone(),
                index: 0,
                count: 0,
            };
        }
        SliceIter::new(self)
    }

    /// Iterator over every element value, row-major order.
    pub fn elements(&self) -> ElementIter {
        ElementIter::new(self)
    }

    /// Iterator over `(index tuple, value)` pairs, row-major order.
    pub fn indexed_elements(&self) -> IndexedElementIter {
        IndexedElementIter {
            source: self.clone(),
            indices: IndexIter::new(self.shape()),
        }
    }

    /// Iterator over the `(index tuple, value)` pairs whose value is
    /// non-zero, row-major order.
    ///
    /// Implicit zeros of sparse and virtual storage are skipped, stored
    /// entries are visited; the filtering itself is value-based, so a dense
    /// array simply skips its zero elements.
    pub fn non_zero_elements(&self) -> impl Iterator<Item = (Vec<usize>, f64)> {
        self.indexed_elements().filter(|&(_, v)| v != 0.0)
    }
}

/// Lazy row-major sequence of `(index tuple, value)` pairs.
pub struct IndexedElementIter {
    source: Array,
    indices: IndexIter,
}

impl Iterator for IndexedElementIter {
    type Item = (Vec<usize>, f64);

    fn next(&mut self) -> Option<(Vec<usize>, f64)> {
        let idx = self.indices.next()?;
        let v = self.source.get_element(&idx);
        Some((idx, v))
    }
}
