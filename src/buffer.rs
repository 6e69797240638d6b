//! Shared backing buffers.
//!
//! A [`Buffer`] is the single owner of a flat `f64` slab. Every dense array
//! and every strided view holds a handle to one of these; `Clone` copies the
//! handle, not the data. Interior mutability is what lets a view mutate
//! storage that other views and the root still read; the aliasing contract
//! of the whole crate rests on this type. `Rc<RefCell<_>>` keeps the buffer
//! alive while any view references it and makes the types `!Send`, matching
//! the single-threaded resource model.

use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub(crate) struct Buffer(Rc<RefCell<Vec<f64>>>);

impl Buffer {
    pub fn zeros(len: usize) -> Self {
        Buffer(Rc::new(RefCell::new(vec![0.0; len])))
    }

    pub fn from_vec(data: Vec<f64>) -> Self {
        Buffer(Rc::new(RefCell::new(data)))
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Whether two handles refer to the same slab.
    pub fn ptr_eq(&self, other: &Buffer) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    #[inline]
    pub fn get(&self, pos: usize) -> f64 {
        self.0.borrow()[pos]
    }

    #[inline]
    pub fn set(&self, pos: usize, value: f64) {
        self.0.borrow_mut()[pos] = value;
    }

    /// Read without a slice bounds check.
    ///
    /// # Safety
    /// `pos` must be a valid position in the buffer.
    #[inline]
    pub unsafe fn get_unchecked(&self, pos: usize) -> f64 {
        debug_assert!(pos < self.len());
        *self.0.borrow().get_unchecked(pos)
    }

    /// Write without a slice bounds check.
    ///
    /// # Safety
    /// `pos` must be a valid position in the buffer.
    #[inline]
    pub unsafe fn set_unchecked(&self, pos: usize, value: f64) {
        debug_assert!(pos < self.len());
        *self.0.borrow_mut().get_unchecked_mut(pos) = value;
    }

    /// Run a bulk read over the whole slab.
    pub fn with<R>(&self, f: impl FnOnce(&[f64]) -> R) -> R {
        f(&self.0.borrow())
    }

    /// Run a bulk write over the whole slab.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut [f64]) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.0.borrow().clone()
    }

    /// Deep copy into a fresh slab.
    pub fn deep_clone(&self) -> Buffer {
        Buffer::from_vec(self.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_aliases() {
        let a = Buffer::from_vec(vec![1.0, 2.0]);
        let b = a.clone();
        b.set(0, 9.0);
        assert_eq!(a.get(0), 9.0);
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn test_deep_clone_does_not_alias() {
        let a = Buffer::from_vec(vec![1.0, 2.0]);
        let b = a.deep_clone();
        b.set(0, 9.0);
        assert_eq!(a.get(0), 1.0);
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn test_bulk_access() {
        let a = Buffer::zeros(4);
        a.with_mut(|s| s.fill(2.5));
        assert_eq!(a.with(|s| s.iter().sum::<f64>()), 10.0);
    }
}
