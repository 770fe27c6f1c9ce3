//! A shared cell holding the most recent value, read at event time.
//!
//! Long-lived handlers hold a clone of the cell instead of a copy of the
//! value, so they always see what was written last.

use std::cell::RefCell;
use std::rc::Rc;

pub struct Latest<T> {
    slot: Rc<RefCell<T>>,
}

impl<T> Latest<T> {
    pub fn new(value: T) -> Self {
        Self {
            slot: Rc::new(RefCell::new(value)),
        }
    }

    /// Replace the held value. Every clone sees the new value.
    pub fn set(&self, value: T) {
        *self.slot.borrow_mut() = value;
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.slot.borrow())
    }

    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.slot.borrow_mut())
    }
}

impl<T: Clone> Latest<T> {
    pub fn get(&self) -> T {
        self.slot.borrow().clone()
    }
}

impl<T> Clone for Latest<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<T: Default> Default for Latest<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
