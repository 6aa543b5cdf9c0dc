//! Free-lists for decoded structures that are allocated on every poll cycle.
//!
//! A pooled value is reset before it goes back on the list, so the next decode starts from empty
//! fields but keeps the capacity of its nested collections.

use parking_lot::Mutex;

/// A structure that can be wiped for reuse.
pub trait Recycle: Default {
    /// Clears every field. Nested collections are length-zeroed, not shrunk.
    fn reset(&mut self);
}

#[derive(Debug)]
pub struct Pool<T> {
    free: Mutex<Vec<T>>,
    capacity: usize,
}

impl<T: Recycle> Pool<T> {
    /// Creates a pool retaining at most `capacity` idle values.
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            capacity,
        }
    }

    /// Takes an idle value, or a fresh default one when the pool is empty.
    pub fn get(&self) -> T {
        self.free.lock().pop().unwrap_or_default()
    }

    /// Resets `item` and keeps it for the next [`get`](Self::get).
    pub fn put(&self, mut item: T) {
        item.reset();

        let mut free = self.free.lock();
        if free.len() < self.capacity {
            free.push(item);
        }
    }

    /// Number of idle values.
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }
}

impl<T: Recycle> Default for Pool<T> {
    fn default() -> Self {
        Self::new(64)
    }
}
