use std::cmp::Ordering;

use crate::common::atr_exception::{AtrException, ErrCode};

/// Fixed-capacity ring buffer over the most recent samples.
///
/// Logical index 0 is the oldest retained sample, `len() - 1` the newest.
/// Once full, every push evicts exactly the oldest sample and the count
/// stays at capacity. The capacity is fixed for the life of the window;
/// changing it means discarding the window and creating a new one.
#[derive(Debug, Clone)]
pub struct BoundedWindow<T> {
    buf: Vec<T>,
    capacity: usize,
    head: usize,
    count: usize,
}

impl<T> BoundedWindow<T> {
    pub fn new(capacity: usize) -> Result<Self, AtrException> {
        if capacity == 0 {
            return Err(AtrException::new(
                "window capacity must be positive",
                ErrCode::InvalidConfiguration,
            ));
        }
        Ok(Self {
            buf: Vec::with_capacity(capacity),
            capacity,
            head: 0,
            count: 0,
        })
    }

    /// O(1) append. Overwrites the logical-oldest sample when full.
    pub fn push(&mut self, value: T) {
        if self.buf.len() < self.capacity {
            self.buf.push(value);
        } else {
            self.buf[self.head] = value;
        }
        self.head = (self.head + 1) % self.capacity;
        if self.count < self.capacity {
            self.count += 1;
        }
    }

    /// Access by logical index (0 = oldest, `len() - 1` = newest).
    pub fn get(&self, index: usize) -> Result<&T, AtrException> {
        if index >= self.count {
            return Err(AtrException::new(
                format!("index {} out of range for window of {}", index, self.count),
                ErrCode::IndexOutOfRange,
            ));
        }
        Ok(&self.buf[self.physical(index)])
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.count == self.capacity
    }

    pub fn oldest(&self) -> Option<&T> {
        self.get(0).ok()
    }

    pub fn newest(&self) -> Option<&T> {
        if self.count == 0 {
            None
        } else {
            self.get(self.count - 1).ok()
        }
    }

    /// Iterate in logical order, oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        (0..self.count).map(move |i| &self.buf[self.physical(i)])
    }

    /// Drops all samples. Capacity is unchanged.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.head = 0;
        self.count = 0;
    }

    fn physical(&self, index: usize) -> usize {
        (self.head + self.capacity - self.count + index) % self.capacity
    }
}

impl<T: Clone + PartialOrd> BoundedWindow<T> {
    /// Ascending-sorted snapshot of the held samples. Does not mutate
    /// the window. Incomparable elements (e.g. NaN) keep their relative
    /// order.
    pub fn to_sorted_vec(&self) -> Vec<T> {
        let mut values: Vec<T> = self.iter().cloned().collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        values
    }
}

impl BoundedWindow<f64> {
    /// Single-pass min/max over the held samples. `None` when empty.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        let mut iter = self.iter();
        let first = *iter.next()?;
        let mut min = first;
        let mut max = first;
        for &value in iter {
            if value < min {
                min = value;
            }
            if value > max {
                max = value;
            }
        }
        Some((min, max))
    }
}
