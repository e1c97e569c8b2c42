use std::collections::VecDeque;

use crate::acquisition::filter::FilteredSample;

/// Display capacity: the plot shows at most this many filtered samples.
pub const MAX_POINTS: usize = 300;

/// Fixed-capacity history of filtered samples with newest-wins eviction.
pub struct ScrollingBuffer {
    data: VecDeque<FilteredSample>,
    capacity: usize,
}

impl ScrollingBuffer {
    pub fn new() -> Self {
        Self::with_capacity(MAX_POINTS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends one sample, evicting from the front once over capacity.
    pub fn push(&mut self, value: FilteredSample) {
        self.data.push_back(value);
        while self.data.len() > self.capacity {
            self.data.pop_front();
        }
    }

    /// Copy of the retained samples in arrival order, oldest first.
    pub fn snapshot(&self) -> Vec<FilteredSample> {
        self.data.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ScrollingBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holds_samples_in_arrival_order() {
        let mut buffer = ScrollingBuffer::with_capacity(5);
        for value in [1.0, 2.0, 3.0] {
            buffer.push(value);
        }
        assert_eq!(buffer.snapshot(), vec![1.0, 2.0, 3.0]);
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn evicts_oldest_first_on_overflow() {
        let mut buffer = ScrollingBuffer::with_capacity(3);
        for value in 0..7 {
            buffer.push(value as f64);
        }
        assert_eq!(buffer.snapshot(), vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut buffer = ScrollingBuffer::with_capacity(10);
        for value in 0..1000 {
            buffer.push(value as f64);
            assert!(buffer.len() <= buffer.capacity());
        }
        assert_eq!(buffer.len(), 10);
    }
}
