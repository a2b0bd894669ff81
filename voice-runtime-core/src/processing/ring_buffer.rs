/// Fixed-capacity circular buffer holding the most recent entries.
///
/// Overflow behavior: drops oldest entries. Wrap in a mutex for
/// cross-task access.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    buffer: Vec<T>,
    write_index: usize,
    available: usize,
    capacity: usize,
}

impl<T: Copy + Default> RingBuffer<T> {
    /// A zero capacity is clamped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: vec![T::default(); capacity],
            write_index: 0,
            available: 0,
            capacity,
        }
    }

    /// Append one entry, dropping the oldest when full.
    pub fn push(&mut self, value: T) {
        self.buffer[self.write_index] = value;
        self.write_index = (self.write_index + 1) % self.capacity;
        self.available = (self.available + 1).min(self.capacity);
    }

    /// Iterate over the current contents, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        let start = (self.write_index + self.capacity - self.available) % self.capacity;
        (0..self.available).map(move |i| self.buffer[(start + i) % self.capacity])
    }

    /// Number of entries currently stored.
    pub fn count(&self) -> usize {
        self.available
    }

    pub fn is_empty(&self) -> bool {
        self.available == 0
    }

    pub fn is_full(&self) -> bool {
        self.available == self.capacity
    }

    /// Reset the buffer to empty state.
    pub fn reset(&mut self) {
        self.write_index = 0;
        self.available = 0;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
