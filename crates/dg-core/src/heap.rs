//! Binary min-heap keyed by `f64` priority
//!
//! Array-backed, O(log n) push and pop. There is deliberately no
//! decrease-key or removal: the pathfinder pushes a fresh entry whenever it
//! finds a cheaper route to a node and discards stale pops against its own
//! closed set.

/// Min-heap of `(priority, value)` pairs
#[derive(Debug, Clone)]
pub struct MinHeap<T> {
    entries: Vec<(f64, T)>,
}

impl<T> Default for MinHeap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MinHeap<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Smallest entry without removing it
    pub fn peek(&self) -> Option<(f64, &T)> {
        self.entries.first().map(|(p, v)| (*p, v))
    }

    pub fn push(&mut self, priority: f64, value: T) {
        self.entries.push((priority, value));
        self.sift_up(self.entries.len() - 1);
    }

    /// Remove and return the smallest entry
    pub fn pop(&mut self) -> Option<(f64, T)> {
        if self.entries.is_empty() {
            return None;
        }
        let last = self.entries.len() - 1;
        self.entries.swap(0, last);
        let top = self.entries.pop();
        if !self.entries.is_empty() {
            self.sift_down(0);
        }
        top
    }

    fn less(&self, a: usize, b: usize) -> bool {
        self.entries[a].0.total_cmp(&self.entries[b].0).is_lt()
    }

    fn sift_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if !self.less(idx, parent) {
                break;
            }
            self.entries.swap(idx, parent);
            idx = parent;
        }
    }

    fn sift_down(&mut self, mut idx: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * idx + 1;
            let right = left + 1;
            let mut smallest = idx;
            if left < len && self.less(left, smallest) {
                smallest = left;
            }
            if right < len && self.less(right, smallest) {
                smallest = right;
            }
            if smallest == idx {
                break;
            }
            self.entries.swap(idx, smallest);
            idx = smallest;
        }
    }
}
