//! Visited-node set for graph traversal
//!
//! Clearing is O(1): each slot stores the generation in which it was last
//! marked, and `clear` bumps the generation.

/// Fixed-size set of node ids
#[derive(Debug, Clone)]
pub struct VisitedSet {
    marks: Vec<u32>,
    generation: u32,
}

impl VisitedSet {
    /// Create a set able to hold ids `0..size`
    pub fn new(size: usize) -> Self {
        VisitedSet {
            marks: vec![0; size],
            generation: 1,
        }
    }

    /// Number of addressable ids
    pub fn size(&self) -> usize {
        self.marks.len()
    }

    /// Mark `node` as visited
    ///
    /// Returns true if the node was not yet visited.
    #[inline]
    pub fn insert(&mut self, node: u32) -> bool {
        let slot = &mut self.marks[node as usize];
        if *slot == self.generation {
            false
        } else {
            *slot = self.generation;
            true
        }
    }

    /// Check if `node` was visited
    #[inline]
    pub fn contains(&self, node: u32) -> bool {
        self.marks[node as usize] == self.generation
    }

    /// Forget every visited node
    pub fn clear(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            // Wrapped: stale marks could alias the new generation.
            self.marks.iter_mut().for_each(|m| *m = 0);
            self.generation = 1;
        }
    }

    /// Grow to hold ids `0..size`
    pub fn resize(&mut self, size: usize) {
        if size > self.marks.len() {
            self.marks.resize(size, 0);
        }
    }
}
