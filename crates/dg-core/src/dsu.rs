//! Disjoint-set union over dense ids
//!
//! Tracks which rooms are already connected while the spanning tree is built.
//! Path compression on `find`, union by rank; on a rank tie the first
//! argument's root becomes the new root.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
    components: usize,
}

impl DisjointSet {
    /// `n` singleton sets, ids `0..n`
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
            components: n,
        }
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Number of disjoint components
    pub fn component_count(&self) -> usize {
        self.components
    }

    /// Representative of `item`'s set.
    ///
    /// Panics if `item` was never added.
    pub fn find(&mut self, item: usize) -> usize {
        assert!(
            item < self.parent.len(),
            "disjoint set has no item {item} (len {})",
            self.parent.len()
        );
        let mut root = item;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = item;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    /// Merge the sets holding `a` and `b`.
    ///
    /// Returns true iff they were in different sets, i.e. the edge `a-b`
    /// would not close a cycle.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        self.components -= 1;
        true
    }

    pub fn connected(&mut self, a: usize, b: usize) -> bool {
        self.find(a) == self.find(b)
    }
}
