//! Union-Find (disjoint set) data structure.
//!
//! Used by the road-side grouper to merge POIs connected by the
//! same-side relation into sub-clusters. Group extraction is
//! deterministic regardless of internal HashMap iteration order.

use std::collections::HashMap;
use std::hash::Hash;

/// Union-Find over arbitrary hashable keys with path compression
/// and union by rank.
#[derive(Debug, Clone, Default)]
pub struct UnionFind<T: Eq + Hash + Clone + Ord> {
    parent: HashMap<T, T>,
    rank: HashMap<T, u32>,
}

impl<T: Eq + Hash + Clone + Ord> UnionFind<T> {
    /// Create an empty structure.
    pub fn new() -> Self {
        Self {
            parent: HashMap::new(),
            rank: HashMap::new(),
        }
    }

    /// Create with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            parent: HashMap::with_capacity(capacity),
            rank: HashMap::with_capacity(capacity),
        }
    }

    /// Add a new singleton set. No-op if the element already exists.
    pub fn make_set(&mut self, item: T) {
        if !self.parent.contains_key(&item) {
            self.parent.insert(item.clone(), item.clone());
            self.rank.insert(item, 0);
        }
    }

    /// Find the root of the set containing `item`, compressing paths.
    ///
    /// Returns a clone of the root. Items never added are their own root.
    pub fn find(&mut self, item: &T) -> T {
        if !self.parent.contains_key(item) {
            return item.clone();
        }

        let mut root = item.clone();
        while self.parent[&root] != root {
            root = self.parent[&root].clone();
        }

        // Path compression
        let mut current = item.clone();
        while self.parent[&current] != root {
            let next = self.parent[&current].clone();
            self.parent.insert(current, root.clone());
            current = next;
        }

        root
    }

    /// Merge the sets containing `a` and `b`.
    pub fn union(&mut self, a: &T, b: &T) {
        self.make_set(a.clone());
        self.make_set(b.clone());

        let root_a = self.find(a);
        let root_b = self.find(b);

        if root_a == root_b {
            return;
        }

        let rank_a = self.rank[&root_a];
        let rank_b = self.rank[&root_b];

        if rank_a < rank_b {
            self.parent.insert(root_a, root_b);
        } else if rank_a > rank_b {
            self.parent.insert(root_b, root_a);
        } else {
            self.parent.insert(root_b, root_a.clone());
            self.rank.insert(root_a, rank_a + 1);
        }
    }

    /// Check whether two items are in the same set.
    pub fn connected(&mut self, a: &T, b: &T) -> bool {
        self.find(a) == self.find(b)
    }

    /// Extract all groups as root -> sorted members.
    ///
    /// The smallest member of each group is used as its canonical root so
    /// the result is stable across runs.
    pub fn groups(&mut self) -> HashMap<T, Vec<T>> {
        let items: Vec<T> = self.parent.keys().cloned().collect();

        let mut by_root: HashMap<T, Vec<T>> = HashMap::new();
        for item in items {
            let root = self.find(&item);
            by_root.entry(root).or_default().push(item);
        }

        let mut result = HashMap::new();
        for (_, mut members) in by_root {
            members.sort();
            let canonical = members[0].clone();
            result.insert(canonical, members);
        }
        result
    }

    /// Number of elements added.
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// Check if no elements have been added.
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }
}
