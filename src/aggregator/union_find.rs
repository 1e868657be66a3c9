//! Disjoint-set forest over finding indices.

use std::cmp::Ordering;

/// Union-find with path compression and union by rank.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    /// `size` singleton sets.
    pub fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// Whether there are no elements.
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Representative of the set containing `x`, compressing the path.
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    /// Join the sets of `x` and `y`.
    ///
    /// Returns `(root, absorbed)` when two distinct sets were joined, or
    /// `None` when they were already one set.
    pub fn union(&mut self, x: usize, y: usize) -> Option<(usize, usize)> {
        let rx = self.find(x);
        let ry = self.find(y);
        if rx == ry {
            return None;
        }

        // Union by rank, preferring smaller index as representative
        let (root, absorbed) = match self.rank[rx].cmp(&self.rank[ry]) {
            Ordering::Less => (ry, rx),
            Ordering::Greater => (rx, ry),
            Ordering::Equal => {
                let (root, absorbed) = if rx < ry { (rx, ry) } else { (ry, rx) };
                self.rank[root] += 1;
                (root, absorbed)
            }
        };
        self.parent[absorbed] = root;
        Some((root, absorbed))
    }

    /// Members of every set, each sorted ascending, sets ordered by their
    /// smallest member.
    pub fn sets(&mut self) -> Vec<Vec<usize>> {
        let mut by_root: Vec<Option<usize>> = vec![None; self.len()];
        let mut sets: Vec<Vec<usize>> = Vec::new();
        for x in 0..self.len() {
            let root = self.find(x);
            match by_root[root] {
                Some(slot) => sets[slot].push(x),
                None => {
                    by_root[root] = Some(sets.len());
                    sets.push(vec![x]);
                }
            }
        }
        sets
    }
}
