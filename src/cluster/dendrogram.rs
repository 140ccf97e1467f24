//! Dendrogram produced by agglomerative clustering.
//!
//! Only flat cuts are exposed: [`Dendrogram::cut_to_k`] replays the first
//! `n - k` merges and labels the resulting groups.

use crate::error::{Error, Result};

/// A dendrogram representing hierarchical cluster merges.
///
/// Cluster ids follow the SciPy convention: leaves are `0..n`, merge `i`
/// creates cluster `n + i`.
#[derive(Debug, Clone)]
pub struct Dendrogram {
    merges: Vec<Merge>,
    n_items: usize,
}

/// A single merge operation in the dendrogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    /// First cluster being merged (index).
    pub cluster_a: usize,
    /// Second cluster being merged (index).
    pub cluster_b: usize,
    /// Distance/dissimilarity at which merge occurred.
    pub distance: f64,
    /// Size of resulting cluster.
    pub size: usize,
}

impl Dendrogram {
    /// Create a new dendrogram for n items.
    pub fn new(n_items: usize) -> Self {
        Self {
            merges: Vec::with_capacity(n_items.saturating_sub(1)),
            n_items,
        }
    }

    /// Record a merge operation.
    pub fn add_merge(&mut self, cluster_a: usize, cluster_b: usize, distance: f64, size: usize) {
        self.merges.push(Merge {
            cluster_a,
            cluster_b,
            distance,
            size,
        });
    }

    /// Cluster assignments for exactly `k` clusters.
    ///
    /// Applies merges in order until `k` groups remain, so tied merge
    /// heights never collapse more groups than asked for. Labels are
    /// numbered in order of first occurrence.
    pub fn cut_to_k(&self, k: usize) -> Result<Vec<usize>> {
        if k == 0 || k > self.n_items {
            return Err(Error::InvalidClusterCount {
                requested: k,
                n_items: self.n_items,
            });
        }

        let n_merges = self.n_items - k;
        if n_merges > self.merges.len() {
            return Err(Error::InvalidParameter {
                name: "k",
                message: "dendrogram has too few merges for this cut",
            });
        }

        // Union-find over leaves and merge nodes.
        let mut parent: Vec<usize> = (0..self.n_items + n_merges).collect();
        for (i, merge) in self.merges.iter().take(n_merges).enumerate() {
            let node = self.n_items + i;
            for child in [merge.cluster_a, merge.cluster_b] {
                if child >= node {
                    return Err(Error::InvalidParameter {
                        name: "merge",
                        message: "merge references a cluster not yet formed",
                    });
                }
                let root = find(&mut parent, child);
                parent[root] = node;
            }
        }

        let mut root_label: Vec<Option<usize>> = vec![None; parent.len()];
        let mut next = 0;
        let mut labels = Vec::with_capacity(self.n_items);
        for item in 0..self.n_items {
            let root = find(&mut parent, item);
            let label = *root_label[root].get_or_insert_with(|| {
                next += 1;
                next - 1
            });
            labels.push(label);
        }

        Ok(labels)
    }

    /// Number of original items.
    pub fn n_items(&self) -> usize {
        self.n_items
    }

    /// Number of merges recorded.
    pub fn n_merges(&self) -> usize {
        self.merges.len()
    }

    /// Iterate over merges.
    pub fn merges(&self) -> impl Iterator<Item = &Merge> {
        self.merges.iter()
    }

    /// Get the merge distances.
    pub fn distances(&self) -> Vec<f64> {
        self.merges.iter().map(|m| m.distance).collect()
    }
}

fn find(parent: &mut [usize], mut x: usize) -> usize {
    while parent[x] != x {
        parent[x] = parent[parent[x]];
        x = parent[x];
    }
    x
}
