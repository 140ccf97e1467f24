//! Hierarchical (agglomerative) clustering.
//!
//! Bottom-up clustering that builds a **dendrogram** by iteratively
//! merging the closest clusters, then cuts it to a flat assignment with
//! the requested number of clusters.
//!
//! # Linkage Methods
//!
//! The key choice: how do we define "distance between clusters"?
//!
//! | Linkage | Formula | Effect |
//! |---------|---------|--------|
//! | Single | min(d(a,b)) for a∈A, b∈B | Chaining; elongated clusters |
//! | Complete | max(d(a,b)) | Compact, spherical clusters |
//! | Average | mean(d(a,b)) | Balanced compromise |
//! | Ward | Δ variance | Minimizes within-cluster variance |
//!
//! ## Ward's Method: Variance Minimization
//!
//! Ward linkage minimizes the increase in total within-cluster variance
//! when merging clusters A and B:
//!
//! ```text
//! Δ(A,B) = (nₐ × nᵦ)/(nₐ + nᵦ) × ||μₐ - μᵦ||²
//! ```
//!
//! Ward is only meaningful on Euclidean distances; the other three accept
//! any dissimilarity, and [`HierarchicalClustering::fit_dendrogram_precomputed`]
//! takes one directly.
//!
//! # Cost
//!
//! O(n²) memory for the condensed distance matrix, which is why this runs
//! on a dense copy of the feature matrix.

use std::fmt;
use std::str::FromStr;

use kodama::{linkage as kodama_linkage, Method as KodamaMethod};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use super::dendrogram::Dendrogram;
use super::traits::Clustering;
use crate::error::{Error, Result};
use crate::metrics::pairwise_euclidean;

/// Linkage method for hierarchical clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    /// Single linkage: minimum distance between clusters.
    Single,
    /// Complete linkage: maximum distance between clusters.
    Complete,
    /// Average linkage: mean distance between clusters.
    Average,
    /// Ward's method: minimize within-cluster variance.
    Ward,
}

impl Linkage {
    /// All four linkages.
    pub const ALL: [Linkage; 4] = [
        Linkage::Single,
        Linkage::Complete,
        Linkage::Average,
        Linkage::Ward,
    ];

    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Linkage::Single => "single",
            Linkage::Complete => "complete",
            Linkage::Average => "average",
            Linkage::Ward => "ward",
        }
    }

    fn method(&self) -> KodamaMethod {
        match self {
            Linkage::Single => KodamaMethod::Single,
            Linkage::Complete => KodamaMethod::Complete,
            Linkage::Average => KodamaMethod::Average,
            Linkage::Ward => KodamaMethod::Ward,
        }
    }
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Linkage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Linkage::Single),
            "complete" => Ok(Linkage::Complete),
            "average" => Ok(Linkage::Average),
            "ward" => Ok(Linkage::Ward),
            _ => Err(Error::UnknownLinkage(s.to_string())),
        }
    }
}

/// Hierarchical (agglomerative) clustering.
#[derive(Debug, Clone)]
pub struct HierarchicalClustering {
    /// Number of clusters to produce.
    n_clusters: usize,
    /// Linkage method.
    linkage: Linkage,
}

impl HierarchicalClustering {
    /// Create a new hierarchical clusterer.
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            linkage: Linkage::Single,
        }
    }

    /// Set linkage method.
    pub fn with_linkage(mut self, linkage: Linkage) -> Self {
        self.linkage = linkage;
        self
    }

    /// Linkage in use.
    pub fn linkage(&self) -> Linkage {
        self.linkage
    }

    /// Fit and return the full dendrogram over Euclidean distances.
    pub fn fit_dendrogram(&self, data: ArrayView2<'_, f32>) -> Result<Dendrogram> {
        if data.nrows() == 0 {
            return Err(Error::EmptyInput);
        }
        let distances = pairwise_euclidean(data);
        self.fit_dendrogram_precomputed(distances.view())
    }

    /// Fit on a square, symmetric distance matrix.
    ///
    /// Ward's variance update is only meaningful when `distances` are
    /// Euclidean, as produced by [`pairwise_euclidean`].
    pub fn fit_dendrogram_precomputed(&self, distances: ArrayView2<'_, f64>) -> Result<Dendrogram> {
        let n = distances.nrows();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if distances.ncols() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                found: distances.ncols(),
            });
        }

        let mut dendro = Dendrogram::new(n);
        if n == 1 {
            return Ok(dendro);
        }

        // Build a condensed dissimilarity matrix (upper triangle, row-major).
        // Length is N-choose-2.
        let mut condensed = Vec::with_capacity((n * (n - 1)) / 2);
        for row in 0..(n - 1) {
            for col in (row + 1)..n {
                condensed.push(distances[[row, col]]);
            }
        }

        // kodama's dendrogram uses SciPy/MATLAB-style cluster labels:
        // - leaves: 0..n-1
        // - each merge i creates cluster id n+i
        let dend = kodama_linkage(&mut condensed, n, self.linkage.method());

        for step in dend.steps() {
            dendro.add_merge(step.cluster1, step.cluster2, step.dissimilarity, step.size);
        }

        Ok(dendro)
    }
}

impl Clustering for HierarchicalClustering {
    fn fit_predict(&self, data: ArrayView2<'_, f32>) -> Result<Vec<usize>> {
        if self.n_clusters == 0 || self.n_clusters > data.nrows() {
            return Err(Error::InvalidClusterCount {
                requested: self.n_clusters,
                n_items: data.nrows(),
            });
        }
        let dendro = self.fit_dendrogram(data)?;
        dendro.cut_to_k(self.n_clusters)
    }

    fn n_clusters(&self) -> usize {
        self.n_clusters
    }
}
