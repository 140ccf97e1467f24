//! Clustering traits.

use ndarray::ArrayView2;

use crate::error::Result;

/// Trait for hard clustering algorithms over a dense feature matrix.
pub trait Clustering {
    /// Fit the model to data and return cluster assignments.
    ///
    /// Returns a vector of cluster labels, one per row of `data`.
    fn fit_predict(&self, data: ArrayView2<'_, f32>) -> Result<Vec<usize>>;

    /// Get the number of clusters.
    fn n_clusters(&self) -> usize;
}
