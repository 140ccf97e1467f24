//! Automatic choice of the cluster count.
//!
//! Runs a clustering strategy once per candidate k and keeps the k with the
//! highest mean silhouette (Euclidean). Ties go to the smallest k.
//!
//! Each candidate is independent, so with the `parallel` feature the
//! candidates fan out over rayon's pool and are joined before the maximum
//! is taken. A candidate whose silhouette is undefined (the run collapsed
//! to a single label) scores `None` and never wins unless every candidate
//! is undefined, in which case the smallest k is returned.

use std::ops::RangeInclusive;

use ndarray::ArrayView2;
use serde::Serialize;
use tracing::{debug, info};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::cancel::CancellationToken;
use crate::error::{Error, Result};
use crate::metrics::silhouette_precomputed;

/// Silhouette of one candidate k.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CandidateScore {
    /// Cluster count tried.
    pub k: usize,
    /// Mean silhouette, `None` when undefined.
    pub silhouette: Option<f64>,
}

/// Result of a count search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    /// Chosen cluster count.
    pub cluster_count: usize,
    /// Every candidate, in ascending k.
    pub scores: Vec<CandidateScore>,
}

/// Silhouette-driven search over a range of cluster counts.
#[derive(Debug, Clone)]
pub struct ClusterCountSelector {
    min_clusters: usize,
    max_clusters: usize,
    parallel: bool,
    cancel: Option<CancellationToken>,
}

impl Default for ClusterCountSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl ClusterCountSelector {
    /// Smallest candidate ever searched.
    pub const MIN_CLUSTERS: usize = 2;
    /// Largest candidate ever searched.
    pub const MAX_CLUSTERS: usize = 14;

    /// Search `2..=14`.
    pub fn new() -> Self {
        Self {
            min_clusters: Self::MIN_CLUSTERS,
            max_clusters: Self::MAX_CLUSTERS,
            parallel: true,
            cancel: None,
        }
    }

    /// Narrow the candidate range (inclusive); it must stay within `2..=14`.
    pub fn with_range(mut self, min_clusters: usize, max_clusters: usize) -> Self {
        self.min_clusters = min_clusters;
        self.max_clusters = max_clusters;
        self
    }

    /// Evaluate candidates concurrently (needs the `parallel` feature).
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Check `token` before each candidate.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Candidates for `n_items` documents: the range capped at `n - 1`.
    pub fn candidates(&self, n_items: usize) -> Result<RangeInclusive<usize>> {
        if self.min_clusters < Self::MIN_CLUSTERS
            || self.max_clusters > Self::MAX_CLUSTERS
            || self.max_clusters < self.min_clusters
        {
            return Err(Error::InvalidParameter {
                name: "cluster range",
                message: "need 2 <= min_clusters <= max_clusters <= 14",
            });
        }
        let upper = self.max_clusters.min(n_items.saturating_sub(1));
        if upper < self.min_clusters {
            return Err(Error::InvalidClusterCount {
                requested: self.min_clusters,
                n_items,
            });
        }
        Ok(self.min_clusters..=upper)
    }

    /// Run `cluster` for every candidate k and pick the best.
    ///
    /// `distances` is the square Euclidean distance matrix of the documents
    /// `cluster` partitions; it is shared by every candidate.
    pub fn select<F>(&self, distances: ArrayView2<'_, f64>, cluster: F) -> Result<Selection>
    where
        F: Fn(usize) -> Result<Vec<usize>> + Sync,
    {
        let candidates = self.candidates(distances.nrows())?;

        let score = |k: usize| -> Result<CandidateScore> {
            if let Some(token) = &self.cancel {
                token.check()?;
            }
            let labels = cluster(k)?;
            let silhouette = match silhouette_precomputed(distances, &labels) {
                Ok(s) => Some(s),
                Err(Error::UndefinedMetric { .. }) => None,
                Err(e) => return Err(e),
            };
            debug!(k, ?silhouette, "scored candidate cluster count");
            Ok(CandidateScore { k, silhouette })
        };

        #[cfg(feature = "parallel")]
        let scores: Vec<CandidateScore> = if self.parallel {
            candidates.into_par_iter().map(score).collect::<Result<_>>()?
        } else {
            candidates.map(score).collect::<Result<_>>()?
        };

        #[cfg(not(feature = "parallel"))]
        let scores: Vec<CandidateScore> = candidates.map(score).collect::<Result<_>>()?;

        let cluster_count = best_candidate(&scores).unwrap_or(self.min_clusters);
        info!(cluster_count, "selected cluster count");

        Ok(Selection {
            cluster_count,
            scores,
        })
    }
}

/// First k reaching the maximum defined score.
fn best_candidate(scores: &[CandidateScore]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for c in scores {
        if let Some(s) = c.silhouette {
            if best.map_or(true, |(_, b)| s > b) {
                best = Some((c.k, s));
            }
        }
    }
    best.map(|(k, _)| k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{Clustering, HierarchicalClustering, Kmeans, Linkage};
    use crate::metrics::pairwise_euclidean;
    use ndarray::Array2;
    use proptest::prelude::*;

    /// Three tight groups on a line.
    fn three_groups() -> Array2<f32> {
        Array2::from_shape_fn((18, 1), |(i, _)| (i / 6) as f32 * 10.0 + (i % 6) as f32 * 0.1)
    }

    #[test]
    fn test_finds_three_groups() {
        let data = three_groups();
        let distances = pairwise_euclidean(data.view());

        for linkage in Linkage::ALL {
            let selection = ClusterCountSelector::new()
                .select(distances.view(), |k| {
                    HierarchicalClustering::new(k)
                        .with_linkage(linkage)
                        .fit_predict(data.view())
                })
                .unwrap();
            assert_eq!(selection.cluster_count, 3, "{linkage}");
            assert_eq!(selection.scores.len(), 13);
            assert_eq!(selection.scores.first().map(|c| c.k), Some(2));
            assert_eq!(selection.scores.last().map(|c| c.k), Some(14));
        }

        let selection = ClusterCountSelector::new()
            .select(distances.view(), |k| {
                Kmeans::new(k).with_seed(3).fit_predict(data.view())
            })
            .unwrap();
        assert_eq!(selection.cluster_count, 3);
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let data = three_groups();
        let distances = pairwise_euclidean(data.view());
        let run = |k| Kmeans::new(k).with_seed(11).fit_predict(data.view());

        let a = ClusterCountSelector::new()
            .with_parallel(false)
            .select(distances.view(), run)
            .unwrap();
        let b = ClusterCountSelector::new()
            .with_parallel(true)
            .select(distances.view(), run)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_ties_pick_smallest_k() {
        let scores = vec![
            CandidateScore { k: 2, silhouette: Some(0.3) },
            CandidateScore { k: 3, silhouette: Some(0.5) },
            CandidateScore { k: 4, silhouette: Some(0.5) },
            CandidateScore { k: 5, silhouette: None },
        ];
        assert_eq!(best_candidate(&scores), Some(3));
    }

    #[test]
    fn test_all_undefined_falls_back_to_min() {
        let data = Array2::from_elem((15, 2), 1.0f32);
        let distances = pairwise_euclidean(data.view());

        let selection = ClusterCountSelector::new()
            .select(distances.view(), |_| Ok(vec![0; 15]))
            .unwrap();
        assert_eq!(selection.cluster_count, 2);
        assert!(selection.scores.iter().all(|c| c.silhouette.is_none()));
    }

    #[test]
    fn test_range_capped_by_documents() {
        let selector = ClusterCountSelector::new();
        assert_eq!(selector.candidates(10).unwrap(), 2..=9);
        assert_eq!(selector.candidates(200).unwrap(), 2..=14);
        assert!(matches!(
            selector.candidates(2),
            Err(Error::InvalidClusterCount { .. })
        ));
        assert!(ClusterCountSelector::new()
            .with_range(1, 5)
            .candidates(20)
            .is_err());
        assert!(ClusterCountSelector::new()
            .with_range(2, 15)
            .candidates(200)
            .is_err());
        assert_eq!(
            ClusterCountSelector::new()
                .with_range(3, 6)
                .candidates(200)
                .unwrap(),
            3..=6
        );
    }

    #[test]
    fn test_cancelled_search() {
        let data = three_groups();
        let distances = pairwise_euclidean(data.view());
        let token = CancellationToken::new();
        token.cancel();

        let result = ClusterCountSelector::new()
            .with_cancellation(token)
            .select(distances.view(), |k| Ok((0..18).map(|i| i % k).collect()));
        assert_eq!(result, Err(Error::Cancelled));
    }

    #[test]
    fn test_clustering_errors_propagate() {
        let data = three_groups();
        let distances = pairwise_euclidean(data.view());
        let result = ClusterCountSelector::new()
            .with_parallel(false)
            .select(distances.view(), |_| Err(Error::EmptyInput));
        assert_eq!(result, Err(Error::EmptyInput));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_selection_in_range(points in proptest::collection::vec(-5.0f32..5.0, 15..30)) {
            let n = points.len();
            let data = Array2::from_shape_vec((n, 1), points).unwrap();
            let distances = pairwise_euclidean(data.view());
            let selection = ClusterCountSelector::new()
                .select(distances.view(), |k| {
                    HierarchicalClustering::new(k)
                        .with_linkage(Linkage::Average)
                        .fit_predict(data.view())
                })
                .unwrap();
            prop_assert!((2..=14).contains(&selection.cluster_count));
        }
    }
}
