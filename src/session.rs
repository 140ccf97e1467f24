//! Clustering session: one corpus, one feature matrix, many runs.
//!
//! [`ClusteringSession::new`] validates the corpus, fits the TF-IDF matrix
//! and precomputes its dense copy and Euclidean distance matrix. Every
//! clustering and evaluation call then borrows that state read-only, so all
//! strategies and every k are compared on the identical representation.
//!
//! Errors split by scope. Corpus- and matrix-level failures
//! ([`Error::InsufficientCorpus`], [`Error::DegenerateInput`]) come out of
//! `new` and there is no session. Per-call failures
//! ([`Error::InvalidClusterCount`], [`Error::UndefinedMetric`],
//! [`Error::Cancelled`]) leave the session usable.

use std::fmt;

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cancel::CancellationToken;
use crate::cluster::{ClusterCountSelector, HierarchicalClustering, Kmeans, Linkage, Selection};
use crate::config::SessionConfig;
use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::metrics::{pairwise_euclidean, silhouette_precomputed, EvaluationMethod};
use crate::tfidf::{FeatureMatrix, TfidfVectorizer};

/// Which clustering family produced an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// K-means.
    Partitional,
    /// Agglomerative with the given linkage.
    Hierarchical(Linkage),
}

impl Strategy {
    /// K-means followed by the four linkages.
    pub const ALL: [Strategy; 5] = [
        Strategy::Partitional,
        Strategy::Hierarchical(Linkage::Single),
        Strategy::Hierarchical(Linkage::Complete),
        Strategy::Hierarchical(Linkage::Ward),
        Strategy::Hierarchical(Linkage::Average),
    ];

    /// Short tag used in report file names.
    pub fn tag(&self) -> &'static str {
        match self {
            Strategy::Partitional => "fc",
            Strategy::Hierarchical(Linkage::Single) => "ac-s",
            Strategy::Hierarchical(Linkage::Complete) => "ac-c",
            Strategy::Hierarchical(Linkage::Ward) => "ac-w",
            Strategy::Hierarchical(Linkage::Average) => "ac-a",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Partitional => f.write_str("k-means"),
            Strategy::Hierarchical(linkage) => write!(f, "agglomerative ({linkage})"),
        }
    }
}

/// Labels of one clustering run, aligned with the corpus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterAssignment {
    labels: Vec<usize>,
    cluster_count: usize,
    strategy: Strategy,
    empty_clusters: usize,
}

impl ClusterAssignment {
    /// Cluster of each document, in corpus order. Every label is `< cluster_count`.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// The k the run was asked for.
    pub fn cluster_count(&self) -> usize {
        self.cluster_count
    }

    /// Strategy that produced the labels.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Clusters that received no document (k-means only).
    pub fn empty_clusters(&self) -> usize {
        self.empty_clusters
    }

    /// Documents per cluster, indexed by label.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.cluster_count];
        for &l in &self.labels {
            sizes[l] += 1;
        }
        sizes
    }
}

/// Immutable clustering state for one corpus.
#[derive(Debug)]
pub struct ClusteringSession {
    config: SessionConfig,
    texts: Vec<String>,
    vocabulary: Vec<String>,
    matrix: FeatureMatrix,
    dense: Array2<f32>,
    distances: Array2<f64>,
    cancel: CancellationToken,
}

impl ClusteringSession {
    /// Vectorize `corpus` and prepare it for clustering.
    ///
    /// Fails with [`Error::InsufficientCorpus`] before any vectorization
    /// when the corpus is smaller than `config.min_documents`.
    pub fn new(corpus: &Corpus, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        if corpus.len() < config.min_documents {
            return Err(Error::InsufficientCorpus {
                found: corpus.len(),
                minimum: config.min_documents,
            });
        }

        let texts = corpus.texts();
        let mut vectorizer = TfidfVectorizer::new();
        let matrix = vectorizer.fit_transform(&texts)?;
        let dense = matrix.to_dense();
        let distances = pairwise_euclidean(dense.view());

        info!(
            documents = matrix.n_rows(),
            terms = matrix.n_cols(),
            nnz = matrix.nnz(),
            "clustering session ready"
        );

        Ok(Self {
            config,
            texts: texts.into_iter().map(str::to_string).collect(),
            vocabulary: vectorizer.vocabulary().to_vec(),
            matrix,
            dense,
            distances,
            cancel: CancellationToken::new(),
        })
    }

    /// Observe `token` in count searches and k-means iterations.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Settings the session was built with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Number of documents.
    pub fn n_documents(&self) -> usize {
        self.matrix.n_rows()
    }

    /// Document texts, in corpus order.
    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    /// Vocabulary in column order.
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// The sparse TF-IDF matrix.
    pub fn feature_matrix(&self) -> &FeatureMatrix {
        &self.matrix
    }

    /// Dense copy of the TF-IDF matrix.
    pub fn dense_matrix(&self) -> ArrayView2<'_, f32> {
        self.dense.view()
    }

    /// K-means over the feature matrix.
    ///
    /// `cluster_count: None` searches for the best k first. `seed: None`
    /// falls back to the configured seed, and to fresh entropy without one.
    pub fn flat_clustering(
        &self,
        cluster_count: Option<usize>,
        seed: Option<u64>,
    ) -> Result<ClusterAssignment> {
        let seed = seed.or(self.config.seed);
        let k = match cluster_count {
            Some(k) => self.check_cluster_count(k)?,
            None => {
                self.optimal_cluster_count(Strategy::Partitional, seed)?
                    .cluster_count
            }
        };

        let fit = self.kmeans(k, seed).fit(self.dense.view())?;
        if fit.empty_clusters > 0 {
            warn!(
                k,
                empty = fit.empty_clusters,
                "k-means left clusters without documents"
            );
        }

        Ok(ClusterAssignment {
            labels: fit.labels,
            cluster_count: k,
            strategy: Strategy::Partitional,
            empty_clusters: fit.empty_clusters,
        })
    }

    /// Agglomerative clustering over the dense feature matrix.
    ///
    /// `cluster_count: None` searches for the best k with the same linkage.
    pub fn agglomerative_clustering(
        &self,
        cluster_count: Option<usize>,
        linkage: Linkage,
    ) -> Result<ClusterAssignment> {
        let strategy = Strategy::Hierarchical(linkage);
        let k = match cluster_count {
            Some(k) => self.check_cluster_count(k)?,
            None => self.optimal_cluster_count(strategy, None)?.cluster_count,
        };

        self.cancel.check()?;
        let labels = HierarchicalClustering::new(k)
            .with_linkage(linkage)
            .fit_dendrogram_precomputed(self.distances.view())?
            .cut_to_k(k)?;

        Ok(ClusterAssignment {
            labels,
            cluster_count: k,
            strategy,
            empty_clusters: 0,
        })
    }

    /// Run `strategy`; `seed` only affects k-means.
    pub fn cluster(
        &self,
        strategy: Strategy,
        cluster_count: Option<usize>,
        seed: Option<u64>,
    ) -> Result<ClusterAssignment> {
        match strategy {
            Strategy::Partitional => self.flat_clustering(cluster_count, seed),
            Strategy::Hierarchical(linkage) => self.agglomerative_clustering(cluster_count, linkage),
        }
    }

    /// Silhouette search over the configured k range.
    pub fn optimal_cluster_count(&self, strategy: Strategy, seed: Option<u64>) -> Result<Selection> {
        let selector = ClusterCountSelector::new()
            .with_range(self.config.min_clusters, self.config.max_clusters)
            .with_parallel(self.config.parallel_search)
            .with_cancellation(self.cancel.clone());

        match strategy {
            Strategy::Partitional => {
                let seed = seed.or(self.config.seed);
                selector.select(self.distances.view(), |k| {
                    self.kmeans(k, seed).fit(self.dense.view()).map(|fit| fit.labels)
                })
            }
            Strategy::Hierarchical(linkage) => {
                // One dendrogram serves every candidate cut.
                self.cancel.check()?;
                let dendrogram = HierarchicalClustering::new(self.config.min_clusters)
                    .with_linkage(linkage)
                    .fit_dendrogram_precomputed(self.distances.view())?;
                selector.select(self.distances.view(), |k| dendrogram.cut_to_k(k))
            }
        }
    }

    /// Score `labels` with `method`.
    ///
    /// [`Error::UndefinedMetric`] only concerns this call.
    pub fn evaluate(&self, labels: &[usize], method: EvaluationMethod) -> Result<f64> {
        match method {
            EvaluationMethod::Silhouette => silhouette_precomputed(self.distances.view(), labels),
            other => other.evaluate(self.dense.view(), labels),
        }
    }

    /// Score `labels` with every method.
    pub fn evaluate_all(&self, labels: &[usize]) -> Vec<(EvaluationMethod, Result<f64>)> {
        EvaluationMethod::ALL
            .iter()
            .map(|&method| (method, self.evaluate(labels, method)))
            .collect()
    }

    fn kmeans(&self, k: usize, seed: Option<u64>) -> Kmeans {
        Kmeans::new(k)
            .with_max_iter(self.config.max_iter)
            .with_tol(self.config.tol)
            .with_n_init(self.config.n_init)
            .with_seed_opt(seed)
            .with_cancellation(self.cancel.clone())
    }

    fn check_cluster_count(&self, k: usize) -> Result<usize> {
        let n = self.n_documents();
        if k < 2 || k + 1 > n {
            return Err(Error::InvalidClusterCount {
                requested: k,
                n_items: n,
            });
        }
        Ok(k)
    }
}
