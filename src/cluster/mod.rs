//! Clustering algorithms for grouping documents by topic.
//!
//! Both strategies partition the rows of the same dense TF-IDF matrix, so
//! their outputs can be scored and compared on equal terms.
//!
//! ## Algorithms
//!
//! ### K-means (partitional)
//!
//! The classic algorithm: assign each point to the nearest centroid, then
//! update centroids to the mean of their points. Repeat.
//!
//! **Objective**: Minimize within-cluster sum of squares:
//!
//! ```text
//! J = Σ_k Σ_{x ∈ C_k} ||x - μ_k||²
//! ```
//!
//! Randomly initialised, so every entry point takes an optional seed.
//!
//! ### Hierarchical (Agglomerative) Clustering
//!
//! Bottom-up: start with each point as its own cluster, repeatedly merge
//! the two closest clusters. The merge history forms a **dendrogram**;
//! cutting it after `n - k` merges leaves exactly k clusters.
//!
//! **Linkage methods** determine "distance between clusters":
//!
//! | Linkage | Distance | Effect |
//! |---------|----------|--------|
//! | Single | min(pairwise) | Chaining; elongated clusters |
//! | Complete | max(pairwise) | Compact, spherical clusters |
//! | Average | mean(pairwise) | Balanced compromise |
//! | Ward | Variance increase | Minimizes within-cluster variance |
//!
//! ### Choosing k
//!
//! [`ClusterCountSelector`] tries every k in `2..=14` and keeps the one with
//! the best silhouette.
//!
//! ## Usage
//!
//! ```rust
//! use ndarray::array;
//! use newscluster::cluster::{Clustering, HierarchicalClustering, Kmeans, Linkage};
//!
//! let data = array![
//!     [0.0f32, 0.0],
//!     [0.1, 0.1],
//!     [10.0, 10.0],
//!     [10.1, 10.1],
//! ];
//!
//! let labels = Kmeans::new(2).with_seed(7).fit_predict(data.view()).unwrap();
//! assert_eq!(labels[0], labels[1]);
//! assert_ne!(labels[0], labels[2]);
//!
//! let labels = HierarchicalClustering::new(2)
//!     .with_linkage(Linkage::Ward)
//!     .fit_predict(data.view())
//!     .unwrap();
//! assert_eq!(labels, vec![0, 0, 1, 1]);
//! ```

mod dendrogram;
mod hierarchical;
mod kmeans;
mod selector;
mod traits;

pub use dendrogram::{Dendrogram, Merge};
pub use hierarchical::{HierarchicalClustering, Linkage};
pub use kmeans::{Kmeans, KmeansFit};
pub use selector::{CandidateScore, ClusterCountSelector, Selection};
pub use traits::Clustering;
