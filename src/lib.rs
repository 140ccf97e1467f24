//! # newscluster
//!
//! Topic clustering for news articles: text normalisation, TF-IDF features,
//! partitional and agglomerative clustering, automatic choice of the cluster
//! count and internal evaluation.
//!
//! ```text
//! Corpus ──► Tokenizer ──► TfidfVectorizer ──► FeatureMatrix
//!                                                  │
//!                    ┌─────────────────────────────┤
//!                    ▼                             ▼
//!         ClusterCountSelector ──k──► Kmeans / HierarchicalClustering
//!                                                  │
//!                                                  ▼
//!                              labels ──► metrics / report
//! ```
//!
//! [`ClusteringSession`] owns one vectorized corpus and runs every strategy
//! against it:
//!
//! ```rust,no_run
//! use newscluster::{ClusteringSession, Corpus, EvaluationMethod, Linkage, SessionConfig};
//!
//! let corpus = Corpus::from_json_file("crawling_result.json")?;
//! let session = ClusteringSession::new(&corpus, SessionConfig::default().with_seed(7))?;
//!
//! let flat = session.flat_clustering(Some(4), None)?;
//! let ward = session.agglomerative_clustering(None, Linkage::Ward)?;
//! for assignment in [&flat, &ward] {
//!     let s = session.evaluate(assignment.labels(), EvaluationMethod::Silhouette)?;
//!     println!("{}: k={} silhouette={s:.3}", assignment.strategy(), assignment.cluster_count());
//! }
//! # Ok::<(), newscluster::Error>(())
//! ```

pub mod cancel;
pub mod cluster;
pub mod config;
pub mod corpus;
/// Error types used across `newscluster`.
pub mod error;
pub mod metrics;
pub mod report;
pub mod session;
pub mod text;
pub mod tfidf;

#[cfg(test)]
mod session_tests;

pub use cancel::CancellationToken;
pub use cluster::{
    ClusterCountSelector, Clustering, HierarchicalClustering, Kmeans, Linkage, Selection,
};
pub use config::SessionConfig;
pub use corpus::{Corpus, CrawlRecord, Document};
pub use error::{Error, Result};
pub use metrics::{ari, calinski_harabasz, davies_bouldin, nmi, silhouette, EvaluationMethod};
pub use report::{ClusterReport, ClusterSummarizer, TermFrequencySummarizer};
pub use session::{ClusterAssignment, ClusteringSession, Strategy};
pub use text::Tokenizer;
pub use tfidf::{FeatureMatrix, TfidfVectorizer};
