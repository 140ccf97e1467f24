//! Session configuration.
//!
//! Every field has a default, so a YAML file only needs the keys it
//! overrides:
//!
//! ```yaml
//! seed: 42
//! max_clusters: 10
//! n_init: 4
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cluster::ClusterCountSelector;
use crate::error::{Error, Result};

/// Parameters of a clustering session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Smallest corpus a session accepts; may be raised, never below 15.
    pub min_documents: usize,
    /// Lower end of the cluster-count search, at least 2.
    pub min_clusters: usize,
    /// Upper end of the cluster-count search, at most 14.
    pub max_clusters: usize,
    /// Seed for k-means; `None` draws fresh entropy per run.
    pub seed: Option<u64>,
    /// Lloyd iterations per k-means restart.
    pub max_iter: usize,
    /// Centroid-shift tolerance.
    pub tol: f64,
    /// K-means restarts.
    pub n_init: usize,
    /// Evaluate search candidates concurrently.
    pub parallel_search: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_documents: Self::MIN_DOCUMENTS,
            min_clusters: ClusterCountSelector::MIN_CLUSTERS,
            max_clusters: ClusterCountSelector::MAX_CLUSTERS,
            seed: None,
            max_iter: 300,
            tol: 1e-4,
            n_init: 10,
            parallel_search: true,
        }
    }
}

impl SessionConfig {
    /// Floor for `min_documents`.
    pub const MIN_DOCUMENTS: usize = 15;

    /// Read overrides from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&raw)
    }

    /// Parse overrides from YAML text.
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let config: SessionConfig = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the k-means seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the cluster-count search range.
    pub fn with_cluster_range(mut self, min_clusters: usize, max_clusters: usize) -> Self {
        self.min_clusters = min_clusters;
        self.max_clusters = max_clusters;
        self
    }

    /// Set the number of k-means restarts.
    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    /// Toggle concurrent candidate evaluation.
    pub fn with_parallel_search(mut self, parallel: bool) -> Self {
        self.parallel_search = parallel;
        self
    }

    /// Reject settings no session can run with.
    pub fn validate(&self) -> Result<()> {
        if self.min_clusters < ClusterCountSelector::MIN_CLUSTERS {
            return Err(Error::InvalidParameter {
                name: "min_clusters",
                message: "must be at least 2",
            });
        }
        if self.max_clusters > ClusterCountSelector::MAX_CLUSTERS {
            return Err(Error::InvalidParameter {
                name: "max_clusters",
                message: "must be at most 14",
            });
        }
        if self.max_clusters < self.min_clusters {
            return Err(Error::InvalidParameter {
                name: "max_clusters",
                message: "must not be below min_clusters",
            });
        }
        if self.min_documents < Self::MIN_DOCUMENTS {
            return Err(Error::InvalidParameter {
                name: "min_documents",
                message: "must be at least 15",
            });
        }
        if self.n_init == 0 {
            return Err(Error::InvalidParameter {
                name: "n_init",
                message: "must be at least 1",
            });
        }
        if self.max_iter == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iter",
                message: "must be at least 1",
            });
        }
        if self.tol.is_nan() || self.tol < 0.0 {
            return Err(Error::InvalidParameter {
                name: "tol",
                message: "must be a non-negative number",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.min_documents, 15);
        assert_eq!((config.min_clusters, config.max_clusters), (2, 14));
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml() {
        let config = SessionConfig::from_yaml_str("seed: 42\nmax_clusters: 8\n").unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.max_clusters, 8);
        assert_eq!(config.n_init, 10);
    }

    #[test]
    fn test_invalid_yaml_values() {
        let err = SessionConfig::from_yaml_str("min_clusters: 1\n").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidParameter {
                name: "min_clusters",
                ..
            }
        ));

        let err = SessionConfig::from_yaml_str("max_clusters: 30\n").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidParameter {
                name: "max_clusters",
                ..
            }
        ));

        let err = SessionConfig::from_yaml_str("min_documents: 3\n").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidParameter {
                name: "min_documents",
                ..
            }
        ));

        let config = SessionConfig::from_yaml_str("min_documents: 40\nmin_clusters: 3\n").unwrap();
        assert_eq!((config.min_documents, config.min_clusters), (40, 3));

        let err = SessionConfig::from_yaml_str("n_init: [1, 2]\n").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_builders() {
        let config = SessionConfig::default()
            .with_seed(9)
            .with_cluster_range(3, 6)
            .with_n_init(2)
            .with_parallel_search(false);
        assert_eq!(config.seed, Some(9));
        assert_eq!((config.min_clusters, config.max_clusters), (3, 6));
        assert_eq!(config.n_init, 2);
        assert!(!config.parallel_search);
    }
}
