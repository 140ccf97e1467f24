//! K-means clustering.
//!
//! Partitions documents into k clusters by minimizing **within-cluster sum of
//! squares** (WCSS, or inertia):
//!
//! ```text
//! WCSS = Σₖ Σᵢ∈Cₖ ||xᵢ - μₖ||²
//! ```
//!
//! # Lloyd's Algorithm
//!
//! 1. Initialize k centroids via k-means++
//! 2. **Assign**: Each point → nearest centroid
//! 3. **Update**: Each centroid → mean of assigned points
//! 4. Repeat until the centroids stop moving
//!
//! Lloyd only finds a local minimum, so the whole procedure is restarted
//! `n_init` times and the run with the lowest WCSS wins.
//!
//! ## K-means++ Initialization
//!
//! 1. Choose first centroid uniformly at random
//! 2. Choose next centroid with probability proportional to D(x)²
//!    (squared distance to nearest existing centroid)
//!
//! # Empty Clusters
//!
//! A centroid that loses all its points mid-run is re-seeded on a random
//! point. The final assignment can still leave a cluster empty (e.g. when
//! every document is identical); that result is returned as is, and
//! [`KmeansFit::empty_clusters`] reports it.

use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::prelude::*;
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::traits::Clustering;
use crate::cancel::CancellationToken;
use crate::error::{Error, Result};

/// K-means clustering algorithm.
#[derive(Debug, Clone)]
pub struct Kmeans {
    /// Number of clusters.
    k: usize,
    /// Maximum iterations per restart.
    max_iter: usize,
    /// Convergence tolerance on total centroid shift.
    tol: f64,
    /// Number of restarts.
    n_init: usize,
    /// Random seed.
    seed: Option<u64>,
    cancel: Option<CancellationToken>,
}

/// Outcome of the best k-means restart.
#[derive(Debug, Clone, PartialEq)]
pub struct KmeansFit {
    /// Cluster of each row.
    pub labels: Vec<usize>,
    /// Within-cluster sum of squares.
    pub inertia: f64,
    /// Lloyd iterations of the winning restart.
    pub iterations: usize,
    /// Clusters with no assigned row.
    pub empty_clusters: usize,
}

impl Kmeans {
    /// Create a new K-means clusterer.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: 300,
            tol: 1e-4,
            n_init: 10,
            seed: None,
            cancel: None,
        }
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set number of restarts.
    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set an optional seed.
    pub fn with_seed_opt(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Stop between iterations once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Fit and return labels together with the WCSS of the best restart.
    pub fn fit(&self, data: ArrayView2<'_, f32>) -> Result<KmeansFit> {
        let n = data.nrows();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if self.k == 0 || self.k > n {
            return Err(Error::InvalidClusterCount {
                requested: self.k,
                n_items: n,
            });
        }
        if self.n_init == 0 {
            return Err(Error::InvalidParameter {
                name: "n_init",
                message: "must be at least 1",
            });
        }

        let mut best: Option<KmeansFit> = None;
        for restart in 0..self.n_init {
            let mut rng: Box<dyn RngCore> = match self.seed {
                Some(s) => Box::new(StdRng::seed_from_u64(s.wrapping_add(restart as u64))),
                None => Box::new(rand::rng()),
            };

            let fit = self.lloyd(data, &mut rng)?;
            debug!(
                k = self.k,
                restart,
                inertia = fit.inertia,
                iterations = fit.iterations,
                "k-means restart finished"
            );

            if best.as_ref().map_or(true, |b| fit.inertia < b.inertia) {
                best = Some(fit);
            }
        }

        best.ok_or(Error::EmptyInput)
    }

    /// One k-means++ seeded Lloyd run.
    fn lloyd(&self, data: ArrayView2<'_, f32>, rng: &mut impl Rng) -> Result<KmeansFit> {
        let n = data.nrows();
        let d = data.ncols();

        let mut centroids = self.init_centroids(data, rng);
        let mut labels = vec![0usize; n];
        let mut iterations = 0;

        for _iter in 0..self.max_iter {
            if let Some(token) = &self.cancel {
                token.check()?;
            }
            iterations += 1;

            self.assign(data, &centroids, &mut labels);

            // Update step
            let mut new_centroids: Array2<f32> = Array2::zeros((self.k, d));
            let mut counts = vec![0usize; self.k];

            for (i, &k) in labels.iter().enumerate() {
                let mut row = new_centroids.row_mut(k);
                row += &data.row(i);
                counts[k] += 1;
            }

            for k in 0..self.k {
                if counts[k] > 0 {
                    new_centroids
                        .row_mut(k)
                        .mapv_inplace(|v| v / counts[k] as f32);
                } else {
                    // Re-seed an empty cluster from a random document.
                    let idx = rng.random_range(0..n);
                    new_centroids.row_mut(k).assign(&data.row(idx));
                }
            }

            // Total squared centroid shift.
            let shift: f32 = centroids
                .iter()
                .zip(new_centroids.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum();

            centroids = new_centroids;

            if shift < self.tol as f32 {
                break;
            }
        }

        // Final assignment against the final centroids.
        self.assign(data, &centroids, &mut labels);

        let inertia = labels
            .iter()
            .enumerate()
            .map(|(i, &k)| f64::from(squared_distance(&data.row(i), &centroids.row(k))))
            .sum();

        let mut counts = vec![0usize; self.k];
        for &k in &labels {
            counts[k] += 1;
        }

        Ok(KmeansFit {
            labels,
            inertia,
            iterations,
            empty_clusters: counts.iter().filter(|&&c| c == 0).count(),
        })
    }

    /// Assignment step - parallel when feature enabled.
    fn assign(&self, data: ArrayView2<'_, f32>, centroids: &Array2<f32>, labels: &mut [usize]) {
        let nearest = |i: usize| {
            let point = data.row(i);
            let mut best_cluster = 0;
            let mut best_dist = f32::MAX;

            for k in 0..self.k {
                let dist = squared_distance(&point, &centroids.row(k));
                if dist < best_dist {
                    best_dist = dist;
                    best_cluster = k;
                }
            }
            best_cluster
        };

        #[cfg(feature = "parallel")]
        labels
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, label)| *label = nearest(i));

        #[cfg(not(feature = "parallel"))]
        for (i, label) in labels.iter_mut().enumerate() {
            *label = nearest(i);
        }
    }

    /// Initialize centroids using k-means++ algorithm.
    fn init_centroids(&self, data: ArrayView2<'_, f32>, rng: &mut impl Rng) -> Array2<f32> {
        let n = data.nrows();
        let d = data.ncols();
        let mut centroids = Array2::zeros((self.k, d));

        // First centroid: random point
        let first = rng.random_range(0..n);
        centroids.row_mut(0).assign(&data.row(first));

        // Remaining centroids: k-means++ selection
        for i in 1..self.k {
            let distances: Vec<f32> = (0..n)
                .map(|j| {
                    let point = data.row(j);
                    (0..i)
                        .map(|c| squared_distance(&point, &centroids.row(c)))
                        .fold(f32::MAX, f32::min)
                })
                .collect();

            // D(x)^2 sampling.
            let total: f32 = distances.iter().sum();
            if total == 0.0 {
                let idx = rng.random_range(0..n);
                centroids.row_mut(i).assign(&data.row(idx));
                continue;
            }

            let threshold = rng.random::<f32>() * total;
            let mut cumsum = 0.0;
            let mut selected = n - 1;

            for (j, &d) in distances.iter().enumerate() {
                cumsum += d;
                if cumsum >= threshold {
                    selected = j;
                    break;
                }
            }

            centroids.row_mut(i).assign(&data.row(selected));
        }

        centroids
    }
}

/// Compute squared Euclidean distance.
fn squared_distance(a: &ArrayView1<'_, f32>, b: &ArrayView1<'_, f32>) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

impl Clustering for Kmeans {
    fn fit_predict(&self, data: ArrayView2<'_, f32>) -> Result<Vec<usize>> {
        self.fit(data).map(|fit| fit.labels)
    }

    fn n_clusters(&self) -> usize {
        self.k
    }
}
