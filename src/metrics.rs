//! Clustering evaluation metrics.
//!
//! Two families:
//!
//! - **Internal** scores judge one assignment against the feature space it
//!   was computed from. No ground truth needed; this is what ranks
//!   strategies and picks k.
//! - **Agreement** scores compare two assignments of the same documents,
//!   e.g. k-means against Ward at the same k.
//!
//! # Internal Metrics
//!
//! | Metric | Range | Best |
//! |--------|-------|------|
//! | [`silhouette`] | [-1, 1] | higher |
//! | [`calinski_harabasz`] | [0, ∞) | higher |
//! | [`davies_bouldin`] | [0, ∞) | lower |
//!
//! All three are undefined unless `2 <= distinct labels <= n - 1` and
//! return [`Error::UndefinedMetric`] otherwise. That error is scoped to
//! the call: other metrics or other assignments can still be evaluated.
//!
//! # Agreement Metrics
//!
//! | Metric | Range | Best | Properties |
//! |--------|-------|------|------------|
//! | [`ari`] | [-1, 1] | 1 | Adjusted Rand Index |
//! | [`nmi`] | [0, 1] | 1 | Normalized mutual information |
//!
//! # References
//!
//! - Rousseeuw (1987). "Silhouettes: a graphical aid..."
//! - Caliński & Harabasz (1974). "A dendrite method for cluster analysis"
//! - Davies & Bouldin (1979). "A cluster separation measure"
//! - Hubert & Arabie (1985). "Comparing partitions" (ARI)

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Internal validity metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMethod {
    /// Mean silhouette coefficient (Euclidean).
    Silhouette,
    /// Between- over within-cluster dispersion.
    CalinskiHarabasz,
    /// Mean worst-case scatter / separation ratio.
    DaviesBouldin,
}

impl EvaluationMethod {
    /// All three methods.
    pub const ALL: [EvaluationMethod; 3] = [
        EvaluationMethod::Silhouette,
        EvaluationMethod::CalinskiHarabasz,
        EvaluationMethod::DaviesBouldin,
    ];

    /// Snake-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationMethod::Silhouette => "silhouette",
            EvaluationMethod::CalinskiHarabasz => "calinski_harabasz",
            EvaluationMethod::DaviesBouldin => "davies_bouldin",
        }
    }

    /// Whether larger scores mean better clusterings.
    pub fn higher_is_better(&self) -> bool {
        !matches!(self, EvaluationMethod::DaviesBouldin)
    }

    /// Score `labels` against `data`.
    pub fn evaluate(&self, data: ArrayView2<'_, f32>, labels: &[usize]) -> Result<f64> {
        match self {
            EvaluationMethod::Silhouette => silhouette(data, labels),
            EvaluationMethod::CalinskiHarabasz => calinski_harabasz(data, labels),
            EvaluationMethod::DaviesBouldin => davies_bouldin(data, labels),
        }
    }
}

impl fmt::Display for EvaluationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvaluationMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "silhouette" => Ok(EvaluationMethod::Silhouette),
            "calinskiharabasz" | "ch" => Ok(EvaluationMethod::CalinskiHarabasz),
            "daviesbouldin" | "db" => Ok(EvaluationMethod::DaviesBouldin),
            _ => Err(Error::UnknownEvaluationMethod(s.to_string())),
        }
    }
}

/// Square matrix of Euclidean distances between rows.
pub fn pairwise_euclidean(data: ArrayView2<'_, f32>) -> Array2<f64> {
    let n = data.nrows();
    let mut dist = Array2::zeros((n, n));
    for i in 0..n {
        for j in (i + 1)..n {
            let d = data
                .row(i)
                .iter()
                .zip(data.row(j).iter())
                .map(|(a, b)| {
                    let dx = f64::from(*a) - f64::from(*b);
                    dx * dx
                })
                .sum::<f64>()
                .sqrt();
            dist[[i, j]] = d;
            dist[[j, i]] = d;
        }
    }
    dist
}

/// Mean silhouette coefficient with Euclidean distance.
///
/// For each point, `a` is its mean distance to the rest of its cluster and
/// `b` the smallest mean distance to another cluster:
///
/// ```text
/// s(i) = (b - a) / max(a, b)
/// ```
///
/// Points alone in their cluster score 0, as do points with `a = b = 0`.
pub fn silhouette(data: ArrayView2<'_, f32>, labels: &[usize]) -> Result<f64> {
    check_rows(data.nrows(), labels)?;
    silhouette_precomputed(pairwise_euclidean(data).view(), labels)
}

/// [`silhouette`] over a precomputed square distance matrix.
pub fn silhouette_precomputed(distances: ArrayView2<'_, f64>, labels: &[usize]) -> Result<f64> {
    check_rows(distances.nrows(), labels)?;
    let (encoded, k) = encode_labels(labels);
    check_label_count("silhouette", k, labels.len())?;

    let n = labels.len();
    let mut sizes = vec![0usize; k];
    for &l in &encoded {
        sizes[l] += 1;
    }

    let mut total = 0.0;
    let mut sums = vec![0.0f64; k];
    for i in 0..n {
        sums.iter_mut().for_each(|s| *s = 0.0);
        for j in 0..n {
            if i != j {
                sums[encoded[j]] += distances[[i, j]];
            }
        }

        let own = encoded[i];
        if sizes[own] < 2 {
            continue;
        }
        let a = sums[own] / (sizes[own] - 1) as f64;
        let b = (0..k)
            .filter(|&c| c != own)
            .map(|c| sums[c] / sizes[c] as f64)
            .fold(f64::INFINITY, f64::min);

        let denom = a.max(b);
        if denom > 0.0 {
            total += (b - a) / denom;
        }
    }

    Ok(total / n as f64)
}

/// Calinski-Harabasz index (variance ratio criterion).
///
/// ```text
/// CH = [B / (k - 1)] / [W / (n - k)]
/// ```
///
/// where `B` is the size-weighted squared spread of centroids around the
/// global mean and `W` the squared spread of points around their centroid.
/// Returns 1.0 when `W` is zero.
pub fn calinski_harabasz(data: ArrayView2<'_, f32>, labels: &[usize]) -> Result<f64> {
    check_rows(data.nrows(), labels)?;
    let (encoded, k) = encode_labels(labels);
    check_label_count("calinski_harabasz", k, labels.len())?;

    let n = labels.len();
    let data = data.mapv(f64::from);
    let mean: Array1<f64> = data.mean_axis(Axis(0)).ok_or(Error::EmptyInput)?;
    let (centroids, sizes) = centroids(&data, &encoded, k);

    let mut between = 0.0;
    for c in 0..k {
        let diff = &centroids.row(c) - &mean;
        between += sizes[c] as f64 * diff.dot(&diff);
    }

    let mut within = 0.0;
    for (i, &c) in encoded.iter().enumerate() {
        let diff = &data.row(i) - &centroids.row(c);
        within += diff.dot(&diff);
    }

    if within == 0.0 {
        return Ok(1.0);
    }

    Ok(between * (n - k) as f64 / (within * (k - 1) as f64))
}

/// Davies-Bouldin index.
///
/// With `sᵢ` the mean distance of cluster i's points to its centroid and
/// `dᵢⱼ` the distance between centroids:
///
/// ```text
/// DB = (1/k) Σᵢ maxⱼ≠ᵢ (sᵢ + sⱼ) / dᵢⱼ
/// ```
///
/// Coincident centroids contribute 0. Returns 0.0 when every scatter or
/// every centroid distance is zero.
pub fn davies_bouldin(data: ArrayView2<'_, f32>, labels: &[usize]) -> Result<f64> {
    check_rows(data.nrows(), labels)?;
    let (encoded, k) = encode_labels(labels);
    check_label_count("davies_bouldin", k, labels.len())?;

    let data = data.mapv(f64::from);
    let (centroids, sizes) = centroids(&data, &encoded, k);

    let mut scatter = vec![0.0f64; k];
    for (i, &c) in encoded.iter().enumerate() {
        let diff = &data.row(i) - &centroids.row(c);
        scatter[c] += diff.dot(&diff).sqrt();
    }
    for c in 0..k {
        scatter[c] /= sizes[c] as f64;
    }

    let mut separation = Array2::<f64>::zeros((k, k));
    for i in 0..k {
        for j in (i + 1)..k {
            let diff = &centroids.row(i) - &centroids.row(j);
            let d = diff.dot(&diff).sqrt();
            separation[[i, j]] = d;
            separation[[j, i]] = d;
        }
    }

    const EPS: f64 = 1e-12;
    if scatter.iter().all(|s| s.abs() < EPS) || separation.iter().all(|d| d.abs() < EPS) {
        return Ok(0.0);
    }

    let total: f64 = (0..k)
        .map(|i| {
            (0..k)
                .filter(|&j| j != i && separation[[i, j]] > 0.0)
                .map(|j| (scatter[i] + scatter[j]) / separation[[i, j]])
                .fold(0.0, f64::max)
        })
        .sum();

    Ok(total / k as f64)
}

/// Adjusted Rand Index between two clusterings.
///
/// ARI is the corrected-for-chance version of the Rand Index.
/// A value of 0 indicates random agreement, 1 indicates identical partitions
/// (up to label permutation).
pub fn ari(pred: &[usize], truth: &[usize]) -> f64 {
    if pred.len() != truth.len() || pred.is_empty() {
        return 0.0;
    }

    let (joint, n) = build_contingency_table(pred, truth);

    // Row sums (a_i) and column sums (b_j)
    let mut row_sums = HashMap::new();
    let mut col_sums = HashMap::new();

    for (&(p, t), &count) in &joint {
        *row_sums.entry(p).or_insert(0usize) += count;
        *col_sums.entry(t).or_insert(0usize) += count;
    }

    let sum_comb_ij: f64 = joint.values().map(|&c| comb2(c) as f64).sum();
    let sum_comb_a: f64 = row_sums.values().map(|&a| comb2(a) as f64).sum();
    let sum_comb_b: f64 = col_sums.values().map(|&b| comb2(b) as f64).sum();

    let comb_n = comb2(n) as f64;
    if comb_n == 0.0 {
        return 1.0;
    }

    // ARI = (index - expected) / (max - expected)
    let expected = sum_comb_a * sum_comb_b / comb_n;
    let max_index = (sum_comb_a + sum_comb_b) / 2.0;

    let denom = max_index - expected;
    if denom.abs() < 1e-10 {
        return 1.0; // Perfect agreement when both clusterings are identical
    }

    (sum_comb_ij - expected) / denom
}

/// Normalized Mutual Information between two clusterings.
///
/// ```text
/// NMI(U, V) = 2 * I(U; V) / (H(U) + H(V))
/// ```
pub fn nmi(pred: &[usize], truth: &[usize]) -> f64 {
    if pred.len() != truth.len() || pred.is_empty() {
        return 0.0;
    }

    let (joint, n) = build_contingency_table(pred, truth);
    let n_f = n as f64;

    let mut p_pred = HashMap::new();
    let mut p_truth = HashMap::new();
    for &p in pred {
        *p_pred.entry(p).or_insert(0usize) += 1;
    }
    for &t in truth {
        *p_truth.entry(t).or_insert(0usize) += 1;
    }

    let h_pred = entropy(p_pred.values(), n_f);
    let h_truth = entropy(p_truth.values(), n_f);

    let mut mi = 0.0;
    for (&(p, t), &count) in &joint {
        let p_joint = count as f64 / n_f;
        let p_p = p_pred[&p] as f64 / n_f;
        let p_t = p_truth[&t] as f64 / n_f;
        mi += p_joint * (p_joint / (p_p * p_t)).ln();
    }

    let denom = h_pred + h_truth;
    if denom > 0.0 {
        2.0 * mi / denom
    } else {
        1.0 // Both are constant
    }
}

// Helper functions

fn check_rows(n_rows: usize, labels: &[usize]) -> Result<()> {
    if labels.is_empty() {
        return Err(Error::EmptyInput);
    }
    if n_rows != labels.len() {
        return Err(Error::DimensionMismatch {
            expected: n_rows,
            found: labels.len(),
        });
    }
    Ok(())
}

fn check_label_count(metric: &'static str, k: usize, n: usize) -> Result<()> {
    if k < 2 || k + 1 > n {
        return Err(Error::UndefinedMetric {
            metric,
            reason: format!("{k} distinct labels for {n} samples (need 2..={})", n.saturating_sub(1)),
        });
    }
    Ok(())
}

/// Map labels onto `0..k` preserving their sort order.
fn encode_labels(labels: &[usize]) -> (Vec<usize>, usize) {
    let mut distinct: Vec<usize> = labels.to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    let index: HashMap<usize, usize> = distinct.iter().enumerate().map(|(i, &l)| (l, i)).collect();
    (labels.iter().map(|l| index[l]).collect(), distinct.len())
}

fn centroids(data: &Array2<f64>, encoded: &[usize], k: usize) -> (Array2<f64>, Vec<usize>) {
    let mut centroids = Array2::zeros((k, data.ncols()));
    let mut sizes = vec![0usize; k];
    for (i, &c) in encoded.iter().enumerate() {
        let mut row = centroids.row_mut(c);
        row += &data.row(i);
        sizes[c] += 1;
    }
    for c in 0..k {
        let size = sizes[c] as f64;
        centroids.row_mut(c).mapv_inplace(|v| v / size);
    }
    (centroids, sizes)
}

fn build_contingency_table(
    pred: &[usize],
    truth: &[usize],
) -> (HashMap<(usize, usize), usize>, usize) {
    let mut table = HashMap::new();
    for (&p, &t) in pred.iter().zip(truth.iter()) {
        *table.entry((p, t)).or_insert(0) += 1;
    }
    (table, pred.len())
}

fn comb2(n: usize) -> usize {
    if n < 2 {
        0
    } else {
        n * (n - 1) / 2
    }
}

fn entropy<'a>(counts: impl Iterator<Item = &'a usize>, n: f64) -> f64 {
    counts
        .map(|&c| {
            let p = c as f64 / n;
            if p > 0.0 {
                -p * p.ln()
            } else {
                0.0
            }
        })
        .sum()
}
