//! TF-IDF feature extraction.
//!
//! Each document becomes one row of a sparse [`FeatureMatrix`]; each distinct
//! term surviving [`Tokenizer`] becomes one column.
//!
//! # Weighting
//!
//! ```text
//! tf'(t, d) = 1 + ln(tf(t, d))            (sublinear, tf > 0)
//! idf(t)    = ln((1 + n) / (1 + df(t))) + 1
//! w(t, d)   = tf'(t, d) × idf(t), then each row scaled to unit L2 norm
//! ```
//!
//! Sublinear scaling stops a document that repeats one term fifty times from
//! dominating its row. The smoothed idf never reaches zero, so a term that
//! occurs in every document still carries (minimal) weight.
//!
//! Columns are ordered lexicographically by term, so the same corpus always
//! yields the same matrix.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use ndarray::Array2;
use tracing::debug;

use crate::error::{Error, Result};
use crate::text::Tokenizer;

/// Row-major sparse matrix of TF-IDF weights.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    n_rows: usize,
    n_cols: usize,
    /// Row i's entries are at `row_ptr[i]..row_ptr[i + 1]`.
    row_ptr: Vec<usize>,
    /// Column of each stored entry, ascending within a row.
    col_idx: Vec<usize>,
    /// Weight of each stored entry.
    values: Vec<f32>,
}

impl FeatureMatrix {
    /// Build from per-row `(column, value)` lists.
    pub fn from_rows(n_cols: usize, rows: Vec<Vec<(usize, f32)>>) -> Result<Self> {
        let n_rows = rows.len();
        let mut row_ptr = Vec::with_capacity(n_rows + 1);
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        row_ptr.push(0);

        for mut row in rows {
            row.sort_by_key(|&(c, _)| c);
            for (c, v) in row {
                if c >= n_cols {
                    return Err(Error::DimensionMismatch {
                        expected: n_cols,
                        found: c + 1,
                    });
                }
                col_idx.push(c);
                values.push(v);
            }
            row_ptr.push(col_idx.len());
        }

        Ok(Self {
            n_rows,
            n_cols,
            row_ptr,
            col_idx,
            values,
        })
    }

    /// Number of rows (documents).
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns (vocabulary terms).
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Stored `(column, value)` pairs of one row.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f32)> + '_ {
        let (start, end) = (self.row_ptr[i], self.row_ptr[i + 1]);
        (start..end).map(move |j| (self.col_idx[j], self.values[j]))
    }

    /// Whether row `i` has no non-zero weight.
    pub fn is_zero_row(&self, i: usize) -> bool {
        self.row(i).all(|(_, v)| v == 0.0)
    }

    /// Number of rows with at least one non-zero weight.
    pub fn non_zero_rows(&self) -> usize {
        (0..self.n_rows).filter(|&i| !self.is_zero_row(i)).count()
    }

    /// Dense copy, one row per document.
    pub fn to_dense(&self) -> Array2<f32> {
        let mut dense = Array2::zeros((self.n_rows, self.n_cols));
        for i in 0..self.n_rows {
            for (c, v) in self.row(i) {
                dense[[i, c]] = v;
            }
        }
        dense
    }
}

/// Fits a vocabulary on a corpus and weights it with sublinear TF-IDF.
#[derive(Debug)]
pub struct TfidfVectorizer {
    tokenizer: Tokenizer,
    sublinear_tf: bool,
    vocabulary: Vec<String>,
    idf: Vec<f32>,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TfidfVectorizer {
    /// Sublinear TF with the default tokenizer.
    pub fn new() -> Self {
        Self {
            tokenizer: Tokenizer::new(),
            sublinear_tf: true,
            vocabulary: Vec::new(),
            idf: Vec::new(),
        }
    }

    /// Use a custom tokenizer.
    pub fn with_tokenizer(mut self, tokenizer: Tokenizer) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    /// Toggle `1 + ln(tf)` scaling (on by default).
    pub fn with_sublinear_tf(mut self, sublinear: bool) -> Self {
        self.sublinear_tf = sublinear;
        self
    }

    /// Terms, in column order. Empty before fitting.
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Inverse document frequency per column.
    pub fn idf(&self) -> &[f32] {
        &self.idf
    }

    /// Learn the vocabulary and idf from `texts` and return their matrix.
    pub fn fit_transform(&mut self, texts: &[&str]) -> Result<FeatureMatrix> {
        if texts.is_empty() {
            return Err(Error::EmptyInput);
        }

        let counts: Vec<HashMap<String, usize>> = texts
            .iter()
            .map(|text| {
                let mut tf = HashMap::new();
                for term in self.tokenizer.tokenize(text) {
                    *tf.entry(term).or_insert(0usize) += 1;
                }
                tf
            })
            .collect();

        let terms: BTreeSet<&str> = counts
            .iter()
            .flat_map(|tf| tf.keys().map(String::as_str))
            .collect();
        if terms.is_empty() {
            return Err(Error::DegenerateInput(
                "no terms survived tokenization".to_string(),
            ));
        }

        let columns: BTreeMap<&str, usize> =
            terms.iter().enumerate().map(|(i, &t)| (t, i)).collect();

        let mut df = vec![0usize; columns.len()];
        for tf in &counts {
            for term in tf.keys() {
                df[columns[term.as_str()]] += 1;
            }
        }

        let n = texts.len() as f32;
        let idf: Vec<f32> = df
            .iter()
            .map(|&d| ((1.0 + n) / (1.0 + d as f32)).ln() + 1.0)
            .collect();

        let rows = counts
            .iter()
            .map(|tf| {
                let mut row: Vec<(usize, f32)> = tf
                    .iter()
                    .map(|(term, &count)| {
                        let col = columns[term.as_str()];
                        let tf_weight = if self.sublinear_tf {
                            1.0 + (count as f32).ln()
                        } else {
                            count as f32
                        };
                        (col, tf_weight * idf[col])
                    })
                    .collect();
                l2_normalize(&mut row);
                row
            })
            .collect();

        self.vocabulary = columns.keys().map(|t| t.to_string()).collect();
        self.idf = idf;

        let matrix = FeatureMatrix::from_rows(self.vocabulary.len(), rows)?;
        debug!(
            rows = matrix.n_rows(),
            cols = matrix.n_cols(),
            nnz = matrix.nnz(),
            "built tf-idf matrix"
        );

        Ok(matrix)
    }
}

fn l2_normalize(row: &mut [(usize, f32)]) {
    let norm = row.iter().map(|(_, v)| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for (_, v) in row.iter_mut() {
            *v /= norm;
        }
    }
}
