//! Per-cluster reports.
//!
//! A report condenses the documents of one cluster into its most frequent
//! words, the data a word cloud is drawn from. Summarization is pluggable
//! through [`ClusterSummarizer`]; [`TermFrequencySummarizer`] is the
//! built-in strategy.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{Error, Result};
use crate::text::StopwordFilter;

/// Condenses the texts of one cluster.
pub trait ClusterSummarizer<S = Vec<TermCount>> {
    /// Summarize the texts of a single cluster.
    fn summarize(&self, texts: &[&str]) -> S;
}

/// A word and how often it occurs in a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermCount {
    /// Lowercased word.
    pub term: String,
    /// Occurrences.
    pub count: usize,
}

/// Most frequent non-stopword words of a cluster.
#[derive(Debug, Clone)]
pub struct TermFrequencySummarizer {
    max_words: usize,
    stopwords: StopwordFilter,
}

impl Default for TermFrequencySummarizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TermFrequencySummarizer {
    /// Top 100 words, English stopwords removed.
    pub fn new() -> Self {
        Self {
            max_words: 100,
            stopwords: StopwordFilter::english(),
        }
    }

    /// Cap the number of words kept.
    pub fn with_max_words(mut self, max_words: usize) -> Self {
        self.max_words = max_words;
        self
    }

    /// Replace the stopword filter.
    pub fn with_stopwords(mut self, stopwords: StopwordFilter) -> Self {
        self.stopwords = stopwords;
        self
    }
}

impl ClusterSummarizer for TermFrequencySummarizer {
    fn summarize(&self, texts: &[&str]) -> Vec<TermCount> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for text in texts {
            let lower = text.to_lowercase();
            for word in lower.unicode_words() {
                if word.chars().count() < 2 || !word.chars().all(char::is_alphabetic) {
                    continue;
                }
                if self.stopwords.is_stopword(word) {
                    continue;
                }
                *counts.entry(word.to_string()).or_insert(0) += 1;
            }
        }

        let mut terms: Vec<TermCount> = counts
            .into_iter()
            .map(|(term, count)| TermCount { term, count })
            .collect();
        terms.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.term.cmp(&b.term)));
        terms.truncate(self.max_words);
        terms
    }
}

/// A summarizer backed by a closure.
#[derive(Clone)]
pub struct FnSummarizer<F> {
    f: F,
}

impl<F> FnSummarizer<F> {
    /// Wrap `f`.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<S, F> ClusterSummarizer<S> for FnSummarizer<F>
where
    F: Fn(&[&str]) -> S,
{
    fn summarize(&self, texts: &[&str]) -> S {
        (self.f)(texts)
    }
}

/// Create a summarizer from a closure.
pub fn from_fn<S, F>(f: F) -> FnSummarizer<F>
where
    F: Fn(&[&str]) -> S,
{
    FnSummarizer::new(f)
}

/// Summary of one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterReport<S = Vec<TermCount>> {
    /// Run tag, e.g. `4-ac-w`.
    pub tag: String,
    /// Cluster label.
    pub cluster: usize,
    /// Documents in the cluster.
    pub size: usize,
    /// Summarizer output.
    pub summary: S,
}

impl<S> ClusterReport<S> {
    /// `<tag>-cluster<i>.json`.
    pub fn file_name(&self) -> String {
        format!("{}-cluster{}.json", self.tag, self.cluster)
    }
}

/// Texts grouped by label; entry `i` holds cluster `i`.
///
/// Clusters without documents yield an empty group.
pub fn group_by_label<'a, T: AsRef<str>>(
    labels: &[usize],
    texts: &'a [T],
    cluster_count: usize,
) -> Result<Vec<Vec<&'a str>>> {
    if labels.len() != texts.len() {
        return Err(Error::DimensionMismatch {
            expected: texts.len(),
            found: labels.len(),
        });
    }
    let mut groups = vec![Vec::new(); cluster_count];
    for (&label, text) in labels.iter().zip(texts) {
        let group = groups.get_mut(label).ok_or(Error::InvalidParameter {
            name: "labels",
            message: "label not below the cluster count",
        })?;
        group.push(text.as_ref());
    }
    Ok(groups)
}

/// Summarize every cluster of an assignment.
pub fn build_reports<S, T, Z>(
    tag: &str,
    labels: &[usize],
    texts: &[T],
    cluster_count: usize,
    summarizer: &Z,
) -> Result<Vec<ClusterReport<S>>>
where
    T: AsRef<str>,
    Z: ClusterSummarizer<S> + ?Sized,
{
    let groups = group_by_label(labels, texts, cluster_count)?;
    Ok(groups
        .iter()
        .enumerate()
        .map(|(cluster, group)| ClusterReport {
            tag: tag.to_string(),
            cluster,
            size: group.len(),
            summary: summarizer.summarize(group),
        })
        .collect())
}

/// Write each report as pretty JSON under `dir`, creating it if needed.
pub fn write_reports<S: Serialize>(
    dir: impl AsRef<Path>,
    reports: &[ClusterReport<S>],
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(reports.len());
    for report in reports {
        let path = dir.join(report.file_name());
        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(writer, report)?;
        info!(path = %path.display(), size = report.size, "wrote cluster report");
        written.push(path);
    }
    Ok(written)
}
