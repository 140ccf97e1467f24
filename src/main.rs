//! # newscluster
//!
//! Clusters a crawled news corpus with k-means and the four agglomerative
//! linkages, prints internal validity scores for each, and writes the most
//! frequent words of every cluster to `<output-dir>/<k>-<strategy>-cluster<i>.json`.
//!
//! ## Usage
//!
//! ```sh
//! newscluster -f crawling_result.json -k 4,2 --auto
//! ```

use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use newscluster::report::{build_reports, write_reports};
use newscluster::{
    ari, ClusterAssignment, ClusteringSession, Corpus, Result, SessionConfig, Strategy,
    TermFrequencySummarizer,
};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;

use cli::Cli;

fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    match run(&args) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failed) => {
            warn!(failed, "some clustering rounds failed");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(error = %e, "clustering aborted");
            ExitCode::FAILURE
        }
    }
}

/// Load, vectorize and run every requested round. Returns the number of
/// rounds that failed.
fn run(args: &Cli) -> Result<usize> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::from_yaml_file(path)?,
        None => SessionConfig::default(),
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    let mut corpus = Corpus::from_json_file(&args.filename)?;
    if let Some(count) = args.count {
        corpus = corpus.truncate(count);
    }
    match corpus.fetched_at() {
        Some(at) => info!(fetched_at = %at.to_rfc3339(), documents = corpus.len(), "Begin clustering"),
        None => info!(documents = corpus.len(), "Begin clustering"),
    }

    let started = Instant::now();
    let session = ClusteringSession::new(&corpus, config)?;
    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        terms = session.vocabulary().len(),
        "Vectorized corpus"
    );

    let rounds: Vec<Option<usize>> = args
        .clusters
        .iter()
        .copied()
        .map(Some)
        .chain(args.auto.then_some(None))
        .collect();

    let mut failed = 0;
    for cluster_count in rounds {
        if let Err(e) = run_round(&session, cluster_count, args) {
            if e.is_session_fatal() {
                return Err(e);
            }
            error!(?cluster_count, error = %e, "clustering round failed");
            failed += 1;
        }
    }
    Ok(failed)
}

/// Every strategy at one cluster count (`None` = chosen per strategy).
fn run_round(session: &ClusteringSession, cluster_count: Option<usize>, args: &Cli) -> Result<()> {
    let heading = cluster_count.map_or_else(|| "AUTO".to_string(), |k| k.to_string());
    println!("--- BEGIN CLUSTERING WITH {heading} CLUSTERS ---");

    let mut runs: Vec<ClusterAssignment> = Vec::with_capacity(Strategy::ALL.len());
    for strategy in Strategy::ALL {
        let started = Instant::now();
        let assignment = session.cluster(strategy, cluster_count, None)?;
        info!(
            %strategy,
            k = assignment.cluster_count(),
            documents = session.n_documents(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Finished clustering"
        );
        runs.push(assignment);
    }

    for assignment in &runs {
        let scores: Vec<String> = session
            .evaluate_all(assignment.labels())
            .into_iter()
            .map(|(method, score)| match score {
                Ok(v) => format!("{method}={v:.4}"),
                Err(e) => format!("{method}=undefined ({e})"),
            })
            .collect();
        println!(
            "{:<5} k={:<2} {}",
            assignment.strategy().tag().to_uppercase(),
            assignment.cluster_count(),
            scores.join("  ")
        );
    }

    if let Some((flat, rest)) = runs.split_first() {
        for assignment in rest {
            println!(
                "ARI {} vs FC: {:.4}",
                assignment.strategy().tag().to_uppercase(),
                ari(assignment.labels(), flat.labels())
            );
        }
    }

    println!("--- END CLUSTERING WITH {heading} CLUSTERS ---");

    if !args.no_report {
        let summarizer = TermFrequencySummarizer::new();
        for assignment in &runs {
            let tag = format!("{}-{}", assignment.cluster_count(), assignment.strategy().tag());
            let reports = build_reports(
                &tag,
                assignment.labels(),
                session.texts(),
                assignment.cluster_count(),
                &summarizer,
            )?;
            let paths = write_reports(&args.output_dir, &reports)?;
            info!(%tag, files = paths.len(), dir = %args.output_dir.display(), "Generated reports");
        }
    }
    Ok(())
}
