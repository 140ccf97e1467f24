//! Command-line interface definitions for `newscluster`.

use std::path::PathBuf;

use clap::Parser;

/// Cluster a crawl result with every strategy and compare them.
///
/// # Examples
///
/// ```sh
/// # 4 and 2 clusters over the default crawl file
/// newscluster
///
/// # First 120 documents, k = 3, 5 and the automatic choice, reproducible
/// newscluster -f hn.json -c 120 -k 3,5 --auto --seed 7
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Crawl result to read
    #[arg(short, long, default_value = "crawling_result.json")]
    pub filename: PathBuf,

    /// Cluster only the first N documents
    #[arg(short, long)]
    pub count: Option<usize>,

    /// Cluster counts to compare, comma separated
    #[arg(short = 'k', long, value_delimiter = ',', default_values_t = [4, 2])]
    pub clusters: Vec<usize>,

    /// Also run every strategy with an automatically chosen count
    #[arg(long)]
    pub auto: bool,

    /// Seed for k-means
    #[arg(long)]
    pub seed: Option<u64>,

    /// Optional path to a session config YAML file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory for per-cluster reports
    #[arg(short, long, default_value = "wc")]
    pub output_dir: PathBuf,

    /// Skip writing reports
    #[arg(long)]
    pub no_report: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["newscluster"]);

        assert_eq!(cli.filename, PathBuf::from("crawling_result.json"));
        assert_eq!(cli.clusters, vec![4, 2]);
        assert_eq!(cli.output_dir, PathBuf::from("wc"));
        assert!(cli.count.is_none());
        assert!(!cli.auto);
        assert!(!cli.no_report);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "newscluster",
            "-f",
            "/tmp/hn.json",
            "-c",
            "120",
            "-k",
            "3,5,8",
            "-o",
            "/tmp/wc",
        ]);

        assert_eq!(cli.filename, PathBuf::from("/tmp/hn.json"));
        assert_eq!(cli.count, Some(120));
        assert_eq!(cli.clusters, vec![3, 5, 8]);
        assert_eq!(cli.output_dir, PathBuf::from("/tmp/wc"));
    }

    #[test]
    fn test_cli_long_flags() {
        let cli = Cli::parse_from([
            "newscluster",
            "--auto",
            "--seed",
            "42",
            "--config",
            "session.yaml",
            "--no-report",
        ]);

        assert!(cli.auto);
        assert_eq!(cli.seed, Some(42));
        assert_eq!(cli.config, Some(PathBuf::from("session.yaml")));
        assert!(cli.no_report);
    }

    #[test]
    fn test_cli_rejects_bad_count() {
        assert!(Cli::try_parse_from(["newscluster", "-k", "four"]).is_err());
    }
}
