//! End-to-end tests: corpus through vectorizer, clustering and evaluation.

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use chrono::{TimeZone, Utc};

    use crate::cluster::Linkage;
    use crate::config::SessionConfig;
    use crate::corpus::{Corpus, CrawlRecord, Document};
    use crate::error::Error;
    use crate::metrics::{ari, EvaluationMethod};
    use crate::report::{build_reports, TermFrequencySummarizer};
    use crate::session::{ClusteringSession, Strategy};
    use crate::CancellationToken;

    const SPACE: [&str; 10] = [
        "rocket", "orbit", "launch", "satellite", "astronaut", "mission", "telescope", "galaxy",
        "planet", "booster",
    ];
    const FOOTBALL: [&str; 10] = [
        "football", "goal", "striker", "league", "match", "referee", "stadium", "coach", "penalty",
        "season",
    ];

    /// Every story of a topic shares its first word; the body is otherwise
    /// stopwords, so the two topics have disjoint vocabularies.
    fn article(words: &[&str; 10], i: usize) -> Document {
        let pick = |j: usize| words[1 + (i + 2 * j) % 9];
        Document::new(
            format!("story {i}"),
            format!(
                "The {} and the {} of the {} with {}.",
                words[0],
                pick(0),
                pick(1),
                pick(2)
            ),
        )
    }

    /// `per_topic` space stories followed by `per_topic` football stories.
    fn two_topics(per_topic: usize) -> Corpus {
        (0..per_topic)
            .map(|i| article(&SPACE, i))
            .chain((0..per_topic).map(|i| article(&FOOTBALL, i)))
            .collect()
    }

    fn truth(per_topic: usize) -> Vec<usize> {
        (0..2 * per_topic).map(|i| i / per_topic).collect()
    }

    fn seeded() -> SessionConfig {
        SessionConfig::default().with_seed(42)
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("newscluster-session-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_small_corpus_rejected_before_vectorizing() {
        let corpus: Corpus = (0..14).map(|i| Document::new("t", format!("{i} !!!"))).collect();
        let err = ClusteringSession::new(&corpus, SessionConfig::default()).unwrap_err();
        assert_eq!(
            err,
            Error::InsufficientCorpus {
                found: 14,
                minimum: 15
            }
        );
        assert!(err.is_session_fatal());
    }

    #[test]
    fn test_all_zero_corpus_is_degenerate() {
        let corpus: Corpus = (0..15).map(|i| Document::new("t", format!("{i} 42 ... ?"))).collect();
        let err = ClusteringSession::new(&corpus, SessionConfig::default()).unwrap_err();
        assert!(matches!(err, Error::DegenerateInput(_)));
    }

    #[test]
    fn test_matrix_rows_match_documents() {
        let corpus = two_topics(10);
        let session = ClusteringSession::new(&corpus, seeded()).unwrap();
        assert_eq!(session.n_documents(), 20);
        assert_eq!(session.feature_matrix().n_rows(), 20);
        assert_eq!(session.dense_matrix().nrows(), 20);
        assert_eq!(session.feature_matrix().n_cols(), session.vocabulary().len());
        assert_eq!(session.texts().len(), 20);
    }

    #[test]
    fn test_identical_documents_do_not_crash() {
        let corpus: Corpus = (0..15)
            .map(|_| Document::new("t", "Markets rally as investors cheer earnings"))
            .collect();
        let session = ClusteringSession::new(&corpus, seeded()).unwrap();

        let flat = session.flat_clustering(Some(2), None).unwrap();
        assert!(flat.labels().iter().all(|&l| l < 2));
        assert_eq!(flat.empty_clusters(), 1);
        assert!(matches!(
            session.evaluate(flat.labels(), EvaluationMethod::Silhouette),
            Err(Error::UndefinedMetric { .. })
        ));

        let single = session.agglomerative_clustering(Some(2), Linkage::Single).unwrap();
        assert_eq!(single.cluster_sizes().iter().filter(|&&s| s > 0).count(), 2);
        let s = session
            .evaluate(single.labels(), EvaluationMethod::Silhouette)
            .unwrap();
        assert!(s.abs() < 1e-12);
    }

    #[test]
    fn test_labels_below_cluster_count() {
        let session = ClusteringSession::new(&two_topics(10), seeded()).unwrap();
        for strategy in Strategy::ALL {
            for k in 2..=6 {
                let assignment = session.cluster(strategy, Some(k), None).unwrap();
                assert_eq!(assignment.labels().len(), 20);
                assert_eq!(assignment.cluster_count(), k);
                assert_eq!(assignment.strategy(), strategy);
                assert!(assignment.labels().iter().all(|&l| l < k), "{strategy} k={k}");
            }
        }
    }

    #[test]
    fn test_topics_recovered_by_every_strategy() {
        let session = ClusteringSession::new(&two_topics(10), seeded()).unwrap();
        let truth = truth(10);
        for strategy in Strategy::ALL {
            let assignment = session.cluster(strategy, Some(2), None).unwrap();
            let agreement = ari(assignment.labels(), &truth);
            assert!((agreement - 1.0).abs() < 1e-9, "{strategy}: ari {agreement}");

            let s = session
                .evaluate(assignment.labels(), EvaluationMethod::Silhouette)
                .unwrap();
            assert!(s > 0.0, "{strategy}: silhouette {s}");
        }
    }

    #[test]
    fn test_davies_bouldin_is_reproducible() {
        let session = ClusteringSession::new(&two_topics(10), seeded()).unwrap();
        let a = session.flat_clustering(Some(2), None).unwrap();
        let b = session.flat_clustering(Some(2), None).unwrap();
        assert_eq!(a, b);

        let db_a = session
            .evaluate(a.labels(), EvaluationMethod::DaviesBouldin)
            .unwrap();
        let db_b = session
            .evaluate(b.labels(), EvaluationMethod::DaviesBouldin)
            .unwrap();
        assert!(db_a >= 0.0);
        assert_eq!(db_a, db_b);

        let method: EvaluationMethod = "DAVIES_BOULDIN".parse().unwrap();
        assert_eq!(session.evaluate(a.labels(), method).unwrap(), db_a);
    }

    #[test]
    fn test_explicit_seed_overrides_config() {
        let session = ClusteringSession::new(&two_topics(10), SessionConfig::default()).unwrap();
        let a = session.flat_clustering(Some(4), Some(5)).unwrap();
        let b = session.flat_clustering(Some(4), Some(5)).unwrap();
        assert_eq!(a.labels(), b.labels());
    }

    #[test]
    fn test_automatic_count_in_range() {
        let session = ClusteringSession::new(&two_topics(10), seeded()).unwrap();
        for strategy in Strategy::ALL {
            let selection = session.optimal_cluster_count(strategy, None).unwrap();
            assert!((2..=14).contains(&selection.cluster_count), "{strategy}");
            assert_eq!(selection.scores.len(), 13);

            let assignment = session.cluster(strategy, None, None).unwrap();
            assert!((2..=14).contains(&assignment.cluster_count()));
            assert!(assignment
                .labels()
                .iter()
                .all(|&l| l < assignment.cluster_count()));
        }
    }

    #[test]
    fn test_search_range_is_bounded() {
        let config = seeded().with_parallel_search(false);
        let session = ClusteringSession::new(&two_topics(8), config).unwrap();
        let selection = session
            .optimal_cluster_count(Strategy::Hierarchical(Linkage::Average), None)
            .unwrap();
        assert_eq!(selection.scores.first().map(|c| c.k), Some(2));
        assert_eq!(selection.scores.last().map(|c| c.k), Some(14));

        let session = ClusteringSession::new(&two_topics(8), seeded().with_cluster_range(3, 6)).unwrap();
        let selection = session
            .optimal_cluster_count(Strategy::Partitional, None)
            .unwrap();
        let searched: Vec<usize> = selection.scores.iter().map(|c| c.k).collect();
        assert_eq!(searched, vec![3, 4, 5, 6]);
        assert!((3..=6).contains(&selection.cluster_count));
    }

    #[test]
    fn test_config_cannot_widen_limits() {
        let err = ClusteringSession::new(&two_topics(10), seeded().with_cluster_range(2, 30)).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidParameter {
                name: "max_clusters",
                ..
            }
        ));

        let loose = SessionConfig {
            min_documents: 3,
            ..seeded()
        };
        let err = ClusteringSession::new(&two_topics(5), loose).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidParameter {
                name: "min_documents",
                ..
            }
        ));

        let err = ClusteringSession::new(&two_topics(5), seeded()).unwrap_err();
        assert_eq!(
            err,
            Error::InsufficientCorpus {
                found: 10,
                minimum: 15
            }
        );
    }

    #[test]
    fn test_per_call_errors_keep_session_usable() {
        let session = ClusteringSession::new(&two_topics(10), seeded()).unwrap();

        for k in [0, 1, 20, 21] {
            let err = session.flat_clustering(Some(k), None).unwrap_err();
            assert_eq!(
                err,
                Error::InvalidClusterCount {
                    requested: k,
                    n_items: 20
                }
            );
            assert!(!err.is_session_fatal());
            assert!(session
                .agglomerative_clustering(Some(k), Linkage::Ward)
                .is_err());
        }

        let collapsed = vec![0; 20];
        assert!(matches!(
            session.evaluate(&collapsed, EvaluationMethod::CalinskiHarabasz),
            Err(Error::UndefinedMetric { .. })
        ));

        let assignment = session.flat_clustering(Some(19), None).unwrap();
        assert_eq!(assignment.labels().len(), 20);
        for (method, score) in session.evaluate_all(truth(10).as_slice()) {
            assert!(score.is_ok(), "{method}");
        }
    }

    #[test]
    fn test_cancelled_session_stops() {
        let token = CancellationToken::new();
        let session = ClusteringSession::new(&two_topics(10), seeded())
            .unwrap()
            .with_cancellation(token.clone());
        token.cancel();

        assert_eq!(session.flat_clustering(Some(2), None), Err(Error::Cancelled));
        assert_eq!(
            session.optimal_cluster_count(Strategy::Hierarchical(Linkage::Ward), None),
            Err(Error::Cancelled)
        );
    }

    #[test]
    fn test_crawl_file_to_reports() {
        let dir = scratch_dir("crawl");
        let record = CrawlRecord {
            fetched_at: Utc.with_ymd_and_hms(2021, 5, 1, 10, 0, 0).unwrap(),
            news: two_topics(10).documents().to_vec(),
        };
        let path = dir.join("crawling_result.json");
        fs::write(&path, serde_json::to_string_pretty(&record).unwrap()).unwrap();

        let config_path = dir.join("session.yaml");
        fs::write(&config_path, "seed: 3\nmax_clusters: 6\n").unwrap();
        let config = SessionConfig::from_yaml_file(&config_path).unwrap();
        assert_eq!(config.seed, Some(3));

        let corpus = Corpus::from_json_file(&path).unwrap();
        assert_eq!(corpus.fetched_at(), Some(record.fetched_at));
        let session = ClusteringSession::new(&corpus, config).unwrap();

        let ward = session
            .agglomerative_clustering(Some(2), Linkage::Ward)
            .unwrap();
        let reports = build_reports(
            "2-ac-w",
            ward.labels(),
            session.texts(),
            ward.cluster_count(),
            &TermFrequencySummarizer::new(),
        )
        .unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports.iter().map(|r| r.size).sum::<usize>(), 20);
        for report in &reports {
            assert!(!report.summary.is_empty());
            assert!(report.summary.iter().all(|t| t.term != "the"));
        }

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_crawl_file() {
        let err = Corpus::from_json_file("/nonexistent/newscluster/crawl.json").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
