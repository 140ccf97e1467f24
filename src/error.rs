use core::fmt;

/// Result alias for `newscluster`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the vectorizer, the clustering strategies and the metrics.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Input was empty.
    EmptyInput,

    /// Corpus is below the minimum clusterable size.
    InsufficientCorpus {
        /// Documents supplied.
        found: usize,
        /// Documents required.
        minimum: usize,
    },

    /// Vectorization produced no usable features.
    DegenerateInput(String),

    /// Matrix dimension mismatch.
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// Invalid number of clusters requested.
    InvalidClusterCount {
        /// Requested count.
        requested: usize,
        /// Number of items.
        n_items: usize,
    },

    /// The metric has no value for this label assignment.
    UndefinedMetric {
        /// Metric name.
        metric: &'static str,
        /// Why it is undefined.
        reason: String,
    },

    /// Evaluation method name not recognised.
    UnknownEvaluationMethod(String),

    /// Linkage name not recognised.
    UnknownLinkage(String),

    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// The operation observed a cancellation request.
    Cancelled,

    /// Filesystem failure.
    Io(String),

    /// Malformed JSON or YAML input.
    Parse(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input provided"),
            Error::InsufficientCorpus { found, minimum } => {
                write!(
                    f,
                    "corpus has {found} documents, at least {minimum} are required"
                )
            }
            Error::DegenerateInput(msg) => write!(f, "degenerate input: {msg}"),
            Error::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
            Error::InvalidClusterCount { requested, n_items } => {
                write!(f, "cannot create {requested} clusters from {n_items} items")
            }
            Error::UndefinedMetric { metric, reason } => {
                write!(f, "{metric} is undefined: {reason}")
            }
            Error::UnknownEvaluationMethod(name) => {
                write!(f, "unknown evaluation method '{name}'")
            }
            Error::UnknownLinkage(name) => write!(f, "unknown linkage '{name}'"),
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
            Error::Cancelled => write!(f, "operation cancelled"),
            Error::Io(msg) => write!(f, "io error: {msg}"),
            Error::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Parse(e.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Parse(e.to_string())
    }
}

impl Error {
    /// Whether the error invalidates the whole session rather than one call.
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self,
            Error::InsufficientCorpus { .. } | Error::DegenerateInput(_) | Error::EmptyInput
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let e = Error::InsufficientCorpus {
            found: 14,
            minimum: 15,
        };
        assert_eq!(
            e.to_string(),
            "corpus has 14 documents, at least 15 are required"
        );

        let e = Error::InvalidClusterCount {
            requested: 20,
            n_items: 15,
        };
        assert_eq!(e.to_string(), "cannot create 20 clusters from 15 items");
    }

    #[test]
    fn test_session_fatal_split() {
        assert!(Error::DegenerateInput("empty".into()).is_session_fatal());
        assert!(!Error::Cancelled.is_session_fatal());
        assert!(!Error::InvalidClusterCount {
            requested: 1,
            n_items: 15
        }
        .is_session_fatal());
    }
}
