//! Text normalisation: word segmentation, stemming and filtering.
//!
//! The [`Tokenizer`] turns raw article text into the term sequence the
//! TF-IDF vectorizer counts. The pipeline, in order:
//!
//! | Step | Operation |
//! |------|-----------|
//! | 1 | Split on Unicode word boundaries (hyphenated compounds kept whole) |
//! | 2 | Lowercase |
//! | 3 | Stem (Snowball English, the Porter2 revision of Porter's algorithm) |
//! | 4 | Drop stopwords (checked against the stem) |
//! | 5 | Drop tokens with any character outside `[a-zA-Z-]` |
//!
//! Degenerate input (numbers, punctuation) produces an empty sequence; that
//! is a valid zero-feature document, not an error.

mod stopwords;
mod tokenizer;

pub use stopwords::{StopwordFilter, ENGLISH};
pub use tokenizer::{is_term, Tokenizer};
