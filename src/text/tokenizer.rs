use std::fmt;

use rust_stemmers::{Algorithm, Stemmer};
use unicode_segmentation::UnicodeSegmentation;

use super::stopwords::StopwordFilter;

/// Splits, lowercases, stems and filters article text.
pub struct Tokenizer {
    stemmer: Stemmer,
    stopwords: StopwordFilter,
}

impl fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tokenizer")
            .field("stemmer", &"english")
            .field("stopwords", &self.stopwords.len())
            .finish()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    /// English stemmer and English stopwords.
    pub fn new() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::English),
            stopwords: StopwordFilter::english(),
        }
    }

    /// Replace the stopword filter.
    pub fn with_stopwords(mut self, stopwords: StopwordFilter) -> Self {
        self.stopwords = stopwords;
        self
    }

    /// Stopwords in use.
    pub fn stopwords(&self) -> &StopwordFilter {
        &self.stopwords
    }

    /// Normalised terms of `text`, in order of appearance.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        segment_words(text)
            .into_iter()
            .map(|token| token.to_lowercase())
            .map(|token| self.stemmer.stem(&token).into_owned())
            .filter(|stem| !self.stopwords.is_stopword(stem))
            .filter(|stem| is_term(stem))
            .collect()
    }
}

/// Whether every character is an ASCII letter or a hyphen.
pub fn is_term(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_alphabetic() || c == '-')
}

fn is_word_segment(seg: &str) -> bool {
    seg.chars().any(char::is_alphanumeric)
}

/// Word-level tokens on UAX #29 boundaries.
///
/// UAX #29 breaks at `-`; `word-word` runs are re-joined into one token.
/// Punctuation segments are kept as tokens (later filtering drops them),
/// whitespace is not.
fn segment_words(text: &str) -> Vec<String> {
    let segments: Vec<&str> = text.split_word_bounds().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < segments.len() {
        let seg = segments[i];
        if seg.trim().is_empty() {
            i += 1;
            continue;
        }

        if !is_word_segment(seg) {
            tokens.push(seg.to_string());
            i += 1;
            continue;
        }

        let mut token = seg.to_string();
        i += 1;
        while i + 1 < segments.len() && segments[i] == "-" && is_word_segment(segments[i + 1]) {
            token.push('-');
            token.push_str(segments[i + 1]);
            i += 2;
        }
        tokens.push(token);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_sentence() {
        let tokenizer = Tokenizer::new();
        let tokens = tokenizer.tokenize("The Quick-Brown Fox jumps 123 times!");
        assert_eq!(tokens, vec!["quick-brown", "fox", "jump", "time"]);
    }

    #[test]
    fn test_idempotent() {
        let tokenizer = Tokenizer::new();
        let text = "Compilers are compiling compiled programs, again and again.";
        assert_eq!(tokenizer.tokenize(text), tokenizer.tokenize(text));
    }

    #[test]
    fn test_degenerate_input_is_empty() {
        let tokenizer = Tokenizer::new();
        assert!(tokenizer.tokenize("").is_empty());
        assert!(tokenizer.tokenize("123 456, 7.89 !!! ???").is_empty());
        assert!(tokenizer.tokenize("the and of").is_empty());
    }

    #[test]
    fn test_non_ascii_dropped() {
        let tokenizer = Tokenizer::new();
        let tokens = tokenizer.tokenize("café rust");
        assert_eq!(tokens, vec!["rust"]);
    }

    #[test]
    fn test_segment_words_hyphen_runs() {
        let segs = segment_words("state-of-the-art tools - really");
        assert_eq!(segs, vec!["state-of-the-art", "tools", "-", "really"]);
    }

    #[test]
    fn test_is_term() {
        assert!(is_term("quick-brown"));
        assert!(!is_term("v2"));
        assert!(!is_term("don't"));
        assert!(!is_term(""));
    }
}
