//! Tokenizer and stemmer with position tracking

use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;

lazy_static! {
    static ref WORD_RE: Regex = Regex::new(r"\b[\w']+\b").expect("valid regex");
}

/// A retained token: its stem and its position in the raw token stream
pub type Token = (String, u32);

/// Tokenizer, stemmer and stopword filter
///
/// Positions count every raw token, including the stopwords that are dropped,
/// so emitted positions have gaps where stopwords were removed.
pub struct Normalizer {
    stemmer: Stemmer,
    stopwords: HashSet<String>,
}

impl Normalizer {
    /// Creates a normalizer with the given raw stopwords
    ///
    /// Stopwords are lowercased and stemmed so they compare against stems.
    pub fn new<I, S>(stopwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let stemmer = Stemmer::create(Algorithm::English);
        let stopwords = stopwords
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .map(|w| stemmer.stem(&w).into_owned())
            .collect();

        Self { stemmer, stopwords }
    }

    /// Creates a normalizer that keeps every token
    pub fn without_stopwords() -> Self {
        Self::new(std::iter::empty::<&str>())
    }

    /// Splits text into `(stem, position)` pairs, dropping stopwords
    pub fn normalize(&self, text: &str) -> Vec<Token> {
        let lowered = text.to_lowercase();

        WORD_RE
            .find_iter(&lowered)
            .enumerate()
            .filter_map(|(pos, m)| {
                let stem = self.stem(m.as_str());
                if self.is_stopword(&stem) {
                    None
                } else {
                    Some((stem, pos as u32))
                }
            })
            .collect()
    }

    /// Stems a single already-lowercased word
    pub fn stem(&self, word: &str) -> String {
        self.stemmer.stem(word).into_owned()
    }

    /// Returns true if the stem is a stopword
    pub fn is_stopword(&self, stem: &str) -> bool {
        self.stopwords.contains(stem)
    }

    /// The stemmed stopword set
    pub fn stopwords(&self) -> &HashSet<String> {
        &self.stopwords
    }
}

impl std::fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Normalizer")
            .field("stopwords", &self.stopwords.len())
            .finish()
    }
}
