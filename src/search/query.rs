//! Query parsing
//!
//! Double-quoted substrings become phrases; everything else is free text.
//! Both go through the same normalizer as the indexed pages.

use crate::text::{Normalizer, Token};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    static ref PHRASE_RE: Regex = Regex::new(r#""([^"]+)""#).expect("valid regex");
}

/// A query split into free terms and quoted phrases, already normalized
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    /// Stems of the unquoted part, duplicates kept
    pub terms: Vec<String>,
    /// Normalized phrases; positions are relative to the start of the phrase
    pub phrases: Vec<Vec<Token>>,
}

impl ParsedQuery {
    /// Builds a free-term query from stems that are already normalized
    pub fn from_stems<I, S>(stems: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            terms: stems.into_iter().map(Into::into).collect(),
            phrases: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.phrases.is_empty()
    }

    /// First word of each phrase
    pub fn phrase_heads(&self) -> impl Iterator<Item = &str> {
        self.phrases
            .iter()
            .filter_map(|phrase| phrase.first().map(|(stem, _)| stem.as_str()))
    }

    /// Occurrence count of every query word, free terms and phrase words alike
    pub fn term_counts(&self) -> HashMap<&str, u32> {
        let mut counts = HashMap::new();
        let phrase_words = self.phrases.iter().flatten().map(|(stem, _)| stem);
        for stem in self.terms.iter().chain(phrase_words) {
            *counts.entry(stem.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

/// Splits a raw query into phrases and free terms
///
/// Every double-quoted substring is a phrase. Phrases that normalize to
/// nothing (only stopwords) are dropped. An unmatched quote is treated as
/// ordinary text.
pub fn parse_query(query: &str, normalizer: &Normalizer) -> ParsedQuery {
    let phrases = PHRASE_RE
        .captures_iter(query)
        .filter_map(|caps| caps.get(1))
        .map(|m| normalizer.normalize(m.as_str()))
        .filter(|phrase| !phrase.is_empty())
        .collect();

    let remainder = PHRASE_RE.replace_all(query, " ");
    let terms = normalizer
        .normalize(&remainder)
        .into_iter()
        .map(|(stem, _)| stem)
        .collect();

    ParsedQuery { terms, phrases }
}
