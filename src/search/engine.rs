//! Vector-space ranking over the positional index
//!
//! Query weights are `(count / maxCount) * idf`, document weights are
//! `(bodyFreq * idf + TITLE_BOOST * titleFreq * idf) / pageMaxFreq`, and
//! pages are ranked by the cosine of the two vectors. Quoted phrases act as
//! a hard filter on body positions before scoring.

use crate::config::SearchConfig;
use crate::search::query::{parse_query, ParsedQuery};
use crate::storage::{lock_store, Field, IndexStore, SharedStore, SqliteStorage};
use crate::text::{Normalizer, Token};
use crate::{Result, SpindexError};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Weight multiplier for term occurrences in the title
pub const TITLE_BOOST: f64 = 2.0;

/// Number of keywords used to derive a "find similar" query
const SIMILAR_KEYWORDS: usize = 5;

/// A ranked page
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub page_id: i64,
    pub score: f64,
}

/// Why a result set is empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchNotice {
    /// Nothing has been indexed yet
    EmptyIndex,
    /// The query normalized to nothing (empty, punctuation, all stopwords)
    NoQueryTerms,
    /// The query was understood but no page matched
    NoMatches,
    /// A "find similar" request could not be served
    SimilarUnavailable(String),
}

impl fmt::Display for SearchNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyIndex => write!(f, "The index is empty; run a crawl first"),
            Self::NoQueryTerms => write!(f, "No searchable terms in the query"),
            Self::NoMatches => write!(f, "No pages matched the query"),
            Self::SimilarUnavailable(reason) => {
                write!(f, "Cannot find similar pages: {}", reason)
            }
        }
    }
}

/// Ranked hits, or an informational notice when there are none
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    pub hits: Vec<SearchHit>,
    pub notice: Option<SearchNotice>,
}

impl SearchResults {
    fn notice(notice: SearchNotice) -> Self {
        Self {
            hits: Vec::new(),
            notice: Some(notice),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Answers free-text and phrase queries against a shared index store
pub struct QueryEngine {
    store: SharedStore,
    normalizer: Arc<Normalizer>,
    top_k: usize,
}

impl QueryEngine {
    pub fn new(store: SharedStore, normalizer: Arc<Normalizer>, config: &SearchConfig) -> Self {
        Self {
            store,
            normalizer,
            top_k: config.top_k,
        }
    }

    /// Runs a raw query string
    ///
    /// The store lock is held for the whole search so a concurrent crawl
    /// never exposes a half-indexed page.
    pub fn search(&self, query: &str) -> Result<SearchResults> {
        let parsed = parse_query(query, &self.normalizer);
        tracing::debug!(
            "Query {:?}: {} terms, {} phrases",
            query,
            parsed.terms.len(),
            parsed.phrases.len()
        );
        self.search_parsed(&parsed)
    }

    /// Runs an already-normalized query
    pub fn search_parsed(&self, parsed: &ParsedQuery) -> Result<SearchResults> {
        let store = lock_store(&self.store)?;
        rank(&store, parsed, self.top_k)
    }

    /// Builds the query used by "find similar": the page's top keywords
    pub fn similar_query(&self, url: &str) -> Result<Vec<String>> {
        let store = lock_store(&self.store)?;
        let page = store
            .get_page_by_url(url)?
            .filter(|p| p.is_indexed())
            .ok_or_else(|| SpindexError::PageNotIndexed(url.to_string()))?;

        let keywords = store.top_keywords(page.id, SIMILAR_KEYWORDS, self.normalizer.stopwords())?;
        Ok(keywords.into_iter().map(|k| k.term).collect())
    }

    /// Ranks pages similar to `url` by re-issuing its top keywords as a query
    ///
    /// Failures are logged and reported as a notice, never as an error.
    pub fn find_similar(&self, url: &str) -> SearchResults {
        let outcome = self.similar_query(url).and_then(|keywords| {
            tracing::info!("Similar to {}: {}", url, keywords.join(" "));
            self.search_parsed(&ParsedQuery::from_stems(keywords))
        });

        match outcome {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!("Find similar for {} failed: {}", url, e);
                SearchResults::notice(SearchNotice::SimilarUnavailable(e.to_string()))
            }
        }
    }
}

/// Scores and orders candidates for a parsed query
fn rank(store: &SqliteStorage, parsed: &ParsedQuery, top_k: usize) -> Result<SearchResults> {
    let total_pages = store.count_indexed_pages()?;
    if total_pages == 0 {
        return Ok(SearchResults::notice(SearchNotice::EmptyIndex));
    }
    if parsed.is_empty() {
        return Ok(SearchResults::notice(SearchNotice::NoQueryTerms));
    }

    let mut candidates = BTreeSet::new();
    let lookup_terms = parsed.terms.iter().map(String::as_str).chain(parsed.phrase_heads());
    for term in lookup_terms {
        for field in Field::ALL {
            candidates.extend(store.pages_with_term(term, field)?);
        }
    }

    let mut matched = Vec::with_capacity(candidates.len());
    for page_id in candidates {
        if matches_all_phrases(store, page_id, &parsed.phrases)? {
            matched.push(page_id);
        }
    }

    if matched.is_empty() {
        return Ok(SearchResults::notice(SearchNotice::NoMatches));
    }

    let mut idf = IdfCache::new(total_pages);

    let counts = parsed.term_counts();
    let max_count = counts.values().copied().max().unwrap_or(1) as f64;
    let mut query_vector = BTreeMap::new();
    for (term, count) in counts {
        let weight = (count as f64 / max_count) * idf.get(store, term)?;
        query_vector.insert(term.to_string(), weight);
    }
    let query_norm = norm(query_vector.values());

    let mut hits = Vec::with_capacity(matched.len());
    for page_id in matched {
        let doc_vector = document_vector(store, page_id, &mut idf)?;
        let score = cosine(&query_vector, query_norm, &doc_vector);
        hits.push(SearchHit { page_id, score });
    }

    hits.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.page_id.cmp(&b.page_id))
    });
    hits.truncate(top_k);

    Ok(SearchResults { hits, notice: None })
}

/// True if every phrase occurs consecutively (modulo stopword gaps) in the body
fn matches_all_phrases(store: &SqliteStorage, page_id: i64, phrases: &[Vec<Token>]) -> Result<bool> {
    for phrase in phrases {
        if !phrase_in_body(store, page_id, phrase)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn phrase_in_body(store: &SqliteStorage, page_id: i64, phrase: &[Token]) -> Result<bool> {
    let Some(((head, head_pos), rest)) = phrase.split_first() else {
        return Ok(true);
    };

    let head_positions = store.posting(head, page_id, Field::Body)?.positions;
    if head_positions.is_empty() {
        return Ok(false);
    }

    let mut followers = Vec::with_capacity(rest.len());
    for (stem, pos) in rest {
        let positions: HashSet<u32> = store
            .posting(stem, page_id, Field::Body)?
            .positions
            .into_iter()
            .collect();
        if positions.is_empty() {
            return Ok(false);
        }
        followers.push((pos - head_pos, positions));
    }

    Ok(head_positions.iter().any(|&p| {
        followers
            .iter()
            .all(|(offset, positions)| positions.contains(&(p + offset)))
    }))
}

/// Memoized `ln(N / max(df_body, df_title, 1))`
struct IdfCache {
    total_pages: f64,
    cache: HashMap<String, f64>,
}

impl IdfCache {
    fn new(total_pages: u64) -> Self {
        Self {
            total_pages: total_pages as f64,
            cache: HashMap::new(),
        }
    }

    fn get(&mut self, store: &SqliteStorage, term: &str) -> Result<f64> {
        if let Some(&idf) = self.cache.get(term) {
            return Ok(idf);
        }
        let df = store
            .document_frequency(term, Field::Body)?
            .max(store.document_frequency(term, Field::Title)?)
            .max(1);
        let idf = (self.total_pages / df as f64).ln();
        self.cache.insert(term.to_string(), idf);
        Ok(idf)
    }
}

fn document_vector(
    store: &SqliteStorage,
    page_id: i64,
    idf: &mut IdfCache,
) -> Result<BTreeMap<String, f64>> {
    let max_tf = store
        .max_term_frequency(page_id, Field::Body)?
        .max(store.max_term_frequency(page_id, Field::Title)?);

    let terms = store.page_terms(page_id)?;
    let mut vector = BTreeMap::new();
    for tf in terms {
        let weight = if max_tf == 0 {
            0.0
        } else {
            let term_idf = idf.get(store, &tf.term)?;
            (tf.body as f64 * term_idf + TITLE_BOOST * tf.title as f64 * term_idf) / max_tf as f64
        };
        vector.insert(tf.term, weight);
    }
    Ok(vector)
}

fn norm<'a>(weights: impl Iterator<Item = &'a f64>) -> f64 {
    weights.map(|w| w * w).sum::<f64>().sqrt()
}

fn cosine(query: &BTreeMap<String, f64>, query_norm: f64, doc: &BTreeMap<String, f64>) -> f64 {
    let doc_norm = norm(doc.values());
    if query_norm == 0.0 || doc_norm == 0.0 {
        return 0.0;
    }
    let dot: f64 = query
        .iter()
        .filter_map(|(term, qw)| doc.get(term).map(|dw| qw * dw))
        .sum();
    dot / (query_norm * doc_norm)
}
