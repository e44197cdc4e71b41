//! Text normalization shared by the crawler and the query engine
//!
//! - `Normalizer`: tokenizes, stems, and drops stopwords while keeping the
//!   true position of every retained token
//! - `load_stopwords`: reads a stopword list, tolerating a missing file

mod normalizer;
mod stopwords;

pub use normalizer::{Normalizer, Token};
pub use stopwords::load_stopwords;

use crate::config::IndexConfig;
use std::path::Path;

/// Builds the normalizer described by the index configuration
///
/// The crawler and the query engine must share one stopword set, otherwise
/// query stems and indexed stems drift apart.
pub fn normalizer_for(config: &IndexConfig) -> std::io::Result<Normalizer> {
    match &config.stopwords_path {
        Some(path) => {
            let words = load_stopwords(Path::new(path))?;
            tracing::debug!("Loaded {} stopwords from {}", words.len(), path);
            Ok(Normalizer::new(words))
        }
        None => Ok(Normalizer::without_stopwords()),
    }
}
