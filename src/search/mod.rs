//! Query engine
//!
//! - `query`: splits a raw query into normalized free terms and phrases
//! - `engine`: candidate generation, phrase filtering, cosine ranking and
//!   "find similar"

mod engine;
mod query;

pub use engine::{QueryEngine, SearchHit, SearchNotice, SearchResults, TITLE_BOOST};
pub use query::{parse_query, ParsedQuery};
