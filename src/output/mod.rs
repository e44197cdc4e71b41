//! Output module for reports and search presentation
//!
//! This module handles:
//! - Generating the plain-text spider report
//! - Enriching ranked hits for display and paginating them
//! - Displaying index statistics

mod report;
mod results;
pub mod stats;

pub use report::{format_report, generate_report, REPORT_KEYWORDS};
pub use results::{enrich_hits, paginate, print_results, Paginated, ResultEntry};
pub use stats::{load_statistics, print_statistics, IndexStatistics};
