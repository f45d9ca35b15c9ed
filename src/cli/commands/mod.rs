pub mod analyze;
pub mod cache;

pub use analyze::{QueryReport, analyze_queries, run_analyze_command};
pub use cache::handle_cache_command;
