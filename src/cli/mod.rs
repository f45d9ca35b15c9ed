pub mod args;
pub mod commands;
pub mod root;

pub use args::{AnalyzeArgs, Args, CacheAction, Commands, validate_analyze_args};
pub use root::RootCommand;
