pub mod cli;
pub mod config;
pub mod runtime;

pub use config::{ConfigError, TunesenseConfig};
