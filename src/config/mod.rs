//! Configuration module for sturdywcdl
//!
//! This module handles loading, parsing, and validating TOML batch files, as
//! well as the equivalent single-series configuration built from the command line.
//!
//! # Example
//!
//! ```no_run
//! use sturdywcdl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("batch.toml")).unwrap();
//! println!("Downloading at most {} pages per series", config.download.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, DownloadConfig, SeriesEntry};

// Re-export parser and validation functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
