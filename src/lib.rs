//! sturdywcdl: a sturdy webcomic downloader
//!
//! This crate walks a paginated web series one page at a time, pulls the image
//! off every page, and assembles the images into a single output document. Network
//! failures are retried, missing or broken images become placeholder pages, and a
//! run that stops early still leaves a valid document behind.

pub mod artifact;
pub mod config;
pub mod crawler;
pub mod output;

use thiserror::Error;

/// Main error type for sturdywcdl operations
///
/// Fetch failures and missing links are not represented here: the traversal
/// degrades those to placeholder pages. What remains are the failures that make
/// the output itself unusable.
#[derive(Debug, Error)]
pub enum ComicError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Output document error: {0}")]
    Sink(#[from] output::SinkError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Download task for '{series}' did not complete: {message}")]
    Task { series: String, message: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

/// Result type alias for sturdywcdl operations
pub type Result<T> = std::result::Result<T, ComicError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use artifact::{ArtifactAssembler, ArtifactDescriptor, ArtifactInspector, ImageInspector};
pub use config::Config;
pub use crawler::{
    ErrorClass, FetchError, HttpFetcher, PageReference, RequestContext, SeriesRequest,
    Termination, TraversalController, TraversalObserver, TraversalReport,
};
pub use output::{DocumentSink, MemorySink, PdfSink};
