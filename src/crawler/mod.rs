//! Crawler module for walking a paginated series
//!
//! This module contains the core download logic, including:
//! - HTTP fetching with failure classification
//! - Bounded retries around every fetch
//! - HTML parsing and link extraction
//! - The page-by-page traversal and its termination rules
//! - Running several series as one batch

mod batch;
mod coordinator;
mod fetcher;
mod observer;
mod parser;
mod request;
mod retry;

pub use batch::{download_series, run_batch, BatchSummary, SeriesOutcome};
pub use coordinator::{Termination, TraversalController, TraversalReport, PROGRESS_INTERVAL};
pub use fetcher::{
    build_http_client, http_error_message, ErrorClass, FetchError, FetchOutcome, FetchSettings,
    HttpFetcher, DEFAULT_USER_AGENT, TRANSPORT_FAILURE_MESSAGE,
};
pub use observer::{
    ObservedEvent, RecordingObserver, TracingObserver, TraversalObserver, WarningKind,
};
pub use parser::{extract_page_links, find_link, parse_page, PageLinks, QueryableDocument};
pub use request::{
    parse_selector, PageReference, RequestContext, SeriesRequest, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_PAGES,
};
pub use retry::retry;

use crate::config::Config;
use crate::ComicError;

/// Runs a complete download
///
/// This is the main entry point. It will:
/// 1. Build the HTTP client
/// 2. Start one traversal per configured series
/// 3. Write one PDF per series
/// 4. Report how every series ended
///
/// # Arguments
///
/// * `config` - A validated configuration
///
/// # Returns
///
/// * `Ok(BatchSummary)` - Every series ran; individual failures are inside
/// * `Err(ComicError)` - The batch could not be started
pub async fn download(config: &Config) -> Result<BatchSummary, ComicError> {
    run_batch(config).await
}
