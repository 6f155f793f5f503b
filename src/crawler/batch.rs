//! Downloading several series side by side
//!
//! Each series gets its own traversal, PDF sink, request headers, and observer.
//! The only thing shared is the HTTP connection pool. At most
//! `download.concurrency` traversals run at once.

use crate::artifact::ImageInspector;
use crate::config::{Config, SeriesEntry};
use crate::crawler::coordinator::{TraversalController, TraversalReport};
use crate::crawler::fetcher::HttpFetcher;
use crate::crawler::observer::TracingObserver;
use crate::crawler::request::SeriesRequest;
use crate::output::{DocumentSink, PdfSink};
use crate::ComicError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Result of downloading one series
#[derive(Debug)]
pub struct SeriesOutcome {
    pub name: String,
    pub output_file: PathBuf,
    pub result: Result<TraversalReport, ComicError>,
}

/// Results of a whole batch, in configuration order
#[derive(Debug)]
pub struct BatchSummary {
    pub outcomes: Vec<SeriesOutcome>,
    pub elapsed: Duration,
}

impl BatchSummary {
    /// Total pages written across all series
    pub fn total_pages(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().ok())
            .map(|report| report.pages)
            .sum()
    }

    /// Series whose document could not be produced
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.result.is_err())
            .count()
    }

    /// Series that stopped early because a page could not be fetched
    pub fn aborted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(&outcome.result, Ok(report) if report.is_aborted()))
            .count()
    }
}

/// Downloads one series into a PDF at `output_file`
///
/// The PDF is finalized whatever happens during the traversal, so an early
/// stop still leaves a readable document with the pages obtained so far.
pub async fn download_series(
    fetcher: &HttpFetcher,
    request: &SeriesRequest,
    output_file: &Path,
) -> Result<TraversalReport, ComicError> {
    let mut sink = PdfSink::create(output_file)?;
    let observer = TracingObserver::new(request.name.as_str());
    let controller = TraversalController::new(fetcher, &ImageInspector, &observer);

    let traversal = controller.run(&mut sink, request).await;
    let finalized = sink.finalize();

    let report = traversal?;
    finalized?;

    tracing::info!(
        series = %request.name,
        "Wrote {} pages ({} placeholders) to {}: {}",
        report.pages,
        report.placeholders,
        output_file.display(),
        report.termination
    );
    Ok(report)
}

/// Downloads every series in `config`
///
/// A series that fails does not stop the others; its error is recorded in its
/// [`SeriesOutcome`].
pub async fn run_batch(config: &Config) -> Result<BatchSummary, ComicError> {
    let start_time = Instant::now();
    let fetcher = HttpFetcher::new(&config.download.fetch_settings())?;
    let semaphore = Arc::new(Semaphore::new(config.download.concurrency));

    let mut tasks = JoinSet::new();
    for (position, entry) in config.series.iter().enumerate() {
        let request = entry.to_request(&config.download)?;
        let output_file = entry.output_file.clone();
        let fetcher = fetcher.clone();
        let semaphore = Arc::clone(&semaphore);

        tasks.spawn(async move {
            // The semaphore is never closed
            let _permit = semaphore.acquire_owned().await.ok();
            let result = download_series(&fetcher, &request, &output_file).await;
            if let Err(e) = &result {
                tracing::error!(series = %request.name, "Download failed: {}", e);
            }
            (position, result)
        });
    }

    let mut results: Vec<Option<Result<TraversalReport, ComicError>>> =
        config.series.iter().map(|_| None).collect();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((position, result)) => results[position] = Some(result),
            Err(e) => tracing::error!("Download task did not complete: {}", e),
        }
    }

    let outcomes = config
        .series
        .iter()
        .zip(results)
        .map(|(entry, result)| outcome_for(entry, result))
        .collect();

    Ok(BatchSummary {
        outcomes,
        elapsed: start_time.elapsed(),
    })
}

fn outcome_for(
    entry: &SeriesEntry,
    result: Option<Result<TraversalReport, ComicError>>,
) -> SeriesOutcome {
    let result = result.unwrap_or_else(|| {
        Err(ComicError::Task {
            series: entry.name.clone(),
            message: "task panicked or was cancelled".to_string(),
        })
    });

    SeriesOutcome {
        name: entry.name.clone(),
        output_file: entry.output_file.clone(),
        result,
    }
}
