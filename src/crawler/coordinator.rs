//! Traversal controller - the page-by-page download loop
//!
//! For each page of a series the controller:
//! - Fetches and parses the page (with retry)
//! - Extracts the image link and downloads the image (with retry)
//! - Appends the image, or a placeholder, to the output document
//! - Follows the next-page link, or stops
//!
//! A run ends in one of three ways:
//!
//! | Condition | Result |
//! |-----------|--------|
//! | `max_pages` pages produced | `MaxPagesReached` |
//! | Page has no next-page link | `EndOfSeries` |
//! | Page fetch fails on every attempt | `PageFetchExhausted`, reported as fatal |
//!
//! None of these is an error: the document holds one page per completed
//! iteration and can be finalized by the caller in every case.

use crate::artifact::{ArtifactAssembler, ArtifactInspector, AssembledPage};
use crate::crawler::fetcher::HttpFetcher;
use crate::crawler::observer::{TraversalObserver, WarningKind};
use crate::crawler::parser::extract_page_links;
use crate::crawler::request::SeriesRequest;
use crate::crawler::retry::retry;
use crate::output::DocumentSink;
use crate::ComicError;
use std::fmt;

/// Progress is reported every this many pages
pub const PROGRESS_INTERVAL: usize = 15;

/// Why a traversal stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The page limit was reached
    MaxPagesReached,

    /// The last page had no next-page link
    EndOfSeries,

    /// A page could not be fetched; `message` is the last attempt's error
    PageFetchExhausted { message: String },
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxPagesReached => write!(f, "page limit reached"),
            Self::EndOfSeries => write!(f, "end of series"),
            Self::PageFetchExhausted { message } => write!(f, "page fetch failed: {}", message),
        }
    }
}

/// Outcome of one traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalReport {
    /// Output pages produced
    pub pages: usize,

    /// Pages holding a downloaded image
    pub artifacts: usize,

    /// Pages holding the "image missing" placeholder
    pub placeholders: usize,

    pub termination: Termination,
}

impl TraversalReport {
    fn new() -> Self {
        Self {
            pages: 0,
            artifacts: 0,
            placeholders: 0,
            termination: Termination::MaxPagesReached,
        }
    }

    fn record(&mut self, page: AssembledPage) {
        self.pages += 1;
        match page {
            AssembledPage::Artifact => self.artifacts += 1,
            AssembledPage::Placeholder => self.placeholders += 1,
        }
    }

    /// Returns true if the traversal stopped on a fetch failure
    pub fn is_aborted(&self) -> bool {
        matches!(self.termination, Termination::PageFetchExhausted { .. })
    }
}

/// Runs traversals with a fixed set of collaborators
///
/// The controller holds no per-traversal state; one controller can run any
/// number of traversals one after another.
pub struct TraversalController<'a> {
    fetcher: &'a HttpFetcher,
    inspector: &'a dyn ArtifactInspector,
    observer: &'a dyn TraversalObserver,
}

impl<'a> TraversalController<'a> {
    pub fn new(
        fetcher: &'a HttpFetcher,
        inspector: &'a dyn ArtifactInspector,
        observer: &'a dyn TraversalObserver,
    ) -> Self {
        Self {
            fetcher,
            inspector,
            observer,
        }
    }

    /// Downloads a series into `sink`
    ///
    /// The sink must already be open and is left open: the caller finalizes it
    /// once this returns, whatever the termination reason.
    ///
    /// # Returns
    ///
    /// * `Ok(TraversalReport)` - the traversal ended normally or early
    /// * `Err(ComicError)` - the sink or the raw image directory failed
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sturdywcdl::crawler::{FetchSettings, TracingObserver};
    /// use sturdywcdl::{DocumentSink, HttpFetcher, ImageInspector, PdfSink, SeriesRequest, TraversalController};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let fetcher = HttpFetcher::new(&FetchSettings::default())?;
    /// let observer = TracingObserver::new("comic");
    /// let controller = TraversalController::new(&fetcher, &ImageInspector, &observer);
    ///
    /// let request = SeriesRequest::new("https://comics.com/1", "#comic img", "a.next")?;
    /// let mut sink = PdfSink::create("comic.pdf")?;
    /// controller.run(&mut sink, &request).await?;
    /// sink.finalize()?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run(
        &self,
        sink: &mut dyn DocumentSink,
        request: &SeriesRequest,
    ) -> Result<TraversalReport, ComicError> {
        tracing::info!("Starting download of: {}", request.first_page.url());

        if let Some(dir) = &request.image_output_dir {
            tokio::fs::create_dir_all(dir).await?;
        }

        let assembler = ArtifactAssembler::new(self.inspector, self.observer)
            .with_output_dir(request.image_output_dir.as_deref());
        let mut report = TraversalReport::new();
        let mut queued = request.first_page.clone();

        for index in 0..request.max_pages {
            if index % PROGRESS_INTERVAL == 0 && index != 0 {
                self.observer.on_progress(index);
            }

            tracing::debug!("Fetching page {}: {}", index, queued.url());
            let page = retry(
                |_| self.fetcher.fetch(queued.url(), &request.context),
                request.max_attempts,
            )
            .await;

            let body = match page {
                Ok(body) => body,
                Err(e) => {
                    // Without the page there is no next link to follow
                    self.observer.on_fatal(&e.message);
                    report.termination = Termination::PageFetchExhausted { message: e.message };
                    return Ok(report);
                }
            };

            let links = extract_page_links(
                &String::from_utf8_lossy(&body),
                &request.image_selector,
                &request.next_selector,
                queued.origin(),
            );

            let assembled = match links.image {
                Some(image_url) => {
                    tracing::debug!("Fetching image {}: {}", index, image_url);
                    let image = retry(
                        |_| self.fetcher.fetch(&image_url, &request.context),
                        request.max_attempts,
                    )
                    .await;

                    match image {
                        Ok(bytes) => assembler.insert_artifact(sink, index, bytes).await?,
                        Err(e) => {
                            self.observer
                                .on_warning(WarningKind::CannotGetImage, &e.message);
                            assembler.insert_placeholder(sink, index).await?
                        }
                    }
                }
                None => {
                    self.observer.on_warning(
                        WarningKind::CannotGetImage,
                        "no element with a src attribute matched the image selector",
                    );
                    assembler.insert_placeholder(sink, index).await?
                }
            };
            report.record(assembled);

            match links.next {
                Some(next) => queued = queued.follow(next),
                None => {
                    report.termination = Termination::EndOfSeries;
                    return Ok(report);
                }
            }
        }

        report.termination = Termination::MaxPagesReached;
        Ok(report)
    }
}
