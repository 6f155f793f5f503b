//! Traversal event reporting
//!
//! The traversal reports degraded pages, progress, and fatal stops through a
//! [`TraversalObserver`] instead of logging directly.

use std::sync::Mutex;

/// Kinds of degraded pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningKind {
    /// No image could be obtained for the page (no link, or the download failed)
    CannotGetImage,

    /// Image bytes were downloaded but could not be decoded
    MalformedArtifact,
}

impl WarningKind {
    /// The user-facing message for this kind of warning
    pub fn message(&self) -> &'static str {
        match self {
            Self::CannotGetImage => {
                "WARNING: cannot get the requested image, adding empty page instead"
            }
            Self::MalformedArtifact => {
                "WARNING: image is malformed / corrupt, adding empty page instead"
            }
        }
    }
}

/// Receives traversal events
pub trait TraversalObserver: Send + Sync {
    /// A page was degraded to a placeholder
    fn on_warning(&self, kind: WarningKind, detail: &str);

    /// `pages` pages have been processed so far
    fn on_progress(&self, pages: usize);

    /// The traversal stopped because a page could not be fetched
    fn on_fatal(&self, message: &str);
}

/// Observer that forwards events to `tracing`
#[derive(Debug, Clone, Default)]
pub struct TracingObserver {
    series: String,
}

impl TracingObserver {
    /// Creates an observer tagging every event with `series`
    pub fn new(series: impl Into<String>) -> Self {
        Self {
            series: series.into(),
        }
    }
}

impl TraversalObserver for TracingObserver {
    fn on_warning(&self, kind: WarningKind, detail: &str) {
        tracing::warn!(series = %self.series, "{}", kind.message());
        if !detail.is_empty() {
            tracing::warn!(series = %self.series, "reason: {}", detail);
        }
    }

    fn on_progress(&self, pages: usize) {
        tracing::info!(series = %self.series, "Has downloaded {} pages.", pages);
    }

    fn on_fatal(&self, message: &str) {
        tracing::error!(series = %self.series, "{}", message);
    }
}

/// A recorded traversal event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedEvent {
    Warning { kind: WarningKind, detail: String },
    Progress(usize),
    Fatal(String),
}

/// Observer that keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObservedEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events in the order they were observed
    pub fn events(&self) -> Vec<ObservedEvent> {
        self.lock().clone()
    }

    /// Warning events as `(kind, detail)` pairs
    pub fn warnings(&self) -> Vec<(WarningKind, String)> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                ObservedEvent::Warning { kind, detail } => Some((*kind, detail.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn warning_kinds(&self) -> Vec<WarningKind> {
        self.warnings().into_iter().map(|(kind, _)| kind).collect()
    }

    /// Messages passed to `on_fatal`
    pub fn fatals(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                ObservedEvent::Fatal(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ObservedEvent>> {
        // A poisoned log is still a readable log
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TraversalObserver for RecordingObserver {
    fn on_warning(&self, kind: WarningKind, detail: &str) {
        self.lock().push(ObservedEvent::Warning {
            kind,
            detail: detail.to_string(),
        });
    }

    fn on_progress(&self, pages: usize) {
        self.lock().push(ObservedEvent::Progress(pages));
    }

    fn on_fatal(&self, message: &str) {
        self.lock().push(ObservedEvent::Fatal(message.to_string()));
    }
}
