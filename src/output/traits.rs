//! Document sink trait and types
//!
//! This module defines the narrow interface the traversal uses to append pages to
//! an output document. The sink is owned by the caller: the traversal only opens
//! pages and places content on them, it never creates or finalizes the document.

use image::ImageFormat;
use thiserror::Error;

/// Errors that can occur while composing an output document
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Cannot place content before a page has been opened")]
    NoPage,

    #[error("Document has already been finalized")]
    Finalized,

    #[error("Failed to embed image: {0}")]
    Image(String),

    #[error("Failed to place text: {0}")]
    Text(String),

    #[error("Failed to write document: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Size of an output page, in document units
///
/// Pages holding an artifact are sized to the artifact's pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSize {
    pub width: u32,
    pub height: u32,
}

impl PageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Layout options for a text label
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextOptions {
    /// Font size in document units
    pub font_size: f32,

    /// Distance of the label from the top-left corner of the page
    pub margin: f32,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            margin: 72.0 / 2.0,
        }
    }
}

/// An output document that pages can be appended to
///
/// Implementations must accept `place_image` and `place_text` only after
/// `new_page`, and everything placed lands on the most recently opened page.
pub trait DocumentSink: Send {
    /// Opens a new page and makes it the current page
    fn new_page(&mut self, size: PageSize) -> SinkResult<()>;

    /// Places encoded image bytes on the current page, with its top-left corner at `(x, y)`
    ///
    /// The bytes must be in one of [`DocumentSink::native_formats`].
    fn place_image(&mut self, bytes: &[u8], x: u32, y: u32) -> SinkResult<()>;

    /// Places a text label on the current page
    fn place_text(&mut self, text: &str, options: &TextOptions) -> SinkResult<()>;

    /// Completes the document. No further pages can be added afterwards.
    fn finalize(&mut self) -> SinkResult<()>;

    /// Image formats this sink can place without re-encoding
    ///
    /// The first entry is the format other images are converted to.
    fn native_formats(&self) -> &[ImageFormat];

    /// Number of pages opened so far
    fn page_count(&self) -> usize;

    /// Returns true if `format` can be placed as-is
    fn supports(&self, format: ImageFormat) -> bool {
        self.native_formats().contains(&format)
    }

    /// The format unsupported images should be re-encoded to
    fn conversion_target(&self) -> ImageFormat {
        self.native_formats()
            .first()
            .copied()
            .unwrap_or(ImageFormat::Png)
    }
}
