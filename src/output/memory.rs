//! In-memory document sink
//!
//! Records every page and everything placed on it. Useful for inspecting what a
//! traversal produced without writing a real document.

use crate::output::traits::{DocumentSink, PageSize, SinkError, SinkResult, TextOptions};
use image::ImageFormat;

const NATIVE_FORMATS: [ImageFormat; 2] = [ImageFormat::Png, ImageFormat::Jpeg];

/// A page recorded by [`MemorySink`]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordedPage {
    /// Page dimensions as opened
    pub width: u32,
    pub height: u32,

    /// Image payloads in placement order
    pub images: Vec<Vec<u8>>,

    /// Text labels in placement order
    pub texts: Vec<String>,
}

/// Document sink that keeps all pages in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pages: Vec<RecordedPage>,
    finalized: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All pages recorded so far
    pub fn pages(&self) -> &[RecordedPage] {
        &self.pages
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    fn current_page(&mut self) -> SinkResult<&mut RecordedPage> {
        if self.finalized {
            return Err(SinkError::Finalized);
        }
        self.pages.last_mut().ok_or(SinkError::NoPage)
    }
}

impl DocumentSink for MemorySink {
    fn new_page(&mut self, size: PageSize) -> SinkResult<()> {
        if self.finalized {
            return Err(SinkError::Finalized);
        }
        self.pages.push(RecordedPage {
            width: size.width,
            height: size.height,
            ..RecordedPage::default()
        });
        Ok(())
    }

    fn place_image(&mut self, bytes: &[u8], _x: u32, _y: u32) -> SinkResult<()> {
        self.current_page()?.images.push(bytes.to_vec());
        Ok(())
    }

    fn place_text(&mut self, text: &str, _options: &TextOptions) -> SinkResult<()> {
        self.current_page()?.texts.push(text.to_string());
        Ok(())
    }

    fn finalize(&mut self) -> SinkResult<()> {
        if self.finalized {
            return Err(SinkError::Finalized);
        }
        self.finalized = true;
        Ok(())
    }

    fn native_formats(&self) -> &[ImageFormat] {
        &NATIVE_FORMATS
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }
}
