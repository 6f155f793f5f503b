//! Output module for assembling downloaded pages into a document
//!
//! This module handles:
//! - The document sink interface the traversal appends pages to
//! - A PDF implementation of that interface
//! - An in-memory implementation for inspection and testing

mod memory;
mod pdf;
mod traits;

pub use memory::{MemorySink, RecordedPage};
pub use pdf::PdfSink;
pub use traits::{DocumentSink, PageSize, SinkError, SinkResult, TextOptions};
