//! Artifact inspection and re-encoding
//!
//! Inspection decides whether downloaded bytes are a usable image at all. A
//! successful inspection produces an [`ArtifactDescriptor`]; a failed one means
//! the caller has to fall back to a placeholder.

use image::ImageFormat;
use std::io::Cursor;
use thiserror::Error;

/// Errors raised while inspecting or converting artifact bytes
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("Unrecognized image format")]
    UnknownFormat,

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image as {format:?}: {message}")]
    Encode {
        format: ImageFormat,
        message: String,
    },
}

/// Downloaded bytes together with what inspection found out about them
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactDescriptor {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: Option<ImageFormat>,
}

impl ArtifactDescriptor {
    /// File extension used when persisting this artifact
    ///
    /// Falls back to `bin` when the format is unknown.
    pub fn extension(&self) -> &'static str {
        self.format
            .and_then(|format| format.extensions_str().first().copied())
            .unwrap_or("bin")
    }
}

/// Turns raw bytes into descriptors and converts between formats
pub trait ArtifactInspector: Send + Sync {
    /// Inspects `bytes`, failing if they are not a decodable image
    fn inspect(&self, bytes: Vec<u8>) -> Result<ArtifactDescriptor, InspectError>;

    /// Re-encodes `bytes` to `target`
    fn reencode(&self, bytes: &[u8], target: ImageFormat) -> Result<Vec<u8>, InspectError>;
}

/// Inspector backed by the `image` crate
///
/// Inspection performs a full decode, so truncated files are caught here and
/// never reach the document sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageInspector;

impl ImageInspector {
    pub fn new() -> Self {
        Self
    }
}

impl ArtifactInspector for ImageInspector {
    fn inspect(&self, bytes: Vec<u8>) -> Result<ArtifactDescriptor, InspectError> {
        let format = image::guess_format(&bytes).map_err(|_| InspectError::UnknownFormat)?;
        let decoded = image::load_from_memory_with_format(&bytes, format)
            .map_err(|e| InspectError::Decode(e.to_string()))?;

        Ok(ArtifactDescriptor {
            width: decoded.width(),
            height: decoded.height(),
            format: Some(format),
            bytes,
        })
    }

    fn reencode(&self, bytes: &[u8], target: ImageFormat) -> Result<Vec<u8>, InspectError> {
        let decoded =
            image::load_from_memory(bytes).map_err(|e| InspectError::Decode(e.to_string()))?;

        let mut encoded = Vec::new();
        decoded
            .write_to(&mut Cursor::new(&mut encoded), target)
            .map_err(|e| InspectError::Encode {
                format: target,
                message: e.to_string(),
            })?;

        Ok(encoded)
    }
}
