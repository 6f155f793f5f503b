//! The built-in "image missing" artifact
//!
//! Written to the raw image directory whenever a page could not contribute a
//! real image, so the directory keeps one file per page.

use crate::artifact::inspect::ArtifactDescriptor;
use image::ImageFormat;

/// Encoded placeholder image
pub const MISSING_PNG: &[u8] = include_bytes!("../../assets/missing.png");

/// Pixel dimensions of [`MISSING_PNG`]
pub const MISSING_SIZE: (u32, u32) = (200, 200);

/// Label written on placeholder pages
pub const MISSING_LABEL: &str = "image missing";

/// Returns the pre-decoded placeholder artifact
pub fn placeholder_artifact() -> ArtifactDescriptor {
    ArtifactDescriptor {
        bytes: MISSING_PNG.to_vec(),
        width: MISSING_SIZE.0,
        height: MISSING_SIZE.1,
        format: Some(ImageFormat::Png),
    }
}
