//! Artifact handling: inspection, placeholders, and page assembly

mod assembler;
mod inspect;
pub mod placeholder;

pub use assembler::{ArtifactAssembler, AssembledPage};
pub use inspect::{ArtifactDescriptor, ArtifactInspector, ImageInspector, InspectError};
