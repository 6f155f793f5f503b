//! Turning downloaded artifacts into output pages
//!
//! Every call produces exactly one new page in the sink: the artifact itself
//! when it can be decoded, the "image missing" page otherwise.

use crate::artifact::inspect::{ArtifactDescriptor, ArtifactInspector};
use crate::artifact::placeholder::{placeholder_artifact, MISSING_LABEL, MISSING_SIZE};
use crate::crawler::{TraversalObserver, WarningKind};
use crate::output::{DocumentSink, PageSize, TextOptions};
use crate::ComicError;
use std::path::Path;

/// What ended up on the page an assembler call produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssembledPage {
    /// The downloaded image
    Artifact,
    /// The "image missing" page
    Placeholder,
}

/// Places artifacts into a document sink
pub struct ArtifactAssembler<'a> {
    inspector: &'a dyn ArtifactInspector,
    observer: &'a dyn TraversalObserver,
    output_dir: Option<&'a Path>,
    placeholder: ArtifactDescriptor,
}

impl<'a> ArtifactAssembler<'a> {
    pub fn new(inspector: &'a dyn ArtifactInspector, observer: &'a dyn TraversalObserver) -> Self {
        Self {
            inspector,
            observer,
            output_dir: None,
            placeholder: placeholder_artifact(),
        }
    }

    /// Additionally writes every inserted artifact to `dir` as `<page index>.<ext>`
    pub fn with_output_dir(mut self, dir: Option<&'a Path>) -> Self {
        self.output_dir = dir;
        self
    }

    /// Inserts a downloaded artifact as a page sized to the image
    ///
    /// Bytes that cannot be decoded are reported as
    /// [`WarningKind::MalformedArtifact`] and replaced by a placeholder page.
    /// Images in a format the sink cannot place directly are re-encoded first;
    /// the raw file written to the output directory is always the original.
    pub async fn insert_artifact(
        &self,
        sink: &mut dyn DocumentSink,
        index: usize,
        bytes: Vec<u8>,
    ) -> Result<AssembledPage, ComicError> {
        let descriptor = match self.inspector.inspect(bytes) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                self.observer
                    .on_warning(WarningKind::MalformedArtifact, &e.to_string());
                return self.insert_placeholder(sink, index).await;
            }
        };

        let converted = match descriptor.format {
            Some(format) if sink.supports(format) => None,
            _ => {
                let target = sink.conversion_target();
                match self.inspector.reencode(&descriptor.bytes, target) {
                    Ok(bytes) => Some(bytes),
                    Err(e) => {
                        self.observer
                            .on_warning(WarningKind::MalformedArtifact, &e.to_string());
                        return self.insert_placeholder(sink, index).await;
                    }
                }
            }
        };

        sink.new_page(PageSize::new(descriptor.width, descriptor.height))?;
        let placed = converted.as_deref().unwrap_or(&descriptor.bytes);
        sink.place_image(placed, 0, 0)?;

        self.persist(index, &descriptor).await?;
        Ok(AssembledPage::Artifact)
    }

    /// Inserts the fixed-size "image missing" page
    pub async fn insert_placeholder(
        &self,
        sink: &mut dyn DocumentSink,
        index: usize,
    ) -> Result<AssembledPage, ComicError> {
        sink.new_page(PageSize::new(MISSING_SIZE.0, MISSING_SIZE.1))?;
        sink.place_text(MISSING_LABEL, &TextOptions::default())?;

        self.persist(index, &self.placeholder).await?;
        Ok(AssembledPage::Placeholder)
    }

    async fn persist(&self, index: usize, artifact: &ArtifactDescriptor) -> Result<(), ComicError> {
        let Some(dir) = self.output_dir else {
            return Ok(());
        };

        let path = dir.join(format!("{}.{}", index, artifact.extension()));
        tokio::fs::write(&path, &artifact.bytes).await?;
        tracing::trace!("Saved raw image to {}", path.display());
        Ok(())
    }
}
