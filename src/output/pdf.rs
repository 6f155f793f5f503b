//! PDF document sink
//!
//! Builds a PDF with one page per call to `new_page`. Pages are kept in memory
//! and written out in one go by `finalize`.
//!
//! # Image embedding
//!
//! - JPEGs with one or three components are embedded unchanged (`DCTDecode`)
//! - Everything else, CMYK JPEGs included, is decoded to 8-bit RGB with a soft
//!   mask when the image carries an alpha channel. These streams are deflated
//!   as soon as the image is placed, so a long series holds compressed pixels
//!   only.

use crate::output::traits::{DocumentSink, PageSize, SinkError, SinkResult, TextOptions};
use image::{DynamicImage, ImageFormat};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::path::{Path, PathBuf};

const NATIVE_FORMATS: [ImageFormat; 2] = [ImageFormat::Png, ImageFormat::Jpeg];
const FONT_NAME: &str = "F1";

/// A page whose content stream has not been written yet
#[derive(Debug)]
struct PendingPage {
    size: PageSize,
    operations: Vec<Operation>,
    images: Vec<(String, ObjectId)>,
    uses_font: bool,
}

/// Document sink producing a PDF file
pub struct PdfSink {
    path: PathBuf,
    document: Document,
    pages_id: ObjectId,
    font_id: Option<ObjectId>,
    pages: Vec<PendingPage>,
    opened: usize,
    image_count: usize,
    finalized: bool,
}

impl PdfSink {
    /// Creates a sink that will write its document to `path` on finalize
    ///
    /// Missing parent directories are created immediately, so a bad output
    /// location is reported before any downloading starts.
    pub fn create(path: impl AsRef<Path>) -> SinkResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();

        Ok(Self {
            path,
            document,
            pages_id,
            font_id: None,
            pages: Vec::new(),
            opened: 0,
            image_count: 0,
            finalized: false,
        })
    }

    /// Where the document will be written
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn current_page(&mut self) -> SinkResult<&mut PendingPage> {
        if self.finalized {
            return Err(SinkError::Finalized);
        }
        self.pages.last_mut().ok_or(SinkError::NoPage)
    }

    fn font(&mut self) -> ObjectId {
        if let Some(id) = self.font_id {
            return id;
        }
        let id = self.document.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        self.font_id = Some(id);
        id
    }

    fn embed_jpeg(&mut self, bytes: &[u8], width: u32, height: u32, color_space: &str) -> ObjectId {
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        };
        let mut stream = Stream::new(dict, bytes.to_vec());
        stream.allows_compression = false;
        self.document.add_object(stream)
    }

    fn embed_decoded(&mut self, image: &DynamicImage) -> SinkResult<ObjectId> {
        let width = image.width() as i64;
        let height = image.height() as i64;

        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        };

        if image.color().has_alpha() {
            let alpha: Vec<u8> = image.to_rgba8().pixels().map(|p| p[3]).collect();
            let mask = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width,
                    "Height" => height,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                alpha,
            );
            let mask_id = self.document.add_object(deflated(mask)?);
            dict.set("SMask", mask_id);
        }

        let stream = deflated(Stream::new(dict, image.to_rgb8().into_raw()))?;
        Ok(self.document.add_object(stream))
    }
}

/// Deflates an image stream and keeps `Document::compress` from touching it again
fn deflated(mut stream: Stream) -> SinkResult<Stream> {
    stream
        .compress()
        .map_err(|e| SinkError::Image(format!("failed to compress image: {}", e)))?;
    stream.allows_compression = false;
    Ok(stream)
}

/// Number of color components declared by a baseline JPEG's frame header
///
/// Returns `None` when no 8-bit frame header precedes the scan data.
fn jpeg_component_count(bytes: &[u8]) -> Option<u8> {
    if !bytes.starts_with(&[0xFF, 0xD8]) {
        return None;
    }

    let mut pos = 2;
    while pos + 1 < bytes.len() {
        if bytes[pos] != 0xFF {
            return None;
        }
        let marker = bytes[pos + 1];
        pos += 2;

        match marker {
            // Fill bytes
            0xFF => pos -= 1,
            // Markers without a length field
            0x01 | 0xD0..=0xD7 => {}
            // Start of scan or end of image before any frame header
            0xDA | 0xD9 => return None,
            // SOF0..SOF15, except DHT, JPG and DAC
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                let precision = *bytes.get(pos + 2)?;
                let components = *bytes.get(pos + 7)?;
                return (precision == 8).then_some(components);
            }
            _ => {
                let length = u16::from_be_bytes([*bytes.get(pos)?, *bytes.get(pos + 1)?]);
                pos += usize::from(length);
            }
        }
    }

    None
}

impl DocumentSink for PdfSink {
    fn new_page(&mut self, size: PageSize) -> SinkResult<()> {
        if self.finalized {
            return Err(SinkError::Finalized);
        }
        self.pages.push(PendingPage {
            size,
            operations: Vec::new(),
            images: Vec::new(),
            uses_font: false,
        });
        self.opened += 1;
        Ok(())
    }

    fn place_image(&mut self, bytes: &[u8], x: u32, y: u32) -> SinkResult<()> {
        let page_height = self.current_page()?.size.height;

        let format = image::guess_format(bytes).map_err(|e| SinkError::Image(e.to_string()))?;
        if !self.supports(format) {
            return Err(SinkError::Image(format!(
                "{:?} images must be converted before placement",
                format
            )));
        }

        let decoded = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| SinkError::Image(e.to_string()))?;
        let (width, height) = (decoded.width(), decoded.height());

        // The decoder reports CMYK JPEGs as RGB, so trust the frame header instead
        let passthrough = match format {
            ImageFormat::Jpeg => match jpeg_component_count(bytes) {
                Some(1) => Some("DeviceGray"),
                Some(3) => Some("DeviceRGB"),
                _ => None,
            },
            _ => None,
        };

        let image_id = match passthrough {
            Some(color_space) => self.embed_jpeg(bytes, width, height, color_space),
            None => self.embed_decoded(&decoded)?,
        };

        let name = format!("Im{}", self.image_count);
        self.image_count += 1;

        // PDF user space starts at the bottom-left corner
        let bottom = page_height as i64 - y as i64 - height as i64;

        let page = self.current_page()?;
        page.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Integer(width as i64),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(height as i64),
                    Object::Integer(x as i64),
                    Object::Integer(bottom),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.clone().into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
        page.images.push((name, image_id));

        Ok(())
    }

    fn place_text(&mut self, text: &str, options: &TextOptions) -> SinkResult<()> {
        if !text.is_ascii() {
            return Err(SinkError::Text(format!(
                "only ASCII labels are supported, got '{}'",
                text
            )));
        }

        let page_height = self.current_page()?.size.height as f32;
        self.font();

        let baseline = page_height - options.margin - options.font_size;
        let page = self.current_page()?;
        page.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![
                    Object::Name(FONT_NAME.as_bytes().to_vec()),
                    Object::Real(options.font_size.into()),
                ],
            ),
            Operation::new(
                "Td",
                vec![
                    Object::Real(options.margin.into()),
                    Object::Real(baseline.into()),
                ],
            ),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]);
        page.uses_font = true;

        Ok(())
    }

    fn finalize(&mut self) -> SinkResult<()> {
        if self.finalized {
            return Err(SinkError::Finalized);
        }
        self.finalized = true;

        let pending = std::mem::take(&mut self.pages);
        let mut kids: Vec<Object> = Vec::with_capacity(pending.len());

        for page in pending {
            let encoded = Content {
                operations: page.operations,
            }
            .encode()
            .map_err(|e| SinkError::Write(e.to_string()))?;
            let content_id = self.document.add_object(Stream::new(dictionary! {}, encoded));

            let mut xobjects = Dictionary::new();
            for (name, id) in page.images {
                xobjects.set(name, id);
            }

            let mut resources = Dictionary::new();
            resources.set("XObject", xobjects);
            if page.uses_font {
                if let Some(font_id) = self.font_id {
                    resources.set("Font", dictionary! { FONT_NAME => font_id });
                }
            }

            let page_id = self.document.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => self.pages_id,
                "Contents" => content_id,
                "Resources" => resources,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(page.size.width as i64),
                    Object::Integer(page.size.height as i64),
                ],
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        self.document.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = self.document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.document.trailer.set("Root", catalog_id);
        self.document.compress();

        self.document
            .save(&self.path)
            .map_err(|e| SinkError::Write(format!("{}: {}", self.path.display(), e)))?;

        tracing::debug!("Wrote {} pages to {}", count, self.path.display());
        Ok(())
    }

    fn native_formats(&self) -> &[ImageFormat] {
        &NATIVE_FORMATS
    }

    fn page_count(&self) -> usize {
        self.opened
    }
}
