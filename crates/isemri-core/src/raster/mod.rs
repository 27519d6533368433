//! Source document rasterization.
//!
//! Turns raw document bytes into an ordered, capped sequence of page images.
//! Unreadable input degrades to zero pages; the pipeline then carries empty
//! raw text instead of failing.

mod pdf;

use image::DynamicImage;
use tracing::{debug, warn};

use crate::models::RasterConfig;

/// Declared kind of a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A single raster image (photo or scan).
    Image,
    /// A multi-page document (scanned PDF).
    Pdf,
}

impl SourceKind {
    /// Guess the kind from a file extension, defaulting to `Image`.
    pub fn from_extension(ext: &str) -> Self {
        if ext.eq_ignore_ascii_case("pdf") {
            SourceKind::Pdf
        } else {
            SourceKind::Image
        }
    }

    /// Parse an explicitly declared kind.
    pub fn parse(kind: &str) -> Result<Self, crate::error::DecodeError> {
        match kind.trim().to_lowercase().as_str() {
            "pdf" => Ok(SourceKind::Pdf),
            "image" | "jpg" | "jpeg" | "png" => Ok(SourceKind::Image),
            other => Err(crate::error::DecodeError::UnsupportedKind(other.to_string())),
        }
    }
}

/// One rasterized page, owned by a single pipeline invocation.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// Zero-based page order.
    pub index: usize,
    /// Pixel buffer.
    pub image: DynamicImage,
}

/// Converts source bytes into page images.
pub struct Rasterizer {
    config: RasterConfig,
}

impl Rasterizer {
    pub fn new(config: RasterConfig) -> Self {
        Self { config }
    }

    /// Rasterize a source document into at most `max_pages` page images.
    ///
    /// Returns an empty vector for unreadable input; this is the degraded
    /// form of `DecodeFailure` and is never fatal.
    pub fn rasterize(&self, data: &[u8], kind: SourceKind) -> Vec<PageImage> {
        match kind {
            SourceKind::Image => self.rasterize_image(data),
            SourceKind::Pdf => self.rasterize_pdf(data),
        }
    }

    /// Embedded text carried by the document itself, if any.
    ///
    /// Only PDFs can carry native text. Returns `None` when absent or when
    /// the text is too short to be trusted over OCR.
    pub fn embedded_text(&self, data: &[u8], kind: SourceKind) -> Option<String> {
        if kind != SourceKind::Pdf || !self.config.prefer_embedded_text {
            return None;
        }

        let text = pdf::extract_embedded_text(data)?;
        if text.trim().len() < self.config.min_embedded_text_len {
            debug!(
                "embedded PDF text too short ({} chars), falling back to OCR",
                text.trim().len()
            );
            return None;
        }
        Some(text)
    }

    fn rasterize_image(&self, data: &[u8]) -> Vec<PageImage> {
        let image = match image::load_from_memory(data) {
            Ok(img) => img,
            Err(e) => {
                warn!("failed to decode image: {}", e);
                return Vec::new();
            }
        };

        vec![PageImage {
            index: 0,
            image: self.upscale_if_small(image),
        }]
    }

    fn rasterize_pdf(&self, data: &[u8]) -> Vec<PageImage> {
        let images = pdf::extract_page_images(data, self.config.max_pages);
        debug!("rasterized {} PDF pages", images.len());

        images
            .into_iter()
            .enumerate()
            .map(|(index, image)| PageImage { index, image })
            .collect()
    }

    /// Upscale low-DPI captures so small print survives binarization.
    fn upscale_if_small(&self, image: DynamicImage) -> DynamicImage {
        let min_dim = image.width().min(image.height());
        if min_dim >= self.config.min_image_dimension {
            return image;
        }

        let factor = self.config.upscale_factor;
        let new_width = (image.width() as f32 * factor) as u32;
        let new_height = (image.height() as f32 * factor) as u32;
        debug!(
            "upscaling {}x{} capture by {:.1}",
            image.width(),
            image.height(),
            factor
        );
        image.resize_exact(new_width, new_height, image::imageops::FilterType::Lanczos3)
    }
}
