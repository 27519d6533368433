//! Tesseract-backed recognition engine (feature `tesseract`).
//!
//! The binding wants a file path, so each pass writes the prepared image to
//! a temporary PNG. A fresh `Tesseract` handle per pass keeps language and
//! segmentation state from leaking between attempts.

use image::GrayImage;
use tesseract::Tesseract;

use super::{LangSet, PageSegMode, RecognitionEngine};
use crate::error::OcrError;

/// Recognition engine backed by an installed tesseract with the `tur` and
/// `eng` language packs.
pub struct TesseractEngine {
    /// Explicit tessdata directory, or `None` for the system default.
    datapath: Option<String>,
}

impl TesseractEngine {
    pub fn new() -> Self {
        Self { datapath: None }
    }

    /// Use an explicit tessdata directory instead of the system default.
    pub fn with_datapath(datapath: impl Into<String>) -> Self {
        Self {
            datapath: Some(datapath.into()),
        }
    }

    fn psm(mode: PageSegMode) -> tesseract::PageSegMode {
        match mode {
            PageSegMode::UniformBlock => tesseract::PageSegMode::PsmSingleBlock,
            PageSegMode::MultiColumn => tesseract::PageSegMode::PsmSingleColumn,
            PageSegMode::SingleLine => tesseract::PageSegMode::PsmSingleLine,
            PageSegMode::Auto => tesseract::PageSegMode::PsmAuto,
        }
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RecognitionEngine for TesseractEngine {
    fn recognize(
        &self,
        image: &GrayImage,
        lang: LangSet,
        mode: PageSegMode,
    ) -> Result<String, OcrError> {
        let file = tempfile::Builder::new()
            .prefix("isemri-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| OcrError::Preprocessing(e.to_string()))?;
        image
            .save(file.path())
            .map_err(|e| OcrError::Preprocessing(e.to_string()))?;

        let mut tess = Tesseract::new(self.datapath.as_deref(), Some(lang.code()))
            .map_err(|e| OcrError::EngineInit(e.to_string()))?
            .set_image(&file.path().to_string_lossy())
            .map_err(|e| OcrError::Recognition(e.to_string()))?;
        tess.set_page_seg_mode(Self::psm(mode));

        tess.get_text()
            .map_err(|e| OcrError::Recognition(e.to_string()))
    }

    // The binding does not expose OSD, so skew stays uncorrected here.
    fn detect_orientation(&self, _image: &GrayImage) -> Option<f32> {
        None
    }
}
