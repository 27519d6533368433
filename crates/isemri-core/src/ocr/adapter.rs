//! Recognition-engine abstraction and the page/line fallback ladders.
//!
//! Different layouts (one dense block vs. columnar forms) need different
//! segmentation assumptions, and language-pack choice trades recall against
//! precision on mixed Latin/Turkish diacritics. Trying cheap configurations
//! in priority order is more robust than any single fixed one.

use image::GrayImage;
use tracing::debug;

use crate::error::OcrError;
use crate::models::OcrConfig;

/// Language set for a recognition pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LangSet {
    /// Turkish plus English (the wide default for mixed documents).
    TurkishEnglish,
    /// English only, the narrower fallback.
    English,
}

impl LangSet {
    /// Engine language code in tesseract convention.
    pub fn code(&self) -> &'static str {
        match self {
            LangSet::TurkishEnglish => "tur+eng",
            LangSet::English => "eng",
        }
    }
}

/// Page segmentation strategy for a recognition pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSegMode {
    /// One uniform block of text.
    UniformBlock,
    /// A single column of variably-sized text.
    MultiColumn,
    /// Exactly one line of text (ROI crops).
    SingleLine,
    /// Fully automatic segmentation (the last-resort pass).
    Auto,
}

/// An external text-recognition engine.
///
/// The pipeline owns the fallback policy; implementations only run one
/// configured pass and answer the orientation query.
pub trait RecognitionEngine {
    /// Run one recognition pass over a prepared image.
    fn recognize(
        &self,
        image: &GrayImage,
        lang: LangSet,
        mode: PageSegMode,
    ) -> Result<String, OcrError>;

    /// Detected page rotation in degrees, if the engine can tell.
    ///
    /// `None` means unknown or upright; the caller must treat both the same
    /// way (no rotation applied).
    fn detect_orientation(&self, image: &GrayImage) -> Option<f32>;
}

/// Ordered (language-set, segmentation) pairs for full-page recognition.
const PAGE_LADDER: [(LangSet, PageSegMode); 4] = [
    (LangSet::TurkishEnglish, PageSegMode::UniformBlock),
    (LangSet::TurkishEnglish, PageSegMode::MultiColumn),
    (LangSet::English, PageSegMode::UniformBlock),
    (LangSet::English, PageSegMode::MultiColumn),
];

/// Runs recognition passes with ordered fallback strategies.
pub struct OcrAdapter<'e> {
    engine: &'e dyn RecognitionEngine,
    config: OcrConfig,
}

impl<'e> OcrAdapter<'e> {
    pub fn new(engine: &'e dyn RecognitionEngine, config: OcrConfig) -> Self {
        Self { engine, config }
    }

    /// The engine behind this adapter.
    pub fn engine(&self) -> &dyn RecognitionEngine {
        self.engine
    }

    /// Full-page recognition through the fallback ladder.
    ///
    /// The first attempt whose stripped output exceeds the usable-text
    /// threshold wins. When the whole ladder degrades, one last unconfigured
    /// pass runs and its output is terminal for the page, short or not.
    pub fn recognize_page(&self, image: &GrayImage) -> String {
        for (lang, mode) in PAGE_LADDER {
            match self.engine.recognize(image, lang, mode) {
                Ok(text) if text.trim().chars().count() > self.config.min_page_text_len => {
                    return text;
                }
                Ok(_) => {
                    debug!("attempt ({:?}, {:?}) found no usable text", lang, mode);
                }
                Err(e) => {
                    debug!("attempt ({:?}, {:?}) failed: {}", lang, mode, e);
                }
            }
        }

        self.engine
            .recognize(image, LangSet::English, PageSegMode::Auto)
            .unwrap_or_default()
    }

    /// Single-line recognition for ROI crops. Never fails; an engine error
    /// degrades to an empty string.
    pub fn recognize_line(&self, image: &GrayImage) -> String {
        self.engine
            .recognize(image, LangSet::TurkishEnglish, PageSegMode::SingleLine)
            .map(|text| text.trim().to_string())
            .unwrap_or_default()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedEngine;
    use super::*;
    use image::GrayImage;

    fn blank() -> GrayImage {
        GrayImage::new(10, 10)
    }

    #[test]
    fn test_first_usable_attempt_wins() {
        let engine = ScriptedEngine::new(vec![(
            (LangSet::TurkishEnglish, PageSegMode::UniformBlock),
            Ok("İş emri no: 1234 - Yağ değişimi".to_string()),
        )]);
        let adapter = OcrAdapter::new(&engine, OcrConfig::default());

        let text = adapter.recognize_page(&blank());
        assert!(text.contains("Yağ değişimi"));
        assert_eq!(engine.calls.borrow().len(), 1);
    }

    #[test]
    fn test_short_output_advances_ladder() {
        let engine = ScriptedEngine::new(vec![
            (
                (LangSet::TurkishEnglish, PageSegMode::UniformBlock),
                Ok("x".to_string()),
            ),
            (
                (LangSet::TurkishEnglish, PageSegMode::MultiColumn),
                Ok("this text is long enough to accept".to_string()),
            ),
        ]);
        let adapter = OcrAdapter::new(&engine, OcrConfig::default());

        let text = adapter.recognize_page(&blank());
        assert_eq!(text, "this text is long enough to accept");
        assert_eq!(
            engine.calls.borrow().as_slice(),
            &[
                (LangSet::TurkishEnglish, PageSegMode::UniformBlock),
                (LangSet::TurkishEnglish, PageSegMode::MultiColumn),
            ]
        );
    }

    #[test]
    fn test_exhausted_ladder_runs_last_resort() {
        let engine = ScriptedEngine::new(vec![
            (
                (LangSet::English, PageSegMode::Auto),
                Ok("short".to_string()),
            ),
            // Every configured attempt errors.
            (
                (LangSet::TurkishEnglish, PageSegMode::UniformBlock),
                Err(OcrError::Recognition(String::new())),
            ),
            (
                (LangSet::TurkishEnglish, PageSegMode::MultiColumn),
                Err(OcrError::Recognition(String::new())),
            ),
            (
                (LangSet::English, PageSegMode::UniformBlock),
                Err(OcrError::Recognition(String::new())),
            ),
            (
                (LangSet::English, PageSegMode::MultiColumn),
                Err(OcrError::Recognition(String::new())),
            ),
        ]);
        let adapter = OcrAdapter::new(&engine, OcrConfig::default());

        // The last-resort output is terminal even though it is short.
        assert_eq!(adapter.recognize_page(&blank()), "short");
        assert_eq!(engine.calls.borrow().len(), 5);
    }

    #[test]
    fn test_line_recognition_never_fails() {
        let engine = ScriptedEngine::new(vec![(
            (LangSet::TurkishEnglish, PageSegMode::SingleLine),
            Err(OcrError::Recognition(String::new())),
        )]);
        let adapter = OcrAdapter::new(&engine, OcrConfig::default());

        assert_eq!(adapter.recognize_line(&blank()), "");
    }
}
