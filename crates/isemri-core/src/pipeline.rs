//! The end-to-end extraction pipeline.
//!
//! One call takes raw document bytes and always comes back with a
//! well-formed draft: rasterize, recognize (or lift embedded PDF text),
//! try model-assisted extraction, and fall back to deterministic rules
//! plus ROI reads. Every stage degrades instead of failing; the only
//! honest signal of a bad document is low confidence.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::llm::{build_prompt, draft_from_response, GenerationService};
use crate::models::{ExtractedDraft, PipelineConfig, LOW_CONFIDENCE_THRESHOLD};
use crate::ocr::{join_pages, ImagePreparer, OcrAdapter, RecognitionEngine};
use crate::order::{RoiExtractor, RuleBasedParser};
use crate::raster::{Rasterizer, SourceKind};

/// Character cap on the raw text echoed back for debugging.
const RAW_TEXT_LIMIT: usize = 1500;

/// Result of one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    /// The draft, always well-formed.
    pub draft: ExtractedDraft,
    /// Truncated raw text, present only when debug output was requested.
    pub raw_text: Option<String>,
}

/// The extraction pipeline. Owns its recognition engine; the generation
/// service is optional and its absence simply skips the model-assisted path.
pub struct ExtractionPipeline {
    config: PipelineConfig,
    engine: Box<dyn RecognitionEngine>,
    generator: Option<Box<dyn GenerationService>>,
}

impl ExtractionPipeline {
    pub fn new(config: PipelineConfig, engine: Box<dyn RecognitionEngine>) -> Self {
        Self {
            config,
            engine,
            generator: None,
        }
    }

    /// Attach a generation service for the model-assisted path.
    pub fn with_generator(mut self, generator: Box<dyn GenerationService>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Extract a draft from raw document bytes.
    ///
    /// Never fails: unreadable input produces the placeholder draft with
    /// every field group flagged low-confidence.
    pub fn extract(&self, data: &[u8], kind: SourceKind, include_debug: bool) -> ExtractionOutcome {
        let captured_at = Utc::now();
        let rasterizer = Rasterizer::new(self.config.raster.clone());
        let adapter = OcrAdapter::new(self.engine.as_ref(), self.config.ocr.clone());
        let preparer = ImagePreparer::new();

        // Born-digital PDFs skip rasterization and OCR entirely.
        let embedded = rasterizer.embedded_text(data, kind);
        let pages = if embedded.is_some() {
            Vec::new()
        } else {
            rasterizer.rasterize(data, kind)
        };

        let raw_text = match embedded {
            Some(text) => {
                info!("using embedded PDF text ({} chars)", text.len());
                text
            }
            None => {
                let chunks: Vec<String> = pages
                    .iter()
                    .map(|page| {
                        debug!("recognizing page {}", page.index);
                        let prepared = preparer.prepare(&page.image, adapter.engine());
                        adapter.recognize_page(&prepared)
                    })
                    .collect();
                join_pages(&chunks)
            }
        };

        let mut draft = match self.model_assisted(&raw_text, captured_at) {
            Some(draft) => draft,
            None => {
                let parser = RuleBasedParser::new(self.config.extraction.clone());
                let mut draft = parser.parse(&raw_text, captured_at);
                // ROI reads only exist on the rasterized path.
                if let Some(first) = pages.first() {
                    let roi = RoiExtractor::new(self.config.roi.clone())
                        .extract(&first.image, &adapter, &preparer);
                    parser.apply_roi(&mut draft, &roi);
                }
                draft
            }
        };

        draft.ensure_items();
        flag_low_confidence(&mut draft);

        ExtractionOutcome {
            draft,
            raw_text: include_debug.then(|| truncate_chars(&raw_text, RAW_TEXT_LIMIT)),
        }
    }

    fn model_assisted(
        &self,
        raw_text: &str,
        captured_at: chrono::DateTime<Utc>,
    ) -> Option<ExtractedDraft> {
        if !self.config.llm.enabled || raw_text.trim().is_empty() {
            return None;
        }
        let generator = self.generator.as_ref()?;

        match generator.generate(&build_prompt(raw_text)) {
            Ok(response) => {
                let draft = draft_from_response(
                    &response,
                    captured_at,
                    &self.config.extraction,
                    generator.model_id(),
                );
                if draft.is_none() {
                    debug!("unusable generation response, falling back to rules");
                }
                draft
            }
            Err(e) => {
                warn!("generation request failed: {}", e);
                None
            }
        }
    }
}

/// Mark field groups whose confidence falls under the review threshold.
fn flag_low_confidence(draft: &mut ExtractedDraft) {
    draft.low_confidence.clear();
    if draft.customer.confidence < LOW_CONFIDENCE_THRESHOLD {
        draft.low_confidence.push("customer".to_string());
    }
    if draft.vehicle.confidence < LOW_CONFIDENCE_THRESHOLD {
        draft.low_confidence.push("vehicle".to_string());
    }
    if draft.items.len() == 1 && draft.items[0] == crate::models::ItemGuess::placeholder() {
        draft.low_confidence.push("items".to_string());
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    text.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedGenerator;
    use crate::models::{ItemKind, Provenance};
    use crate::ocr::testing::ScriptedEngine;
    use crate::ocr::{LangSet, PageSegMode};
    use image::{DynamicImage, GrayImage, Luma};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    const FORM: &str = "\
Müşteri Adı: Ahmet Yılmaz
Tel: 0532 123 45 67
Plaka: 34 ABC 123
Araç: Renault Clio
Yağ filtresi 2x150
Genel Toplam: 300,00
";

    fn png_bytes() -> Vec<u8> {
        let img = GrayImage::from_pixel(100, 100, Luma([220u8]));
        let mut bytes = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    /// An engine that reads the form on full-page passes and nothing on
    /// ROI line passes.
    fn form_engine() -> ScriptedEngine {
        ScriptedEngine::new(vec![(
            (LangSet::TurkishEnglish, PageSegMode::UniformBlock),
            Ok(FORM.to_string()),
        )])
    }

    fn pipeline(engine: ScriptedEngine) -> ExtractionPipeline {
        let mut config = PipelineConfig::default();
        config.llm.enabled = false;
        ExtractionPipeline::new(config, Box::new(engine))
    }

    #[test]
    fn test_rule_based_extraction_from_image() {
        let outcome = pipeline(form_engine()).extract(&png_bytes(), SourceKind::Image, false);
        let draft = outcome.draft;

        assert_eq!(draft.provenance, Provenance::RuleBased);
        assert_eq!(draft.vehicle.plate.as_deref(), Some("34ABC123"));
        assert_eq!(draft.items[0].name, "Yağ filtresi");
        assert_eq!(draft.items[0].qty, 2);
        // Customer has a contact, vehicle has a plate but no odometer.
        assert!(!draft.low_confidence.contains(&"customer".to_string()));
        assert!(!draft.low_confidence.contains(&"items".to_string()));
        assert!(outcome.raw_text.is_none());
    }

    #[test]
    fn test_contact_and_odometer_alone_are_not_flagged() {
        let engine = ScriptedEngine::new(vec![(
            (LangSet::TurkishEnglish, PageSegMode::UniformBlock),
            Ok("Tel: 0532 123 45 67\nKm: 85000 km".to_string()),
        )]);

        let draft = pipeline(engine).extract(&png_bytes(), SourceKind::Image, false).draft;

        assert!(!draft.low_confidence.contains(&"customer".to_string()));
        assert!(!draft.low_confidence.contains(&"vehicle".to_string()));
    }

    #[test]
    fn test_model_assisted_path_wins_when_usable() {
        let mut config = PipelineConfig::default();
        config.llm.enabled = true;
        let reply = r#"{"customer": {"name": "Ayşe Kaya"}, "items": [
            {"kind": "part", "name": "Fren balatası", "qty": 2, "unit_price": 450.0}
        ]}"#;

        let pipeline = ExtractionPipeline::new(config, Box::new(form_engine()))
            .with_generator(Box::new(ScriptedGenerator::replying(reply)));
        let draft = pipeline.extract(&png_bytes(), SourceKind::Image, false).draft;

        assert_eq!(
            draft.provenance,
            Provenance::ModelAssisted {
                model: "scripted".to_string()
            }
        );
        assert_eq!(draft.customer.name, "Ayşe Kaya");
        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].kind, ItemKind::Part);
    }

    #[test]
    fn test_failed_generation_falls_back_to_rules() {
        let mut config = PipelineConfig::default();
        config.llm.enabled = true;

        let pipeline = ExtractionPipeline::new(config, Box::new(form_engine()))
            .with_generator(Box::new(ScriptedGenerator::failing()));
        let draft = pipeline.extract(&png_bytes(), SourceKind::Image, false).draft;

        assert_eq!(draft.provenance, Provenance::RuleBased);
        assert_eq!(draft.vehicle.plate.as_deref(), Some("34ABC123"));
    }

    #[test]
    fn test_unusable_response_falls_back_to_rules() {
        let mut config = PipelineConfig::default();
        config.llm.enabled = true;

        let pipeline = ExtractionPipeline::new(config, Box::new(form_engine()))
            .with_generator(Box::new(ScriptedGenerator::replying("buyrun efendim")));
        let draft = pipeline.extract(&png_bytes(), SourceKind::Image, false).draft;

        assert_eq!(draft.provenance, Provenance::RuleBased);
    }

    #[test]
    fn test_unreadable_input_yields_flagged_placeholder() {
        let outcome = pipeline(ScriptedEngine::constant("")).extract(
            b"definitely not an image",
            SourceKind::Image,
            true,
        );
        let draft = outcome.draft;

        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].kind, ItemKind::Labor);
        assert_eq!(
            draft.low_confidence,
            vec!["customer".to_string(), "vehicle".to_string(), "items".to_string()]
        );
        assert_eq!(outcome.raw_text.as_deref(), Some(""));
    }

    #[test]
    fn test_debug_raw_text_is_truncated() {
        let long_line = format!("Açıklama {} Genel Toplam: 300,00", "x".repeat(3000));
        let engine = ScriptedEngine::new(vec![(
            (LangSet::TurkishEnglish, PageSegMode::UniformBlock),
            Ok(long_line),
        )]);

        let outcome = pipeline(engine).extract(&png_bytes(), SourceKind::Image, true);
        let raw = outcome.raw_text.unwrap();
        assert_eq!(raw.chars().count(), RAW_TEXT_LIMIT);
    }
}
