//! Core library for Turkish vehicle work-order extraction.
//!
//! This crate provides:
//! - Source rasterization (photos, scans, PDFs with embedded text or images)
//! - An OCR pipeline with image preparation and fallback recognition ladders
//! - Deterministic rule and ROI extraction of work-order fields
//! - Optional model-assisted extraction through a local Ollama server
//! - An import registry tracking each document's review lifecycle

pub mod error;
pub mod llm;
pub mod models;
pub mod ocr;
pub mod order;
pub mod pipeline;
pub mod raster;
pub mod registry;

pub use error::{IsemriError, Result};
pub use models::{
    CustomerKind, ExtractedDraft, ItemGuess, ItemKind, OrderStatus, PipelineConfig, Provenance,
};
pub use ocr::{ImagePreparer, OcrAdapter, RecognitionEngine};
#[cfg(feature = "tesseract")]
pub use ocr::TesseractEngine;
pub use llm::{GenerationService, OllamaClient};
pub use order::{RoiExtractor, RuleBasedParser};
pub use pipeline::{ExtractionOutcome, ExtractionPipeline};
pub use raster::{Rasterizer, SourceKind};
pub use registry::{ImportRecord, ImportRegistry, ImportState};
