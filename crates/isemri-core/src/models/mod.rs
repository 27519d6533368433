//! Data models for the extraction pipeline.

pub mod config;
pub mod draft;

pub use config::{
    ExtractionConfig, LlmConfig, OcrConfig, PipelineConfig, RasterConfig, RoiBox, RoiConfig,
    RoiLayout,
};
pub use draft::{
    CustomerGuess, CustomerKind, ExtractedDraft, FieldGuess, ItemGuess, ItemKind, OrderStatus,
    Provenance, Totals, VehicleGuess, LOW_CONFIDENCE_THRESHOLD, PLACEHOLDER_ITEM, UNKNOWN_CUSTOMER,
};
