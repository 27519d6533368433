//! Configuration structures for the extraction pipeline.
//!
//! Vocabulary tables (vehicle brands, labor keywords) and the ROI layout are
//! configuration data so the extraction logic stays data-driven and testable
//! apart from any one form layout.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Main configuration for the isemri pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Page rasterization configuration.
    pub raster: RasterConfig,

    /// OCR adapter configuration.
    pub ocr: OcrConfig,

    /// ROI extraction configuration.
    pub roi: RoiConfig,

    /// Rule-based extraction configuration.
    pub extraction: ExtractionConfig,

    /// Generation-service (LLM) configuration.
    pub llm: LlmConfig,
}

/// Page rasterization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    /// DPI equivalent for rendering multi-page documents.
    pub render_dpi: u32,

    /// Hard cap on pages taken from a multi-page document.
    pub max_pages: usize,

    /// Images with a smaller minimum dimension are upscaled before OCR.
    pub min_image_dimension: u32,

    /// Upscale factor applied to low-resolution captures.
    pub upscale_factor: f32,

    /// Use embedded PDF text instead of OCR when present.
    pub prefer_embedded_text: bool,

    /// Minimum embedded text length to skip OCR.
    pub min_embedded_text_len: usize,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            render_dpi: 400,
            max_pages: 5,
            min_image_dimension: 1400,
            upscale_factor: 1.6,
            prefer_embedded_text: true,
            min_embedded_text_len: 50,
        }
    }
}

/// OCR adapter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Minimum stripped length for a page recognition attempt to count as
    /// usable text; shorter output advances the fallback ladder.
    pub min_page_text_len: usize,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            min_page_text_len: 10,
        }
    }
}

/// A bounding box in fractions (0-1) of image width/height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoiBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl RoiBox {
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

/// Named field boxes calibrated to one known physical form layout.
///
/// The defaults match the stacked top-right column of the service form:
/// date, plate, brand, model, odometer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoiLayout {
    pub date: RoiBox,
    pub plate: RoiBox,
    pub brand: RoiBox,
    pub model: RoiBox,
    pub odometer: RoiBox,
}

impl Default for RoiLayout {
    fn default() -> Self {
        Self {
            date: RoiBox::new(0.60, 0.11, 0.95, 0.17),
            plate: RoiBox::new(0.60, 0.17, 0.95, 0.23),
            brand: RoiBox::new(0.60, 0.23, 0.95, 0.29),
            model: RoiBox::new(0.60, 0.29, 0.95, 0.35),
            odometer: RoiBox::new(0.60, 0.35, 0.95, 0.41),
        }
    }
}

/// ROI extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoiConfig {
    /// Run ROI extraction on the first page.
    pub enabled: bool,

    /// Crops with a smaller minimum dimension are upscaled x2.
    pub min_crop_dimension: u32,

    /// Field boxes.
    pub layout: RoiLayout,
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_crop_dimension: 200,
            layout: RoiLayout::default(),
        }
    }
}

/// Rule-based extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Known vehicle manufacturers, matched case-insensitively.
    pub brands: Vec<String>,

    /// Keywords classifying a line item as labor rather than a part.
    pub labor_keywords: Vec<String>,

    /// Maximum line items extracted per document.
    pub max_items: usize,

    /// Maximum item name length in characters.
    pub max_name_len: usize,

    /// Default VAT rate when none is printed (fraction).
    pub default_vat_rate: Decimal,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            brands: [
                "RENAULT",
                "FIAT",
                "FORD",
                "MERCEDES-BENZ",
                "MERCEDES",
                "VOLKSWAGEN",
                "VW",
                "OPEL",
                "PEUGEOT",
                "BMW",
                "AUDI",
                "TOYOTA",
                "HYUNDAI",
                "HONDA",
                "CITROEN",
                "SKODA",
                "DACIA",
                "NISSAN",
                "KIA",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            labor_keywords: ["işçilik", "iscilik", "emek", "labour", "labor"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_items: 20,
            max_name_len: 120,
            default_vat_rate: Decimal::new(20, 2),
        }
    }
}

/// Generation-service (Ollama) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Attempt model-assisted extraction before the deterministic fallback.
    pub enabled: bool,

    /// Generation-service base URL.
    pub host: String,

    /// Model identifier.
    pub model: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            timeout_secs: 120,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| crate::error::IsemriError::Config(e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> crate::error::Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| crate::error::IsemriError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
