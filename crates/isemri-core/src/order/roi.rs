//! Region-of-interest extraction from the first page.
//!
//! The physical form carries a stacked column of labelled boxes (date,
//! plate, brand, model, odometer) at a known position. Reading each box
//! with single-line recognition gives positionally anchored values that
//! outrank free-text matches over the whole page.

use chrono::NaiveDate;
use image::DynamicImage;
use tracing::debug;

use super::rules::{dates, vehicle};
use crate::models::{FieldGuess, RoiBox, RoiConfig};
use crate::ocr::{ImagePreparer, OcrAdapter};

/// Confidence for a plate read out of its dedicated box.
const PLATE_CONFIDENCE: f32 = 0.85;
/// Confidence for a date read out of its dedicated box.
const DATE_CONFIDENCE: f32 = 0.8;
/// Confidence for the remaining boxes, which have no syntax to validate.
const TEXT_CONFIDENCE: f32 = 0.7;

/// Values read from the form's field boxes. Absent guesses never override
/// anything downstream.
#[derive(Debug, Clone, Default)]
pub struct RoiFields {
    pub date: FieldGuess<NaiveDate>,
    pub plate: FieldGuess<String>,
    pub brand: FieldGuess<String>,
    pub model: FieldGuess<String>,
    pub odometer: FieldGuess<u32>,
}

/// Crops field boxes off the first page and reads each with single-line
/// recognition.
pub struct RoiExtractor {
    config: RoiConfig,
}

impl RoiExtractor {
    pub fn new(config: RoiConfig) -> Self {
        Self { config }
    }

    /// Read every configured box off the page image.
    pub fn extract(
        &self,
        page: &DynamicImage,
        adapter: &OcrAdapter<'_>,
        preparer: &ImagePreparer,
    ) -> RoiFields {
        if !self.config.enabled {
            return RoiFields::default();
        }
        let layout = &self.config.layout;

        RoiFields {
            date: parse_date_field(&self.read_box(page, &layout.date, adapter, preparer)),
            plate: parse_plate_field(&self.read_box(page, &layout.plate, adapter, preparer)),
            brand: parse_text_field(&self.read_box(page, &layout.brand, adapter, preparer)),
            model: parse_text_field(&self.read_box(page, &layout.model, adapter, preparer)),
            odometer: parse_odometer_field(&self.read_box(page, &layout.odometer, adapter, preparer)),
        }
    }

    fn read_box(
        &self,
        page: &DynamicImage,
        roi: &RoiBox,
        adapter: &OcrAdapter<'_>,
        preparer: &ImagePreparer,
    ) -> String {
        let crop = crop_fraction(page, roi);
        let crop = self.upscale_if_small(crop);
        let prepared = preparer.prepare(&crop, adapter.engine());
        adapter.recognize_line(&prepared)
    }

    /// Tiny crops carry too few pixels for recognition; double them.
    fn upscale_if_small(&self, crop: DynamicImage) -> DynamicImage {
        let min_dim = crop.width().min(crop.height());
        if min_dim >= self.config.min_crop_dimension {
            return crop;
        }
        debug!("upscaling {}x{} ROI crop", crop.width(), crop.height());
        crop.resize_exact(
            crop.width() * 2,
            crop.height() * 2,
            image::imageops::FilterType::Lanczos3,
        )
    }
}

/// Crop by fractional coordinates, clamped to at least one pixel.
///
/// Boxes come from user-editable configuration, so an inverted box must
/// collapse instead of underflowing.
fn crop_fraction(page: &DynamicImage, roi: &RoiBox) -> DynamicImage {
    let (w, h) = (page.width() as f32, page.height() as f32);
    let x1 = (w * roi.x1) as u32;
    let y1 = (h * roi.y1) as u32;
    let x2 = ((w * roi.x2) as u32).min(page.width());
    let y2 = ((h * roi.y2) as u32).min(page.height());

    page.crop_imm(
        x1,
        y1,
        x2.saturating_sub(x1).max(1),
        y2.saturating_sub(y1).max(1),
    )
}

fn parse_date_field(raw: &str) -> FieldGuess<NaiveDate> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '/' | '-'))
        .collect();
    match dates::parse_date(&cleaned) {
        Some(date) => FieldGuess::found(date, DATE_CONFIDENCE),
        None => FieldGuess::absent(),
    }
}

fn parse_plate_field(raw: &str) -> FieldGuess<String> {
    let plate = repair_plate(raw);
    if plate.chars().count() >= 6 {
        FieldGuess::found(plate, PLATE_CONFIDENCE)
    } else {
        FieldGuess::absent()
    }
}

/// Repair common single-character confusions in a plate crop.
///
/// The pipe-to-I fix is safe anywhere. The letter-to-digit fixes only run
/// once the string is long enough to plausibly be a full plate, since on
/// a fragment they do more harm than good.
fn repair_plate(raw: &str) -> String {
    let plate = vehicle::normalize_plate(&raw.replace('|', "I"));
    if plate.chars().count() >= 6 {
        plate.replace('O', "0").replace('I', "1").replace('Z', "2")
    } else {
        plate
    }
}

fn parse_text_field(raw: &str) -> FieldGuess<String> {
    let text: String = raw.trim().to_uppercase().chars().take(20).collect();
    if text.chars().count() >= 2 {
        FieldGuess::found(text, TEXT_CONFIDENCE)
    } else {
        FieldGuess::absent()
    }
}

fn parse_odometer_field(raw: &str) -> FieldGuess<u32> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.parse::<u32>() {
        Ok(km) if km > 0 => FieldGuess::found(km, TEXT_CONFIDENCE),
        _ => FieldGuess::absent(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OcrConfig;
    use crate::ocr::testing::ScriptedEngine;
    use image::{GrayImage, Luma};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_repair_plate_fixes_confusions() {
        assert_eq!(repair_plate("34 AB( I23"), "34AB(123");
        assert_eq!(repair_plate("O6 BC 123"), "06BC123");
        assert_eq!(repair_plate("34|23"), "34I23");
    }

    #[test]
    fn test_repair_is_idempotent_on_clean_plates() {
        assert_eq!(repair_plate("34ABC123"), "34ABC123");
        assert_eq!(repair_plate(&repair_plate("34 abc 123")), "34ABC123");
    }

    #[test]
    fn test_short_plate_crop_is_absent() {
        assert!(!parse_plate_field("34A").is_present());
        assert!(!parse_plate_field("").is_present());
    }

    #[test]
    fn test_date_field_strips_noise() {
        let guess = parse_date_field(" Tarih 12.03.2024 ");
        assert_eq!(
            guess.value,
            Some(NaiveDate::from_ymd_opt(2024, 3, 12).unwrap())
        );
    }

    #[test]
    fn test_odometer_field() {
        assert_eq!(parse_odometer_field("85.000 km").value, Some(85_000));
        assert!(!parse_odometer_field("yok").is_present());
    }

    #[test]
    fn test_crop_fraction_dimensions() {
        let page = DynamicImage::ImageLuma8(GrayImage::from_pixel(1000, 1000, Luma([255u8])));
        let crop = crop_fraction(&page, &RoiBox::new(0.5, 0.25, 0.75, 0.5));
        assert_eq!(crop.width(), 250);
        assert_eq!(crop.height(), 250);
    }

    #[test]
    fn test_inverted_box_collapses_to_one_pixel() {
        let page = DynamicImage::ImageLuma8(GrayImage::from_pixel(100, 100, Luma([255u8])));
        let crop = crop_fraction(&page, &RoiBox::new(0.8, 0.9, 0.2, 0.1));
        assert_eq!(crop.width(), 1);
        assert_eq!(crop.height(), 1);
    }

    #[test]
    fn test_extract_reads_every_box() {
        let engine = ScriptedEngine::constant("34 ABC 123");
        let adapter = OcrAdapter::new(&engine, OcrConfig::default());
        let page = DynamicImage::ImageLuma8(GrayImage::from_pixel(400, 400, Luma([255u8])));

        let fields = RoiExtractor::new(RoiConfig::default()).extract(&page, &adapter, &ImagePreparer::new());

        assert_eq!(fields.plate.value.as_deref(), Some("34ABC123"));
        // The same crop text does not parse as a date.
        assert!(!fields.date.is_present());
        assert_eq!(fields.brand.value.as_deref(), Some("34 ABC 123"));
    }
}
