//! Rule-based draft parser over raw OCR text.

use chrono::{DateTime, TimeZone, Utc};

use super::roi::RoiFields;
use super::rules::{dates, items, patterns, vehicle};
use crate::models::{ExtractedDraft, ExtractionConfig};

/// Confidence for a customer with a contact detail, the defining field.
const CUSTOMER_STRONG: f32 = 0.9;
/// Confidence for a labelled name without contact corroboration.
const CUSTOMER_WEAK: f32 = 0.5;
/// Confidence for a vehicle identified by plate or odometer.
const VEHICLE_STRONG: f32 = 0.9;
/// Confidence for brand/model without a plate or odometer.
const VEHICLE_WEAK: f32 = 0.4;

/// Deterministic parser turning raw text into a draft.
///
/// Never fails: text with nothing recognizable yields the well-formed
/// placeholder draft.
pub struct RuleBasedParser {
    config: ExtractionConfig,
}

impl RuleBasedParser {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Parse raw text into a draft anchored at the capture time.
    pub fn parse(&self, text: &str, captured_at: DateTime<Utc>) -> ExtractedDraft {
        let mut draft = ExtractedDraft::empty(captured_at);

        self.parse_customer(text, &mut draft);
        self.parse_vehicle(text, &mut draft);
        self.parse_date(text, captured_at, &mut draft);

        draft.items = items::extract_items(text, &self.config);
        draft.totals = items::extract_totals(text, &self.config);

        draft.ensure_items();
        draft
    }

    /// Override parsed fields with ROI findings, which are anchored to known
    /// form positions and therefore more trustworthy than free-text matches.
    pub fn apply_roi(&self, draft: &mut ExtractedDraft, roi: &RoiFields) {
        if let Some(plate) = &roi.plate.value {
            draft.vehicle.plate = Some(plate.clone());
            draft.vehicle.confidence = draft.vehicle.confidence.max(roi.plate.confidence);
        }
        if let Some(brand) = &roi.brand.value {
            draft.vehicle.brand = Some(brand.clone());
        }
        if let Some(model) = &roi.model.value {
            draft.vehicle.model = Some(model.clone());
        }
        if let Some(km) = roi.odometer.value {
            draft.vehicle.km = Some(km);
            draft.vehicle.confidence = draft.vehicle.confidence.max(roi.odometer.confidence);
        }
        if let Some(date) = roi.date.value {
            if let Some(dt) = date.and_hms_opt(0, 0, 0) {
                draft.started_at = Utc.from_utc_datetime(&dt);
            }
        }
    }

    fn parse_customer(&self, text: &str, draft: &mut ExtractedDraft) {
        let labelled = patterns::CUSTOMER_LABEL
            .captures(text)
            .map(|caps| caps[1].trim().to_string())
            .filter(|name| !name.is_empty());

        if let Some(name) = labelled {
            draft.customer.name = name.chars().take(80).collect();
            draft.customer.confidence = CUSTOMER_WEAK;
        }

        if let Some(m) = patterns::PHONE.find(text) {
            draft.customer.phone = Some(m.as_str().trim().to_string());
        }
        if let Some(m) = patterns::EMAIL.find(text) {
            draft.customer.email = Some(m.as_str().to_string());
        }

        // A phone or e-mail is the defining field for the group; a labelled
        // name alone only gets the weak score set above.
        if draft.customer.phone.is_some() || draft.customer.email.is_some() {
            draft.customer.confidence = CUSTOMER_STRONG;
        }
    }

    fn parse_vehicle(&self, text: &str, draft: &mut ExtractedDraft) {
        draft.vehicle.plate = vehicle::extract_plate(text);
        draft.vehicle.km = vehicle::extract_kilometers(text);

        let (brand, model) = vehicle::extract_brand_model(text, &self.config.brands);
        draft.vehicle.brand = brand;
        draft.vehicle.model = model;

        // Plate or odometer defines the group; brand/model alone is a guess.
        draft.vehicle.confidence = if draft.vehicle.plate.is_some() || draft.vehicle.km.is_some() {
            VEHICLE_STRONG
        } else if draft.vehicle.brand.is_some() {
            VEHICLE_WEAK
        } else {
            0.0
        };
    }

    fn parse_date(&self, text: &str, captured_at: DateTime<Utc>, draft: &mut ExtractedDraft) {
        let parsed = patterns::DATE
            .captures_iter(text)
            .find_map(|caps| dates::parse_date(&caps[1]));

        draft.started_at = parsed
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|dt| Utc.from_utc_datetime(&dt))
            .unwrap_or(captured_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CustomerKind, ItemKind, OrderStatus, Provenance, UNKNOWN_CUSTOMER};
    use chrono::{Datelike, NaiveDate};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn parser() -> RuleBasedParser {
        RuleBasedParser::new(ExtractionConfig::default())
    }

    const FORM: &str = "\
Müşteri Adı: Ahmet Yılmaz
Tel: 0532 123 45 67
Plaka: 34 ABC 123
Araç: Renault Clio
Km: 85.000 km
Tarih: 12.03.2024

Yağ filtresi 2x150
İşçilik bedeli 250,00

Toplam: 250,00
KDV %20: 50,00
Genel Toplam: 300,00
";

    #[test]
    fn test_full_form_parse() {
        let draft = parser().parse(FORM, Utc::now());

        assert_eq!(draft.customer.name, "Ahmet Yılmaz");
        assert_eq!(draft.customer.kind, CustomerKind::Person);
        assert_eq!(draft.customer.phone.as_deref(), Some("0532 123 45 67"));
        assert_eq!(draft.customer.confidence, 0.9);

        assert_eq!(draft.vehicle.plate.as_deref(), Some("34ABC123"));
        assert_eq!(draft.vehicle.brand.as_deref(), Some("RENAULT"));
        assert_eq!(draft.vehicle.model.as_deref(), Some("CLIO"));
        assert_eq!(draft.vehicle.km, Some(85_000));
        assert_eq!(draft.vehicle.confidence, 0.9);

        assert_eq!(draft.started_at.date_naive().year(), 2024);
        assert_eq!(draft.started_at.date_naive().month(), 3);

        assert_eq!(draft.items.len(), 2);
        assert_eq!(draft.items[0].kind, ItemKind::Part);
        assert_eq!(draft.items[0].name, "Yağ filtresi");
        assert_eq!(draft.items[0].qty, 2);
        assert_eq!(draft.items[0].unit_price, Decimal::new(7500, 2));
        assert_eq!(draft.items[1].kind, ItemKind::Labor);

        assert_eq!(draft.totals.grand_total, Some(Decimal::new(30000, 2)));
        assert_eq!(draft.status, OrderStatus::Open);
        assert_eq!(draft.provenance, Provenance::RuleBased);
    }

    #[test]
    fn test_empty_text_yields_placeholder_draft() {
        let captured = Utc::now();
        let draft = parser().parse("", captured);

        assert_eq!(draft.customer.name, UNKNOWN_CUSTOMER);
        assert_eq!(draft.customer.confidence, 0.0);
        assert_eq!(draft.vehicle.plate, None);
        assert_eq!(draft.started_at, captured);
        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].kind, ItemKind::Labor);
        assert_eq!(draft.provenance, Provenance::RuleBased);
    }

    #[test]
    fn test_single_defining_field_scores_confident() {
        // A contact detail alone carries the customer group; an odometer
        // reading alone carries the vehicle group.
        let draft = parser().parse("Tel: 0532 123 45 67\nKm: 85000 km", Utc::now());
        assert_eq!(draft.customer.confidence, 0.9);
        assert_eq!(draft.vehicle.confidence, 0.9);
        assert_eq!(draft.vehicle.plate, None);
    }

    #[test]
    fn test_name_without_contact_stays_weak() {
        let draft = parser().parse("Müşteri Adı: Ahmet Yılmaz", Utc::now());
        assert_eq!(draft.customer.confidence, 0.5);
    }

    #[test]
    fn test_date_falls_back_to_capture_time() {
        let captured = Utc::now();
        let draft = parser().parse("Genel Toplam: 100,00", captured);
        assert_eq!(draft.started_at, captured);
    }

    #[test]
    fn test_roi_overrides_parsed_fields() {
        use crate::models::FieldGuess;

        let mut draft = parser().parse(FORM, Utc::now());
        let roi = RoiFields {
            plate: FieldGuess::found("06XYZ456".to_string(), 0.85),
            date: FieldGuess::found(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), 0.8),
            brand: FieldGuess::absent(),
            model: FieldGuess::absent(),
            odometer: FieldGuess::found(90_000, 0.7),
        };

        parser().apply_roi(&mut draft, &roi);
        assert_eq!(draft.vehicle.plate.as_deref(), Some("06XYZ456"));
        assert_eq!(draft.vehicle.km, Some(90_000));
        // Brand survives because the ROI read nothing there.
        assert_eq!(draft.vehicle.brand.as_deref(), Some("RENAULT"));
        assert_eq!(draft.started_at.date_naive().month(), 5);
    }
}
