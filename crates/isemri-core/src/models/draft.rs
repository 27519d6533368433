//! The canonical draft record produced by the extraction pipeline.
//!
//! A draft is best-effort structured output destined for a human review UI;
//! it is always schema-valid (non-empty item list, normalized plate/money/date
//! forms) but carries no guarantee of semantic correctness. Confidence flags
//! tell the reviewer which field groups to distrust.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Name shown for a customer the pipeline could not identify.
pub const UNKNOWN_CUSTOMER: &str = "Bilinmeyen";

/// Name given to the placeholder labor item when no items were extracted.
pub const PLACEHOLDER_ITEM: &str = "İşçilik";

/// Confidence threshold below which a field group is flagged for review.
pub const LOW_CONFIDENCE_THRESHOLD: f32 = 0.75;

/// A guessed value with a confidence score in `[0, 1]`.
///
/// Absence is represented as `None` with confidence `0.0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldGuess<T> {
    /// The guessed value, if any.
    pub value: Option<T>,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
}

impl<T> FieldGuess<T> {
    /// A guess with a value and a confidence score.
    pub fn found(value: T, confidence: f32) -> Self {
        Self {
            value: Some(value),
            confidence,
        }
    }

    /// The absent guess: no value, zero confidence.
    pub fn absent() -> Self {
        Self {
            value: None,
            confidence: 0.0,
        }
    }

    /// Whether this guess carries a value.
    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }
}

impl<T> Default for FieldGuess<T> {
    fn default() -> Self {
        Self::absent()
    }
}

/// Customer classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerKind {
    #[default]
    Person,
    Company,
}

impl CustomerKind {
    /// Parse from a free-form string, defaulting to `Person`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "company" => CustomerKind::Company,
            _ => CustomerKind::Person,
        }
    }
}

/// Line item classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Work performed (işçilik).
    Labor,
    /// A replacement part.
    Part,
}

/// Work-order lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Open,
    Closed,
}

impl OrderStatus {
    /// Parse from a free-form string, defaulting to `Open`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "closed" => OrderStatus::Closed,
            _ => OrderStatus::Open,
        }
    }
}

/// Which extraction path produced the final draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Provenance {
    /// Deterministic rule/ROI extraction.
    RuleBased,
    /// Model-assisted extraction, recording the model configuration used.
    ModelAssisted { model: String },
}

/// Guessed customer fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerGuess {
    pub kind: CustomerKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Group confidence (0.0 - 1.0).
    pub confidence: f32,
}

impl Default for CustomerGuess {
    fn default() -> Self {
        Self {
            kind: CustomerKind::Person,
            name: UNKNOWN_CUSTOMER.to_string(),
            phone: None,
            email: None,
            confidence: 0.0,
        }
    }
}

/// Guessed vehicle fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VehicleGuess {
    /// License plate, uppercase with no separators.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Odometer reading in kilometers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub km: Option<u32>,
    /// Group confidence (0.0 - 1.0).
    pub confidence: f32,
}

/// A single guessed line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemGuess {
    pub kind: ItemKind,
    pub name: String,
    pub qty: u32,
    /// Unit price, decimal-normalized.
    pub unit_price: Decimal,
}

impl ItemGuess {
    /// The placeholder labor item inserted when extraction yields no items.
    pub fn placeholder() -> Self {
        Self {
            kind: ItemKind::Labor,
            name: PLACEHOLDER_ITEM.to_string(),
            qty: 1,
            unit_price: Decimal::ZERO,
        }
    }
}

/// Currency totals read off the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Totals {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<Decimal>,
    /// VAT rate as a fraction (0.20 = 20%).
    pub vat_rate: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vat_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grand_total: Option<Decimal>,
}

impl Default for Totals {
    fn default() -> Self {
        Self {
            subtotal: None,
            vat_rate: Decimal::new(20, 2),
            vat_amount: None,
            grand_total: None,
        }
    }
}

/// The canonical output of one extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedDraft {
    pub customer: CustomerGuess,
    pub vehicle: VehicleGuess,
    /// Work start timestamp; the extraction capture time when the document
    /// carries no recognizable date.
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Line items; never empty in a returned draft.
    pub items: Vec<ItemGuess>,
    pub totals: Totals,
    pub status: OrderStatus,
    /// Field-group names flagged for human review.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub low_confidence: Vec<String>,
    pub provenance: Provenance,
}

impl ExtractedDraft {
    /// An empty rule-based draft anchored at the given capture time.
    ///
    /// This is the starting point for the deterministic path and also the
    /// "no extractable content" draft: well-formed, clearly marked
    /// placeholders, never an error to the caller.
    pub fn empty(captured_at: DateTime<Utc>) -> Self {
        Self {
            customer: CustomerGuess::default(),
            vehicle: VehicleGuess::default(),
            started_at: captured_at,
            notes: None,
            items: Vec::new(),
            totals: Totals::default(),
            status: OrderStatus::Open,
            low_confidence: Vec::new(),
            provenance: Provenance::RuleBased,
        }
    }

    /// Enforce the non-empty item list invariant.
    pub fn ensure_items(&mut self) {
        if self.items.is_empty() {
            self.items.push(ItemGuess::placeholder());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_guess_absent() {
        let guess: FieldGuess<String> = FieldGuess::absent();
        assert!(guess.value.is_none());
        assert_eq!(guess.confidence, 0.0);
    }

    #[test]
    fn test_ensure_items_inserts_placeholder() {
        let mut draft = ExtractedDraft::empty(Utc::now());
        draft.ensure_items();
        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].kind, ItemKind::Labor);
        assert_eq!(draft.items[0].unit_price, Decimal::ZERO);
    }

    #[test]
    fn test_ensure_items_keeps_existing() {
        let mut draft = ExtractedDraft::empty(Utc::now());
        draft.items.push(ItemGuess {
            kind: ItemKind::Part,
            name: "Fren balatası".to_string(),
            qty: 2,
            unit_price: Decimal::new(45000, 2),
        });
        draft.ensure_items();
        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].kind, ItemKind::Part);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(OrderStatus::parse("closed"), OrderStatus::Closed);
        assert_eq!(OrderStatus::parse("OPEN"), OrderStatus::Open);
        assert_eq!(OrderStatus::parse("garbage"), OrderStatus::Open);
    }
}
