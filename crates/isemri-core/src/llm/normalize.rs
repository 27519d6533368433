//! Generation-response sanitization and normalization into a draft.
//!
//! Models answer with loosely typed JSON: numbers as strings, currency
//! suffixes on amounts, missing keys, prose or code fences around the
//! object. This layer repairs all of that. A response is usable only when
//! it carries an `items` key; anything less falls back to rules.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::models::{
    CustomerKind, ExtractedDraft, ExtractionConfig, ItemGuess, ItemKind, OrderStatus, Provenance,
    UNKNOWN_CUSTOMER,
};
use crate::order::rules::items::GENERIC_ITEM;
use crate::order::rules::{money, vehicle};

/// Customer/vehicle confidence when the model filled the field in.
const MODEL_CONFIDENCE: f32 = 0.8;
/// Vehicle confidence with brand but no plate.
const MODEL_WEAK_CONFIDENCE: f32 = 0.4;

/// A scalar the model may emit as a number, a string, or a boolean.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Loose {
    Number(f64),
    Text(String),
    Bool(bool),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LlmDraft {
    customer: Option<LlmCustomer>,
    vehicle: Option<LlmVehicle>,
    started_at: Option<String>,
    notes: Option<String>,
    items: Option<Vec<LlmItem>>,
    totals: Option<LlmTotals>,
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LlmCustomer {
    #[serde(alias = "type")]
    kind: Option<String>,
    name: Option<String>,
    phone: Option<Loose>,
    email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LlmVehicle {
    plate: Option<String>,
    brand: Option<String>,
    model: Option<String>,
    year: Option<Loose>,
    km: Option<Loose>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LlmItem {
    #[serde(alias = "type")]
    kind: Option<String>,
    name: Option<String>,
    qty: Option<Loose>,
    unit_price: Option<Loose>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LlmTotals {
    subtotal: Option<Loose>,
    vat_rate: Option<Loose>,
    vat_amount: Option<Loose>,
    grand_total: Option<Loose>,
}

/// Decode and normalize a raw completion into a draft.
///
/// `None` means the response is unusable and the deterministic path should
/// produce the draft instead.
pub fn draft_from_response(
    raw: &str,
    captured_at: DateTime<Utc>,
    config: &ExtractionConfig,
    model: &str,
) -> Option<ExtractedDraft> {
    let json = sanitize_response(raw)?;
    let parsed: LlmDraft = match serde_json::from_str(json) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!("generation response is not valid JSON: {}", e);
            return None;
        }
    };
    // Without an item list the answer carries nothing worth arbitrating for.
    let items = parsed.items?;

    let mut draft = ExtractedDraft::empty(captured_at);
    draft.provenance = Provenance::ModelAssisted {
        model: model.to_string(),
    };

    if let Some(customer) = parsed.customer {
        draft.customer.kind = customer
            .kind
            .as_deref()
            .map(CustomerKind::parse)
            .unwrap_or_default();
        if let Some(name) = text(customer.name) {
            draft.customer.name = name.chars().take(80).collect();
            draft.customer.confidence = MODEL_CONFIDENCE;
        } else {
            draft.customer.name = UNKNOWN_CUSTOMER.to_string();
        }
        draft.customer.phone = customer.phone.as_ref().and_then(loose_text);
        draft.customer.email = text(customer.email);
    }

    if let Some(vhc) = parsed.vehicle {
        draft.vehicle.plate = text(vhc.plate)
            .map(|p| vehicle::normalize_plate(&p))
            .filter(|p| !p.is_empty());
        draft.vehicle.brand = text(vhc.brand).map(|b| b.to_uppercase());
        draft.vehicle.model = text(vhc.model).map(|m| m.to_uppercase());
        draft.vehicle.year = vhc
            .year
            .as_ref()
            .and_then(loose_int)
            .and_then(|y| i32::try_from(y).ok())
            .filter(|y| (1950..=2100).contains(y));
        draft.vehicle.km = vhc
            .km
            .as_ref()
            .and_then(loose_int)
            .and_then(|km| u32::try_from(km).ok());
        draft.vehicle.confidence = if draft.vehicle.plate.is_some() {
            MODEL_CONFIDENCE
        } else if draft.vehicle.brand.is_some() {
            MODEL_WEAK_CONFIDENCE
        } else {
            0.0
        };
    }

    draft.started_at = parsed
        .started_at
        .as_deref()
        .and_then(parse_started_at)
        .unwrap_or(captured_at);

    draft.items = items
        .into_iter()
        .filter_map(|item| normalize_item(item, config))
        .take(config.max_items)
        .collect();

    if let Some(totals) = parsed.totals {
        draft.totals.subtotal = totals.subtotal.as_ref().and_then(loose_decimal);
        draft.totals.vat_amount = totals.vat_amount.as_ref().and_then(loose_decimal);
        draft.totals.grand_total = totals.grand_total.as_ref().and_then(loose_decimal);
        draft.totals.vat_rate = totals
            .vat_rate
            .as_ref()
            .and_then(loose_decimal)
            .map(|rate| {
                // Accept both "0.20" and "20".
                if rate > Decimal::ONE {
                    rate / Decimal::ONE_HUNDRED
                } else {
                    rate
                }
            })
            .unwrap_or(config.default_vat_rate);
    } else {
        draft.totals.vat_rate = config.default_vat_rate;
    }

    if let Some(status) = parsed.status.as_deref() {
        draft.status = OrderStatus::parse(status);
    }
    draft.notes = text(parsed.notes);

    draft.ensure_items();
    Some(draft)
}

/// The JSON object inside a completion: first `{` through last `}`.
///
/// This tolerates code fences, leading prose, and trailing commentary in
/// one move.
fn sanitize_response(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Nameless entries are noise and get dropped; a short but present name is
/// replaced by the generic one.
fn normalize_item(item: LlmItem, config: &ExtractionConfig) -> Option<ItemGuess> {
    let name = text(item.name)?;
    let name: String = if name.chars().count() < 3 {
        GENERIC_ITEM.to_string()
    } else {
        name.chars().take(config.max_name_len).collect()
    };

    let lower = name.to_lowercase();
    let kind = match item.kind.as_deref().map(str::trim) {
        Some(k) if k.eq_ignore_ascii_case("labor") || k.eq_ignore_ascii_case("labour") => {
            ItemKind::Labor
        }
        Some(k) if k.eq_ignore_ascii_case("part") => ItemKind::Part,
        _ if config.labor_keywords.iter().any(|kw| lower.contains(kw)) => ItemKind::Labor,
        _ => ItemKind::Part,
    };

    // Zero, negative, or missing quantities all collapse to one unit.
    let qty = item
        .qty
        .as_ref()
        .and_then(loose_int)
        .and_then(|q| u32::try_from(q).ok())
        .filter(|&q| q > 0)
        .unwrap_or(1);

    Some(ItemGuess {
        kind,
        name,
        qty,
        unit_price: item.unit_price.as_ref().and_then(loose_decimal).unwrap_or(Decimal::ZERO),
    })
}

fn parse_started_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&dt));
        }
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| crate::order::rules::parse_date(raw));
    date.and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
}

/// A trimmed, non-empty string.
fn text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && s != "null")
}

fn loose_text(value: &Loose) -> Option<String> {
    match value {
        Loose::Text(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Loose::Number(n) => Some(format!("{}", n)),
        Loose::Bool(_) => None,
    }
}

/// Integer coercion: thousands separators and stray spaces stripped.
fn loose_int(value: &Loose) -> Option<i64> {
    match value {
        Loose::Number(n) => Some(*n as i64),
        Loose::Text(s) => {
            let digits: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '-')
                .collect();
            digits.parse().ok()
        }
        Loose::Bool(_) => None,
    }
}

/// Decimal coercion: numbers directly, strings through the money parser.
fn loose_decimal(value: &Loose) -> Option<Decimal> {
    match value {
        Loose::Number(n) => Decimal::from_f64(*n).map(|d| d.round_dp(2)),
        Loose::Text(s) => {
            s.chars().any(|c| c.is_ascii_digit()).then(|| money::parse_money(s))
        }
        Loose::Bool(_) => None,
    }
}
