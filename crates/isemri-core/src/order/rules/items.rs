//! Line-item and totals extraction from raw OCR text.

use rust_decimal::Decimal;

use super::money::parse_money;
use super::patterns;
use crate::models::{ExtractionConfig, ItemGuess, ItemKind, Totals};

/// Fallback name for an item whose text reduces to almost nothing.
pub(crate) const GENERIC_ITEM: &str = "Kalem";

/// Scan for totals lines: subtotal, VAT, grand total.
///
/// The last monetary amount on a keyword line wins, so a line like
/// `KDV %20 54,00` reads the amount and not the percentage. The grand-total
/// keyword is checked before the plain total keyword it contains.
pub fn extract_totals(text: &str, config: &ExtractionConfig) -> Totals {
    let mut totals = Totals {
        vat_rate: config.default_vat_rate,
        ..Totals::default()
    };

    for line in text.lines() {
        let lower = fold_lowercase(line);

        if lower.contains("genel toplam") {
            if let Some(amount) = last_amount(line) {
                totals.grand_total = Some(amount);
            }
        } else if lower.contains("kdv") {
            if let Some(caps) = patterns::VAT_PERCENT.captures(line) {
                totals.vat_rate = parse_money(&caps[1]) / Decimal::ONE_HUNDRED;
            }
            if let Some(amount) = last_amount(line) {
                totals.vat_amount = Some(amount);
            }
        } else if lower.contains("toplam") {
            if let Some(amount) = last_amount(line) {
                totals.subtotal = Some(amount);
            }
        }
    }

    totals
}

/// Turn price-bearing lines into line items, capped at `max_items`.
///
/// Any line with a monetary match qualifies, a bare integer amount
/// included, once date, odometer, plate, and contact spans are scrubbed
/// out. Totals lines never become items.
pub fn extract_items(text: &str, config: &ExtractionConfig) -> Vec<ItemGuess> {
    let mut items = Vec::new();

    for line in text.lines() {
        if items.len() >= config.max_items {
            break;
        }

        let lower = fold_lowercase(line);
        if lower.contains("toplam") || lower.contains("kdv") {
            continue;
        }

        // Dates, odometer readings, plates, and contact details read as or
        // contain amounts; drop their spans before scanning for prices.
        let scrubbed = patterns::DATE.replace_all(line, " ");
        let scrubbed = patterns::KILOMETERS.replace_all(&scrubbed, " ");
        let scrubbed = patterns::PLATE.replace_all(&scrubbed, " ");
        let scrubbed = patterns::PHONE.replace_all(&scrubbed, " ");
        let scrubbed = patterns::EMAIL.replace_all(&scrubbed, " ");

        let Some(price) = last_amount(&scrubbed) else {
            continue;
        };

        let qty = extract_qty(&scrubbed);
        // The trailing amount is the line total; per-unit price follows.
        let unit_price = if qty > 1 {
            (price / Decimal::from(qty)).round_dp(2)
        } else {
            price
        };

        let kind = if config.labor_keywords.iter().any(|kw| lower.contains(kw)) {
            ItemKind::Labor
        } else {
            ItemKind::Part
        };

        items.push(ItemGuess {
            kind,
            name: item_name(&scrubbed, config.max_name_len),
            qty,
            unit_price,
        });
    }

    items
}

/// Lowercase with the combining dot from `İ` removed, so Turkish uppercase
/// keywords still match their lowercase forms.
fn fold_lowercase(line: &str) -> String {
    line.to_lowercase().chars().filter(|&c| c != '\u{0307}').collect()
}

fn last_amount(line: &str) -> Option<Decimal> {
    patterns::MONEY
        .captures_iter(line)
        .last()
        .map(|caps| parse_money(&caps[1]))
}

fn extract_qty(line: &str) -> u32 {
    let qty = patterns::QTY_TIMES
        .captures(line)
        .or_else(|| patterns::QTY_UNIT.captures(line))
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .unwrap_or(1);
    qty.max(1)
}

/// Line text minus quantity expressions, amounts, and currency marks.
fn item_name(line: &str, max_len: usize) -> String {
    // Quantity expressions go first so no stray multiplier sign survives
    // the amount removal.
    let name = patterns::QTY_EXPR.replace_all(line, " ");
    let name = patterns::QTY_UNIT.replace_all(&name, " ");
    let name = patterns::MONEY.replace_all(&name, " ");

    let name = name
        .replace('₺', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let name = name
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, ':' | '-' | ';' | ',' | '.'))
        .to_string();

    if name.chars().count() < 3 {
        return GENERIC_ITEM.to_string();
    }
    name.chars().take(max_len).collect()
}
