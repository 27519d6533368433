//! Vehicle field extraction: plate, brand/model lexicon match, odometer.

use super::patterns;

/// Find and normalize a registration plate anywhere in the text.
///
/// OCR reads the digit 1 as a capital I often enough that the search runs
/// over a prefolded copy; this costs recall on plates whose letter group
/// genuinely contains an I. Normalization uppercases and removes internal
/// whitespace and is idempotent.
pub fn extract_plate(text: &str) -> Option<String> {
    let folded = text.replace('I', "1");
    let caps = patterns::PLATE.captures(&folded)?;
    Some(normalize_plate(&caps[1]))
}

/// Uppercase and strip whitespace from a plate candidate.
pub fn normalize_plate(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Match a brand from the lexicon and take the following token as model.
///
/// Longer lexicon entries come first in the configured list, so compound
/// names win over their prefixes. The model is the token immediately after
/// the brand mention; a token under three characters yields no model.
pub fn extract_brand_model(text: &str, brands: &[String]) -> (Option<String>, Option<String>) {
    let upper = text.to_uppercase();

    for brand in brands {
        let Some(pos) = upper.find(brand.as_str()) else {
            continue;
        };

        let after = &upper[pos + brand.len()..];
        let model = after
            .split(|c: char| !c.is_alphanumeric() && c != '-')
            .find(|token| !token.is_empty())
            .filter(|token| token.chars().count() >= 3)
            .map(|token| token.chars().take(20).collect::<String>());

        return (Some(brand.clone()), model);
    }

    (None, None)
}

/// Odometer reading in kilometers, grouped digits allowed.
pub fn extract_kilometers(text: &str) -> Option<u32> {
    let caps = patterns::KILOMETERS.captures(text)?;
    let digits: String = caps[1].chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}
