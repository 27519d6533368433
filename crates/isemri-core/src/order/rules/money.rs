//! Monetary amount parsing for Turkish-convention numbers.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse a money token into a decimal amount.
///
/// Turkish documents write `1.234,56`; OCR sometimes yields the anglicized
/// `1,234.56` or a plain `450`. Both separators present means the last one
/// is the decimal mark; a lone comma is always a decimal comma.
pub fn parse_money(raw: &str) -> Decimal {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '₺')
        .collect();
    let cleaned = cleaned
        .trim_end_matches(|c: char| c.is_alphabetic())
        .to_string();

    let has_dot = cleaned.contains('.');
    let has_comma = cleaned.contains(',');

    let normalized = match (has_dot, has_comma) {
        (true, true) => {
            // The later separator is the decimal mark.
            let last_dot = cleaned.rfind('.').unwrap_or(0);
            let last_comma = cleaned.rfind(',').unwrap_or(0);
            if last_comma > last_dot {
                cleaned.replace('.', "").replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
        (false, true) => cleaned.replace(',', "."),
        _ => cleaned,
    };

    Decimal::from_str(&normalized).unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_turkish_convention() {
        assert_eq!(parse_money("1.234,56"), Decimal::new(123456, 2));
        assert_eq!(parse_money("300,00"), Decimal::new(30000, 2));
    }

    #[test]
    fn test_anglicized_convention() {
        assert_eq!(parse_money("1,234.56"), Decimal::new(123456, 2));
    }

    #[test]
    fn test_plain_and_currency_suffixes() {
        assert_eq!(parse_money("450"), Decimal::new(450, 0));
        assert_eq!(parse_money("450 TL"), Decimal::new(450, 0));
        assert_eq!(parse_money("450 ₺"), Decimal::new(450, 0));
    }

    #[test]
    fn test_unparsable_is_zero() {
        assert_eq!(parse_money("abc"), Decimal::ZERO);
        assert_eq!(parse_money(""), Decimal::ZERO);
    }
}
