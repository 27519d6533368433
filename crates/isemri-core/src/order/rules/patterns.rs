//! Compiled pattern table shared by the rule-based extractors.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Turkish registration plate: two digits, letter group, digit group.
    /// OCR noise inside the groups is repaired downstream, not here.
    pub static ref PLATE: Regex =
        Regex::new(r"\b(\d{2}\s*[A-ZÇĞİÖŞÜ]{1,3}\s*\d{2,5})\b").unwrap();

    /// Day-first date with any of the three common separators.
    pub static ref DATE: Regex =
        Regex::new(r"\b(\d{1,2}[./\-]\d{1,2}[./\-]\d{2,4})\b").unwrap();

    /// Monetary amount: European thousands-grouped form, or a plain number
    /// with an optional short decimal part. The currency mark is optional.
    pub static ref MONEY: Regex = Regex::new(
        r"(?i)((?:\d{1,3}(?:\.\d{3})+(?:,\d{1,2})?)|(?:\d+(?:[.,]\d{1,2})?))\s*(?:tl|₺)?"
    )
    .unwrap();

    /// Quantity in `N x unit-price` form; captures the count.
    pub static ref QTY_TIMES: Regex = Regex::new(r"(\d+)\s*[xX×*]\s*\d").unwrap();

    /// The whole `N x price` expression, for stripping out of item names.
    pub static ref QTY_EXPR: Regex =
        Regex::new(r"\d+\s*[xX×*]\s*\d+(?:[.,]\d+)?").unwrap();

    /// Quantity with a count word; captures the count.
    pub static ref QTY_UNIT: Regex =
        Regex::new(r"(?i)(\d+)\s*(?:adet|ad\.|pcs|psc|qty)").unwrap();

    /// VAT percentage after a percent sign.
    pub static ref VAT_PERCENT: Regex = Regex::new(r"%\s*(\d+(?:[.,]\d+)?)").unwrap();

    /// Phone number in Turkish national or international notation.
    pub static ref PHONE: Regex = Regex::new(
        r"(?:\+?90[\s\-]?)?\(?0?\d{3}\)?[\s\-]?\d{3}[\s\-]?\d{2}[\s\-]?\d{2}\b"
    )
    .unwrap();

    /// E-mail address.
    pub static ref EMAIL: Regex =
        Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").unwrap();

    /// Odometer reading followed by a km marker.
    pub static ref KILOMETERS: Regex =
        Regex::new(r"(?i)(\d{1,3}(?:[.\s]\d{3})+|\d{3,7})\s*km\b").unwrap();

    /// Customer-name label line; captures the value after the label.
    pub static ref CUSTOMER_LABEL: Regex =
        Regex::new(r"(?i)m[üu][şs]teri(?:\s*(?:ad[ıi]|ismi))?\s*[:\-]\s*(\S.*)").unwrap();
}
