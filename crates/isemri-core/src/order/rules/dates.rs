//! Day-first date parsing with a fixed format ladder.

use chrono::NaiveDate;

/// Formats tried in order. Day-first throughout; two-digit years map to
/// 20xx via chrono's `%y` pivot.
const FORMATS: [&str; 5] = [
    "%d.%m.%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%y",
    "%d/%m/%y",
];

/// Parse a day-first date token. Returns `None` for anything that fails
/// every format, including impossible calendar dates.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}
