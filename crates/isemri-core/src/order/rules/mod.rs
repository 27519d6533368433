//! Deterministic extraction rules: patterns and field-specific parsers.

pub(crate) mod dates;
pub(crate) mod items;
pub(crate) mod money;
pub(crate) mod patterns;
pub(crate) mod vehicle;

pub use dates::parse_date;
pub use money::parse_money;
