//! Deterministic work-order extraction: rules, ROI boxes, and the parser.

pub mod parser;
pub mod roi;
pub mod rules;

pub use parser::RuleBasedParser;
pub use roi::{RoiExtractor, RoiFields};
