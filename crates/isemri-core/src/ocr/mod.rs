//! OCR: recognition-engine abstraction and image preparation.

mod adapter;
mod prepare;
#[cfg(feature = "tesseract")]
mod tesseract;

pub use adapter::{LangSet, OcrAdapter, PageSegMode, RecognitionEngine};
#[cfg(test)]
pub(crate) use adapter::testing;
pub use prepare::ImagePreparer;
#[cfg(feature = "tesseract")]
pub use tesseract::TesseractEngine;

/// Human-visible marker joining per-page OCR output into one raw text.
pub const PAGE_BREAK: &str = "---PAGE BREAK---";

/// Join per-page text chunks with the page-break marker.
pub fn join_pages(chunks: &[String]) -> String {
    let separator = format!("\n\n{}\n\n", PAGE_BREAK);
    chunks.join(separator.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_pages_marker_is_visible() {
        let joined = join_pages(&["first".to_string(), "second".to_string()]);
        assert!(joined.contains(PAGE_BREAK));
        assert!(joined.starts_with("first"));
        assert!(joined.ends_with("second"));
    }

    #[test]
    fn test_join_single_page_has_no_marker() {
        let joined = join_pages(&["only".to_string()]);
        assert_eq!(joined, "only");
    }
}
