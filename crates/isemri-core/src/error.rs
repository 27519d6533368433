//! Error types for the isemri-core library.
//!
//! Stage-local degradation (an OCR attempt that found nothing, a generation
//! call that timed out) is expressed in return values, not errors; the types
//! here surface only contract-level failures the caller must know about.

use thiserror::Error;

/// Main error type for the isemri library.
#[derive(Error, Debug)]
pub enum IsemriError {
    /// Source document decoding error.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Generation-service error.
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to decoding source documents.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The declared source kind is not supported.
    #[error("unsupported source kind: {0}")]
    UnsupportedKind(String),

    /// Failed to decode the image bytes.
    #[error("failed to decode image: {0}")]
    Image(String),

    /// Failed to parse the PDF document.
    #[error("failed to parse PDF: {0}")]
    Pdf(String),

    /// The document is empty or has no pages.
    #[error("document has no pages")]
    NoPages,
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to initialize the recognition engine.
    #[error("engine initialization failed: {0}")]
    EngineInit(String),

    /// A recognition pass failed inside the engine.
    #[error("recognition failed: {0}")]
    Recognition(String),

    /// Image preprocessing failed.
    #[error("preprocessing failed: {0}")]
    Preprocessing(String),
}

/// Errors related to the generation-service call.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// The request could not be sent or timed out.
    #[error("request failed: {0}")]
    Request(String),

    /// The service answered with a non-success status.
    #[error("service returned status {0}")]
    Status(u16),

    /// The response body could not be read.
    #[error("unreadable response body")]
    Unreadable,
}

/// Result type for the isemri library.
pub type Result<T> = std::result::Result<T, IsemriError>;
