//! Model-assisted extraction through a local generation service.
//!
//! The service sees the raw OCR text and answers with a JSON draft; the
//! normalization layer then repairs the loose typing models produce. Any
//! failure along this path is non-fatal and hands control back to the
//! deterministic parser.

mod client;
mod normalize;
mod prompt;

pub use client::OllamaClient;
pub use normalize::draft_from_response;
pub use prompt::build_prompt;

use crate::error::GenerationError;

/// A text-generation backend.
pub trait GenerationService {
    /// Send one prompt and return the raw completion text.
    fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Identifier of the model configuration, recorded in draft provenance.
    fn model_id(&self) -> &str;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// A generator answering every prompt with one canned reply.
    pub struct ScriptedGenerator {
        pub reply: Result<String, GenerationError>,
        pub model: String,
    }

    impl ScriptedGenerator {
        pub fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                model: "scripted".to_string(),
            }
        }

        pub fn failing() -> Self {
            Self {
                reply: Err(GenerationError::Status(500)),
                model: "scripted".to_string(),
            }
        }
    }

    impl GenerationService for ScriptedGenerator {
        fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(GenerationError::Status(code)) => Err(GenerationError::Status(*code)),
                Err(_) => Err(GenerationError::Unreadable),
            }
        }

        fn model_id(&self) -> &str {
            &self.model
        }
    }
}
