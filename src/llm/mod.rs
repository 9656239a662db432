//! Natural-language services: parameter extraction and knowledge answers.

pub mod brian;

use async_trait::async_trait;

use crate::agent::IntentInput;
use crate::error::ExtractionError;

pub use brian::{BrianClient, ExtractorConfig};

/// Turns a free-text instruction into raw intent fields.
#[async_trait]
pub trait IntentExtractor: Send + Sync {
    async fn extract(&self, prompt: &str) -> Result<IntentInput, ExtractionError>;
}

/// Answers general questions for `/ask`.
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// `Ok(None)` means the service had no answer.
    async fn ask(&self, question: &str) -> Result<Option<String>, ExtractionError>;
}
