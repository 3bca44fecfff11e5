//! External generative-text service client and reply interpretation.

pub mod client;
pub mod response;

use crate::types::Result;
use async_trait::async_trait;

pub use client::{LlmClient, LlmProvider, DEFAULT_MODEL};
pub use response::strip_code_fences;

/// A text-completion backend.
///
/// The single seam the pipeline needs from an external model; tests substitute
/// a scripted implementation.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Request one text completion for `prompt`.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
