// Streaming translation provider
//
// The translation service delivers output as an incremental sequence of text
// fragments. The trait exposes that sequence as a lazy, single-pass stream
// the consumer pulls at its own pace; it cannot be rewound or replayed.

pub mod openai;

use std::pin::Pin;
use async_trait::async_trait;
use futures::Stream;

use crate::config::TranslateConfig;
use crate::error::Result;

/// Lazy, finite sequence of translation text fragments.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// One chat completion request with streaming output.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system_prompt: String,
    pub user_text: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Main trait for translation operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    /// Start a streaming chat completion and return its delta stream
    async fn stream_chat(&self, request: ChatRequest) -> Result<DeltaStream>;
}

/// Factory for creating translator instances
pub struct TranslatorFactory;

impl TranslatorFactory {
    pub fn create(config: TranslateConfig) -> Result<Box<dyn Translator>> {
        Ok(Box::new(openai::OpenAiTranslator::new(config)?))
    }
}

/// Instruction given to the translation model. The output must be the direct
/// translation only, with no commentary.
pub fn translation_prompt(target_language: &str) -> String {
    format!(
        "You are an expert multilingual translator. Translate the following English text to {}. \
         Provide only the direct translation, without any additional commentary or explanations. \
         Be concise and accurate.",
        target_language
    )
}
