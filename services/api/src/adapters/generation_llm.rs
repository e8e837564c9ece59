//! services/api/src/adapters/generation_llm.rs
//!
//! This module contains the adapter for the section-writing LLM.
//! It implements the `TextGenerationService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use docsmith_core::ports::{
    PortError, PortResult, TextGenerationService, GENERATION_ERROR_TEXT,
};
use tracing::{debug, error};

const SYSTEM_INSTRUCTIONS: &str = "You write sections of business documents and slide decks. \
Respond with the section body only, without repeating the section title. \
Use short paragraphs; put list items on their own lines starting with \"- \".";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `TextGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiGenerationAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiGenerationAdapter {
    /// Creates a new `OpenAiGenerationAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// One system message, one user message, a single choice.
    fn build_request(&self, prompt: &str) -> PortResult<CreateChatCompletionRequest> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }

    /// Performs one chat completion round trip. No retries.
    async fn complete(&self, prompt: &str) -> PortResult<String> {
        let request = self.build_request(prompt)?;
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        match response.choices.into_iter().next() {
            Some(choice) => choice.message.content.ok_or_else(|| {
                PortError::Unexpected("Generation LLM response contained no text content.".to_string())
            }),
            None => Err(PortError::Unexpected(
                "Generation LLM returned no choices in its response.".to_string(),
            )),
        }
    }
}

//=========================================================================================
// `TextGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TextGenerationService for OpenAiGenerationAdapter {
    async fn generate(&self, prompt: &str) -> String {
        debug!("Sending {} prompt characters to {}", prompt.len(), self.model);
        match self.complete(prompt).await {
            Ok(text) => text,
            Err(e) => {
                error!("LLM error: {}", e);
                GENERATION_ERROR_TEXT.to_string()
            }
        }
    }
}
