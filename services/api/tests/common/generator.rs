//! Scripted `TextGenerationService` that records every prompt it receives.

use async_trait::async_trait;
use docsmith_core::ports::{TextGenerationService, GENERATION_ERROR_TEXT};
use std::sync::Mutex;

pub struct ScriptedGenerator {
    reply: Mutex<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Mutex::new(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Behaves like the real adapter when the upstream call fails.
    pub fn failing() -> Self {
        Self::replying(GENERATION_ERROR_TEXT)
    }

    pub fn set_reply(&self, text: &str) {
        *self.reply.lock().unwrap() = text.to_string();
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerationService for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> String {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.lock().unwrap().clone()
    }
}
