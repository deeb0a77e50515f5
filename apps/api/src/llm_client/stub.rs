use std::sync::Mutex;

use async_trait::async_trait;

use super::{LlmError, TextGenerator};

/// Test generator: returns a fixed reply (or always fails) and records prompts.
pub struct CannedGenerator {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl CannedGenerator {
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            reply: Some(text.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn generate(&self, prompt: &str, _max_tokens: u32) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Some(text) => Ok(text.clone()),
            None => Err(LlmError::Api {
                status: 503,
                message: "generator unavailable".to_string(),
            }),
        }
    }
}
