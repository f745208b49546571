//! Language-model test double

use async_trait::async_trait;
use std::sync::Mutex;

use crate::core::{GenerationOptions, LlmProvider, LlmResponse, Message};
use crate::error::{Error, Result};

/// Answers every request with a fixed reply and records what it was sent
pub struct ScriptedProvider {
    reply: String,
    fail: bool,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedProvider {
    pub fn replying(reply: &str) -> Self {
        ScriptedProvider {
            reply: reply.to_string(),
            fail: false,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        ScriptedProvider {
            reply: String::new(),
            fail: true,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Message lists received so far
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn id(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }

    async fn generate(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<LlmResponse> {
        self.seen.lock().unwrap().push(messages.to_vec());
        if self.fail {
            return Err(Error::LanguageModel("scripted failure".into()));
        }
        Ok(LlmResponse {
            model: options
                .model
                .clone()
                .unwrap_or_else(|| self.default_model().to_string()),
            content: self.reply.clone(),
            finish_reason: Some("stop".into()),
            usage: None,
        })
    }
}
