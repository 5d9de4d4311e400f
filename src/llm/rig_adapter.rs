//! Bridge from rig-core's `CompletionModel` trait to our `LlmProvider` trait.

use async_trait::async_trait;
use rig::completion::{CompletionModel, Message};
use rig::message::AssistantContent;

use crate::error::LlmError;
use crate::llm::provider::{
    ChatMessage, ChatRole, CompletionRequest, CompletionResponse, LlmProvider,
};

/// Adapter wrapping a rig completion model.
pub struct RigAdapter<M: CompletionModel> {
    model: M,
    model_name: String,
}

impl<M: CompletionModel> RigAdapter<M> {
    pub fn new(model: M, model_name: &str) -> Self {
        Self { model, model_name: model_name.to_string() }
    }
}

#[async_trait]
impl<M: CompletionModel> LlmProvider for RigAdapter<M> {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        // System messages become the preamble; the last user message is the
        // prompt, any earlier ones become history.
        let mut preamble = String::new();
        let mut history: Vec<Message> = Vec::new();
        for message in &request.messages {
            match message.role {
                ChatRole::System => {
                    if !preamble.is_empty() {
                        preamble.push('\n');
                    }
                    preamble.push_str(&message.content);
                }
                ChatRole::User => history.push(Message::user(message.content.clone())),
            }
        }

        let prompt = history.pop().ok_or_else(|| LlmError::RequestFailed {
            provider: self.model_name.clone(),
            reason: "completion request contains no user message".to_string(),
        })?;

        let mut builder = self.model.completion_request(prompt);
        if !preamble.is_empty() {
            builder = builder.preamble(preamble);
        }
        if !history.is_empty() {
            builder = builder.messages(history);
        }
        if let Some(max_tokens) = request.max_tokens {
            builder = builder.max_tokens(max_tokens as u64);
        }
        if let Some(temperature) = request.temperature {
            builder = builder.temperature(temperature as f64);
        }

        let response = builder.send().await.map_err(|e| LlmError::RequestFailed {
            provider: self.model_name.clone(),
            reason: e.to_string(),
        })?;

        let input_tokens = response.usage.input_tokens as u32;
        let output_tokens = response.usage.output_tokens as u32;

        let content = response
            .choice
            .into_iter()
            .filter_map(|part| match part {
                AssistantContent::Text(text) => Some(text.text),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("");

        if content.is_empty() {
            return Err(LlmError::InvalidResponse {
                provider: self.model_name.clone(),
                reason: "completion contained no text content".to_string(),
            });
        }

        Ok(CompletionResponse { content, input_tokens, output_tokens })
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
