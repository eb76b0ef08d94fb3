//! Bridge from rig-core completion models to the crate's `LlmProvider`.

use async_trait::async_trait;
use rig::completion::CompletionModel;
use rig::message::{AssistantContent, Message};

use crate::error::LlmError;
use crate::llm::provider::{
    CompletionRequest, CompletionResponse, LlmProvider, Role, ToolInvocation,
};

/// Adapts any rig `CompletionModel` to the `LlmProvider` trait.
pub struct RigAdapter<M> {
    model: M,
    model_name: String,
}

impl<M> RigAdapter<M> {
    pub fn new(model: M, model_name: &str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
        }
    }
}

#[async_trait]
impl<M> LlmProvider for RigAdapter<M>
where
    M: CompletionModel + Send + Sync,
{
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        // System messages become the preamble; the final message is the
        // prompt and everything before it is chat history.
        let mut preamble: Option<String> = None;
        let mut history: Vec<Message> = Vec::new();

        for message in &request.messages {
            match message.role {
                Role::System => {
                    preamble = Some(match preamble.take() {
                        Some(existing) => format!("{existing}\n\n{}", message.content),
                        None => message.content.clone(),
                    });
                }
                Role::User => history.push(Message::user(message.content.clone())),
                Role::Assistant => history.push(Message::assistant(message.content.clone())),
            }
        }

        let Some(prompt) = history.pop() else {
            return Err(LlmError::InvalidResponse {
                provider: self.model_name.clone(),
                reason: "completion request contained no messages".to_string(),
            });
        };

        let mut builder = self.model.completion_request(prompt).messages(history);
        if let Some(preamble) = preamble {
            builder = builder.preamble(preamble);
        }

        let response = builder.send().await.map_err(|e| LlmError::RequestFailed {
            provider: self.model_name.clone(),
            reason: e.to_string(),
        })?;

        let mut content = String::new();
        let mut tool_calls = Vec::new();
        for choice in response.choice.iter() {
            match choice {
                AssistantContent::Text(text) => {
                    if !content.is_empty() {
                        content.push('\n');
                    }
                    content.push_str(&text.text);
                }
                AssistantContent::ToolCall(call) => {
                    tool_calls.push(ToolInvocation {
                        name: call.function.name.clone(),
                        arguments: call.function.arguments.clone(),
                    });
                }
                _ => {}
            }
        }

        Ok(CompletionResponse {
            content,
            tool_calls,
            input_tokens: response.usage.input_tokens as u32,
            output_tokens: response.usage.output_tokens as u32,
        })
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
