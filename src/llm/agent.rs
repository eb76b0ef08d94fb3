//! Stateful conversational agent.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::LlmError;
use crate::llm::provider::{ChatMessage, CompletionRequest, CompletionResponse, LlmProvider};

/// A conversational agent: one system prompt, one model, accumulated
/// message history. History survives across `step` calls until `reset`.
pub struct ChatAgent {
    system_prompt: String,
    llm: Arc<dyn LlmProvider>,
    history: Mutex<Vec<ChatMessage>>,
}

impl ChatAgent {
    pub fn new(system_prompt: impl Into<String>, llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            llm,
            history: Mutex::new(Vec::new()),
        }
    }

    /// Perform one conversational step: append the outbound message, submit
    /// the full conversation, record the assistant reply.
    ///
    /// The internal lock is held across the model call, so concurrent
    /// callers are serialized and the history is never mutated by two calls
    /// at once.
    pub async fn step(&self, content: &str) -> Result<CompletionResponse, LlmError> {
        let mut history = self.history.lock().await;
        history.push(ChatMessage::user(content));

        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(self.system_prompt.clone()));
        messages.extend(history.iter().cloned());

        let response = match self.llm.complete(CompletionRequest::new(messages)).await {
            Ok(response) => response,
            Err(e) => {
                // A failed call leaves no trace in the conversation.
                history.pop();
                return Err(e);
            }
        };

        history.push(ChatMessage::assistant(response.content.clone()));
        Ok(response)
    }

    /// Clear conversational memory back to the initial configuration.
    /// Idempotent.
    pub async fn reset(&self) {
        self.history.lock().await.clear();
    }

    /// Number of messages currently held in the conversation.
    pub async fn history_len(&self) -> usize {
        self.history.lock().await.len()
    }
}
