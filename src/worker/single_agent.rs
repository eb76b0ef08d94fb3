//! A worker backed by a single conversational agent.

use async_trait::async_trait;

use crate::llm::ChatAgent;
use crate::parser::{RESULT_UNPARSEABLE, parse_task_result};
use crate::prompt::{render_dependencies, render_process_task_prompt};
use crate::task::{Task, TaskState};
use crate::worker::Worker;

/// A worker that renders a task plus its dependency results into a single
/// request, submits it to its owned agent, and classifies the reply.
pub struct SingleAgentWorker {
    description: String,
    agent: ChatAgent,
}

impl SingleAgentWorker {
    pub fn new(description: impl Into<String>, agent: ChatAgent) -> Self {
        Self {
            description: description.into(),
            agent,
        }
    }
}

#[async_trait]
impl Worker for SingleAgentWorker {
    fn description(&self) -> &str {
        &self.description
    }

    async fn process(&self, task: &mut Task, dependencies: &[Task]) -> TaskState {
        let dependency_task_info = render_dependencies(dependencies);
        let prompt = render_process_task_prompt(&task.content, &dependency_task_info);

        let response = match self.agent.step(&prompt).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    worker = %self.description,
                    task_id = %task.id,
                    error = %e,
                    "failed to process task"
                );
                return TaskState::Failed;
            }
        };

        for call in &response.tool_calls {
            tracing::debug!(
                worker = %self.description,
                task_id = %task.id,
                tool = %call.name,
                arguments = %call.arguments,
                "tool invoked while processing"
            );
        }

        let result = parse_task_result(&response.content);
        if result == RESULT_UNPARSEABLE {
            tracing::error!(
                worker = %self.description,
                task_id = %task.id,
                "reply contained no extractable result"
            );
            return TaskState::Failed;
        }

        tracing::info!(
            worker = %self.description,
            task_id = %task.id,
            tool_calls = response.tool_calls.len(),
            result = %result,
            "task processed"
        );
        task.result = Some(result);
        TaskState::Done
    }

    async fn reset(&self) {
        self.agent.reset().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use crate::error::LlmError;
    use crate::llm::{CompletionRequest, CompletionResponse, LlmProvider, ToolInvocation};

    /// Provider with a scripted queue of replies. Records every prompt.
    struct ScriptedProvider {
        replies: Mutex<VecDeque<Result<CompletionResponse, LlmError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Result<CompletionResponse, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn text(reply: &str) -> Result<CompletionResponse, LlmError> {
            Ok(CompletionResponse {
                content: reply.to_string(),
                ..Default::default()
            })
        }

        fn connection_error() -> Result<CompletionResponse, LlmError> {
            Err(LlmError::RequestFailed {
                provider: "mock".to_string(),
                reason: "connection reset by peer".to_string(),
            })
        }

        fn call_count(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            let prompt = request
                .messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            self.prompts.lock().unwrap().push(prompt);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Self::text("unscripted"))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn worker_with(provider: Arc<ScriptedProvider>) -> SingleAgentWorker {
        let agent = ChatAgent::new("You solve tasks", provider);
        SingleAgentWorker::new("test worker", agent)
    }

    #[tokio::test]
    async fn parseable_reply_is_done_with_result() {
        let provider = ScriptedProvider::new(vec![ScriptedProvider::text("4")]);
        let worker = worker_with(provider.clone());

        let mut task = Task::with_id("t1", "2+2");
        let state = worker.process(&mut task, &[]).await;

        assert_eq!(state, TaskState::Done);
        assert_eq!(task.result.as_deref(), Some("4"));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn dependency_context_reaches_the_prompt() {
        let provider = ScriptedProvider::new(vec![ScriptedProvider::text(
            "<result>Go for a picnic</result>",
        )]);
        let worker = worker_with(provider.clone());

        let mut dep = Task::with_id("d1", "check the weather");
        dep.transition_to(TaskState::Running).unwrap();
        dep.result = Some("Paris weather: sunny".to_string());
        dep.transition_to(TaskState::Done).unwrap();

        let mut task = Task::with_id("t1", "Plan outdoor activity").depends_on("d1");
        let state = worker.process(&mut task, &[dep]).await;

        assert_eq!(state, TaskState::Done);
        assert_eq!(task.result.as_deref(), Some("Go for a picnic"));

        let prompts = provider.prompts.lock().unwrap();
        assert!(prompts[0].contains("Plan outdoor activity"));
        assert!(prompts[0].contains("d1"));
        assert!(prompts[0].contains("check the weather"));
        assert!(prompts[0].contains("Paris weather: sunny"));
    }

    #[tokio::test]
    async fn collaborator_failure_is_contained() {
        let provider = ScriptedProvider::new(vec![ScriptedProvider::connection_error()]);
        let worker = worker_with(provider.clone());

        let mut task = Task::with_id("t1", "2+2");
        let state = worker.process(&mut task, &[]).await;

        assert_eq!(state, TaskState::Failed);
        assert!(task.result.is_none());
    }

    #[tokio::test]
    async fn unparseable_reply_is_failed_without_result() {
        let provider = ScriptedProvider::new(vec![ScriptedProvider::text("")]);
        let worker = worker_with(provider);

        let mut task = Task::with_id("t1", "2+2");
        let state = worker.process(&mut task, &[]).await;

        assert_eq!(state, TaskState::Failed);
        assert!(task.result.is_none());
    }

    #[tokio::test]
    async fn tool_invocations_do_not_disturb_the_result() {
        let provider = ScriptedProvider::new(vec![Ok(CompletionResponse {
            content: "<result>sunny</result>".to_string(),
            tool_calls: vec![ToolInvocation {
                name: "get_weather".to_string(),
                arguments: serde_json::json!({"city": "Paris"}),
            }],
            ..Default::default()
        })]);
        let worker = worker_with(provider);

        let mut task = Task::with_id("t1", "weather in Paris");
        let state = worker.process(&mut task, &[]).await;

        assert_eq!(state, TaskState::Done);
        assert_eq!(task.result.as_deref(), Some("sunny"));
    }

    #[tokio::test]
    async fn reset_is_idempotent_and_preserves_completed_tasks() {
        let provider = ScriptedProvider::new(vec![ScriptedProvider::text("4")]);
        let worker = worker_with(provider);

        let mut task = Task::with_id("t1", "2+2");
        task.transition_to(TaskState::Running).unwrap();
        let state = worker.process(&mut task, &[]).await;
        task.transition_to(state).unwrap();

        worker.reset().await;
        worker.reset().await;

        assert_eq!(task.state, TaskState::Done);
        assert_eq!(task.result.as_deref(), Some("4"));
    }
}
