//! Prompt rendering for task processing.

use crate::task::Task;

/// Render the single outbound request for processing a task.
///
/// Fixed template with two slots, `content` and `dependency_task_info`.
/// Dependency info must already be pre-rendered to plain text (see
/// [`render_dependencies`]), so there is no slot-injection ambiguity.
pub fn render_process_task_prompt(content: &str, dependency_task_info: &str) -> String {
    format!(
        r#"You need to process one given task.

The content of the task:

==============================
{content}
==============================

The content and results of the tasks it depends on, possibly empty:

==============================
{dependency_task_info}
==============================

Return the final result of the task in exactly this format:

<result>
your final result here
</result>"#
    )
}

/// Render the ordered dependency tasks into a plain-text summary.
///
/// Total over its input: a dependency with no usable result (for example
/// one that failed) renders with an empty result line instead of erroring.
pub fn render_dependencies(dependencies: &[Task]) -> String {
    let mut out = String::new();
    for task in dependencies {
        out.push_str(&format!(
            "Task {} [{}]:\n  content: {}\n  result: {}\n",
            task.id,
            task.state,
            task.content,
            task.result.as_deref().unwrap_or(""),
        ));
    }
    out
}
