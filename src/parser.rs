//! Best-effort parsing of a model reply into a task result.

use std::sync::OnceLock;

use regex::Regex;

/// Sentinel returned when no answer payload could be extracted.
pub const RESULT_UNPARSEABLE: &str = "<no result could be parsed from the reply>";

fn result_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<result>(.*?)</result>").expect("literal pattern"))
}

fn fenced_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```[a-zA-Z0-9_-]*\n?(.*?)```").expect("literal pattern"))
}

/// Extract the answer payload from a possibly free-form reply.
///
/// Tries, in order: a `<result>` block, a fenced code block, the whole
/// trimmed reply. Replies that do not follow the expected structure still
/// produce the rawest extractable best guess; when nothing usable remains
/// the [`RESULT_UNPARSEABLE`] sentinel is returned. Never errors.
pub fn parse_task_result(reply: &str) -> String {
    if let Some(caps) = result_block_re().captures(reply) {
        let inner = caps[1].trim();
        if inner.is_empty() {
            // An explicit result envelope with nothing in it.
            return RESULT_UNPARSEABLE.to_string();
        }
        return inner.to_string();
    }

    if let Some(caps) = fenced_block_re().captures(reply) {
        let inner = caps[1].trim();
        if !inner.is_empty() {
            return inner.to_string();
        }
    }

    let trimmed = reply.trim();
    if trimmed.is_empty() {
        RESULT_UNPARSEABLE.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_result_block() {
        let reply = "Sure, here you go.\n<result>\n4\n</result>\nAnything else?";
        assert_eq!(parse_task_result(reply), "4");
    }

    #[test]
    fn extracts_fenced_block() {
        let reply = "The answer:\n```\nParis\n```";
        assert_eq!(parse_task_result(reply), "Paris");
    }

    #[test]
    fn extracts_fenced_block_with_language_tag() {
        let reply = "```text\n42\n```";
        assert_eq!(parse_task_result(reply), "42");
    }

    #[test]
    fn free_form_reply_passes_through() {
        assert_eq!(parse_task_result("4"), "4");
        assert_eq!(parse_task_result("  trimmed  "), "trimmed");
    }

    #[test]
    fn empty_reply_is_sentinel() {
        assert_eq!(parse_task_result(""), RESULT_UNPARSEABLE);
        assert_eq!(parse_task_result("   \n  "), RESULT_UNPARSEABLE);
    }

    #[test]
    fn empty_result_block_is_sentinel() {
        assert_eq!(parse_task_result("<result>  </result>"), RESULT_UNPARSEABLE);
    }

    #[test]
    fn result_block_wins_over_fence() {
        let reply = "```\nwrong\n```\n<result>right</result>";
        assert_eq!(parse_task_result(reply), "right");
    }

    #[test]
    fn never_panics_on_odd_input() {
        for reply in ["<result>", "</result><result>", "``` ```", "<>"] {
            let _ = parse_task_result(reply);
        }
    }
}
