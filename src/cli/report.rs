//! Run reporting
//!
//! Progress lines while a run is in flight and the final chart output.

use std::fs;
use std::path::Path;

use crate::agent::{RunOutcome, Stage, StepObserver};
use crate::core::{Message, Result, Role};

/// Observer that prints one line per appended message to stderr
pub fn progress_observer() -> StepObserver {
    Box::new(|stage: Stage, msg: &Message| {
        if let Some(line) = progress_line(stage, msg) {
            eprintln!("{}", line);
        }
    })
}

/// Describe one appended message, or `None` for messages not worth showing
pub fn progress_line(stage: Stage, msg: &Message) -> Option<String> {
    match msg.role {
        Role::Ai if msg.has_tool_calls() => Some(
            msg.tool_calls
                .iter()
                .map(|call| match call.get_string("query") {
                    Some(query) => format!("[{}] {}: {}", stage, call.name, query),
                    None => format!("[{}] {}", stage, call.name),
                })
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        Role::Tool => {
            let first = msg.content.lines().next().unwrap_or("");
            Some(format!("[{}]   -> {}", stage, truncate(first, 100)))
        }
        Role::Ai => Some(format!(
            "[{}] answered ({} chars)",
            stage,
            msg.content.chars().count()
        )),
        Role::Human => Some(format!("[{}] asked to revise: {}", stage, truncate(&msg.content, 100))),
        Role::System => None,
    }
}

/// Print the final chart document and a short summary
pub fn print_outcome(outcome: &RunOutcome) {
    println!("{}", outcome.chart_json());
    match outcome.document() {
        Ok(doc) => eprintln!("\n{} cycle(s):\n{}", outcome.cycles, doc.summary()),
        Err(e) => eprintln!(
            "\n{} cycle(s); output is valid JSON but not a chart document: {}",
            outcome.cycles, e
        ),
    }
}

/// Write the final chart JSON to `path`, pretty-printed
pub fn write_output(outcome: &RunOutcome, path: &Path) -> Result<()> {
    let value: serde_json::Value = serde_json::from_str(outcome.chart_json())?;
    fs::write(path, serde_json::to_string_pretty(&value)?)?;
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ToolCall;

    #[test]
    fn test_search_call_line() {
        let msg = Message::ai_with_tools(
            "",
            vec![ToolCall::new("c1", "tavily_search", serde_json::json!({"query": "edm streams"}))],
        );
        assert_eq!(
            progress_line(Stage::Research, &msg).unwrap(),
            "[RESEARCH] tavily_search: edm streams"
        );
    }

    #[test]
    fn test_tool_result_line_is_truncated() {
        let msg = Message::tool("c1", "x".repeat(300));
        let line = progress_line(Stage::Research, &msg).unwrap();
        assert!(line.ends_with("..."));
        assert!(line.len() < 130);
    }

    #[test]
    fn test_system_messages_are_hidden() {
        assert!(progress_line(Stage::Chart, &Message::system("prompt")).is_none());
    }
}
