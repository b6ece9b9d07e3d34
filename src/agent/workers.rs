//! The two named workers of the loop
//!
//! The research worker gathers facts; the chart worker turns them into a
//! chart document or asks for more.

use crate::agent::log::MessageLog;
use crate::agent::prompts::revision_request;
use crate::agent::signal::CompletionSignal;
use crate::agent::worker::Worker;
use crate::core::{ChartError, Message, Result};
use crate::tools::{JsonValidator, Validation};

/// Research node
pub struct ResearchWorker {
    worker: Worker,
}

impl ResearchWorker {
    pub fn new(worker: Worker) -> Self {
        Self { worker }
    }

    /// Research the task given everything in the log so far
    ///
    /// Search failures reach the model as failed tool results, so this only
    /// errors when the model itself fails.
    pub async fn run(&self, log: &MessageLog) -> Result<Vec<Message>> {
        self.worker.respond(log).await
    }
}

/// Chart node
pub struct ChartWorker {
    worker: Worker,
    validator: JsonValidator,
    signal: CompletionSignal,
    max_revisions: usize,
}

impl ChartWorker {
    pub fn new(worker: Worker, signal: CompletionSignal, max_revisions: usize) -> Self {
        Self {
            worker,
            validator: JsonValidator::new(),
            signal,
            max_revisions,
        }
    }

    /// Produce a chart document or a request for more research
    ///
    /// A final answer without the marker must parse as JSON. When it does
    /// not, the validator's reason is fed back as a human message and the
    /// model is asked again, up to `max_revisions` times.
    pub async fn run(&self, log: &MessageLog) -> Result<Vec<Message>> {
        let mut produced: Vec<Message> = Vec::new();
        let mut revisions = 0;

        loop {
            let view = log.append(produced.iter().cloned());
            let mut answer = self.worker.respond(&view).await?;

            let Some(last) = answer.last_mut() else {
                return Err(ChartError::EmptyResponse(self.worker.model().model.clone()));
            };

            if self.signal.needs_more_research(&last.content) {
                tracing::info!("Chart worker requested more research");
                produced.extend(answer);
                return Ok(produced);
            }

            if let Some(inner) = strip_code_fence(&last.content) {
                last.content = inner;
            }

            match self.validator.validate(&last.content) {
                Validation::Valid => {
                    produced.extend(answer);
                    return Ok(produced);
                }
                Validation::Invalid(reason) => {
                    produced.extend(answer);
                    if revisions >= self.max_revisions {
                        return Err(ChartError::InvalidChartOutput {
                            revisions,
                            reason,
                        });
                    }
                    revisions += 1;
                    tracing::warn!(revision = revisions, "Chart answer is not valid JSON: {}", reason);
                    produced.push(Message::human(revision_request(&reason)));
                }
            }
        }
    }
}

/// Unwrap an answer that is entirely one fenced code block
fn strip_code_fence(text: &str) -> Option<String> {
    let trimmed = text.trim();
    let body = trimmed.strip_prefix("```")?.strip_suffix("```")?;
    // Drop the info string, e.g. "json"
    let (_, code) = body.split_once('\n')?;
    Some(code.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fence() {
        let text = "```json\n{\"chartsArray\": []}\n```";
        assert_eq!(strip_code_fence(text).as_deref(), Some("{\"chartsArray\": []}"));
    }

    #[test]
    fn test_strip_bare_fence() {
        assert_eq!(strip_code_fence("```\n[1]\n```\n").as_deref(), Some("[1]"));
    }

    #[test]
    fn test_unfenced_text_is_left_alone() {
        assert_eq!(strip_code_fence("{\"a\": 1}"), None);
        assert_eq!(strip_code_fence("Here you go:\n```json\n{}\n```"), None);
    }
}
