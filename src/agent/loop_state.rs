//! Loop state management
//!
//! The orchestration loop as an explicit state machine: a stage tag, a pure
//! transition function, and the run state threaded through every step.

use crate::agent::log::MessageLog;
use crate::agent::signal::CompletionSignal;
use crate::core::Message;

/// Node the loop is at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Research worker runs next
    Research,
    /// Chart worker runs next
    Chart,
    /// Terminal
    End,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Research => write!(f, "RESEARCH"),
            Stage::Chart => write!(f, "CHART"),
            Stage::End => write!(f, "END"),
        }
    }
}

/// Next stage after `stage` has appended `latest`
///
/// Research always hands over to Chart. Chart routes back to Research iff
/// its latest message carries the marker, otherwise the run ends.
pub fn next_stage(stage: Stage, latest: Option<&Message>, signal: &CompletionSignal) -> Stage {
    match stage {
        Stage::Research => Stage::Chart,
        Stage::Chart => match latest {
            Some(msg) if signal.needs_more_research(&msg.content) => Stage::Research,
            _ => Stage::End,
        },
        Stage::End => Stage::End,
    }
}

/// State threaded through the loop
#[derive(Debug, Clone)]
pub struct RunState {
    /// Everything appended so far
    pub log: MessageLog,
    /// Stage that runs next
    pub stage: Stage,
    /// Completed research-chart cycles
    pub cycles: usize,
    /// Cycle cap; `None` runs until the chart worker is satisfied
    pub max_cycles: Option<usize>,
}

impl RunState {
    /// Start a run from the task text
    pub fn new(task: impl Into<String>, max_cycles: Option<usize>) -> Self {
        Self {
            log: MessageLog::seeded(task),
            stage: Stage::Research,
            cycles: 0,
            max_cycles,
        }
    }

    /// Check if the loop should continue
    pub fn should_continue(&self) -> bool {
        self.stage != Stage::End
    }

    /// Whether another research pass would exceed the cycle cap
    pub fn cycle_cap_reached(&self) -> bool {
        self.max_cycles.is_some_and(|max| self.cycles >= max)
    }

    /// Append a worker's messages and advance the stage
    pub fn advance(&mut self, produced: Vec<Message>, signal: &CompletionSignal) -> Stage {
        self.log = self.log.append(produced);
        if self.stage == Stage::Chart {
            self.cycles += 1;
        }
        self.stage = next_stage(self.stage, self.log.last(), signal);
        self.stage
    }
}
