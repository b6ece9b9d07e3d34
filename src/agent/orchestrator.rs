//! Pipeline orchestrator
//!
//! Drives the research and chart workers around the loop
//! RESEARCH → CHART → (RESEARCH | END) until the chart worker stops asking
//! for more information.

use std::sync::Arc;

use crate::agent::log::MessageLog;
use crate::agent::loop_state::{RunState, Stage};
use crate::agent::prompts::{chart_prompt, RESEARCH_PROMPT};
use crate::agent::signal::CompletionSignal;
use crate::agent::worker::{Worker, WorkerRole};
use crate::agent::workers::{ChartWorker, ResearchWorker};
use crate::core::{ChartDocument, ChartError, Config, Message, Result, ToolCategory};
use crate::llm::{create_provider, LLMProvider};
use crate::tools::{SearchBackend, TavilySearch, ToolRegistry};

/// Callback invoked for every message a worker appends
pub type StepObserver = Box<dyn Fn(Stage, &Message) + Send + Sync>;

/// Tavily search when TAVILY_API_KEY is configured, otherwise none
pub fn search_backend(config: &Config) -> Result<Option<Arc<dyn SearchBackend>>> {
    if config.search.api_key.is_none() {
        tracing::warn!("TAVILY_API_KEY is not set; research runs without web search");
        return Ok(None);
    }
    Ok(Some(Arc::new(TavilySearch::from_config(&config.search)?)))
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Full log; the last message is the chart document
    pub log: MessageLog,
    /// Research-chart cycles the run took
    pub cycles: usize,
}

impl RunOutcome {
    /// The final message of the run
    pub fn final_message(&self) -> Option<&Message> {
        self.log.last()
    }

    /// The chart document text
    pub fn chart_json(&self) -> &str {
        self.final_message().map(|m| m.content.as_str()).unwrap_or("")
    }

    /// Parse the chart document into typed charts
    pub fn document(&self) -> Result<ChartDocument> {
        ChartDocument::parse(self.chart_json())
    }
}

/// The two-worker loop
pub struct ChartPipeline {
    research: ResearchWorker,
    chart: ChartWorker,
    signal: CompletionSignal,
    max_cycles: Option<usize>,
    observer: Option<StepObserver>,
}

impl ChartPipeline {
    /// Build the pipeline from configuration, with the configured provider
    /// and, when a key is set, Tavily search
    pub fn from_config(config: &Config) -> Result<Self> {
        let llm = create_provider(config)?;
        Self::new(config, llm.clone(), llm, search_backend(config)?)
    }

    /// Build the pipeline from explicit collaborators
    ///
    /// Each worker gets its own provider; pass the same one twice to share.
    /// Without a search backend the research worker answers from the log alone.
    pub fn new(
        config: &Config,
        research_llm: Arc<dyn LLMProvider>,
        chart_llm: Arc<dyn LLMProvider>,
        search: Option<Arc<dyn SearchBackend>>,
    ) -> Result<Self> {
        let signal = CompletionSignal::new(config.pipeline.sentinel.clone());

        let tools = Arc::new(match search {
            Some(backend) => ToolRegistry::with_search(backend),
            None => ToolRegistry::new(),
        });

        let research = Worker::builder(WorkerRole::Research)
            .system_prompt(RESEARCH_PROMPT)
            .llm(research_llm)
            .model(config.models.research.clone())
            .tools(tools.clone())
            .tool_category(ToolCategory::Search)
            .max_tool_turns(config.pipeline.max_tool_turns)
            .build()?;

        let chart = Worker::builder(WorkerRole::Chart)
            .system_prompt(chart_prompt(&signal))
            .llm(chart_llm)
            .model(config.models.chart.clone())
            .tools(tools)
            .tool_category(ToolCategory::Validation)
            .max_tool_turns(config.pipeline.max_tool_turns)
            .build()?;

        Ok(Self {
            research: ResearchWorker::new(research),
            chart: ChartWorker::new(chart, signal.clone(), config.pipeline.max_revisions),
            signal,
            max_cycles: config.pipeline.max_cycles,
            observer: None,
        })
    }

    /// Report every appended message to `observer`
    pub fn with_observer(mut self, observer: StepObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Override the cycle cap; `None` means unbounded
    pub fn with_max_cycles(mut self, max_cycles: Option<usize>) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    /// Current cycle cap
    pub fn max_cycles(&self) -> Option<usize> {
        self.max_cycles
    }

    /// Run the loop for one task
    ///
    /// Any worker failure aborts the run. A chart worker that is still asking
    /// for research when the cycle cap is hit yields `CycleLimitExceeded`.
    pub async fn run(&self, task: &str) -> Result<RunOutcome> {
        let mut state = RunState::new(task, self.max_cycles);

        tracing::info!(max_cycles = ?self.max_cycles, "Starting chart pipeline");

        while state.should_continue() {
            let stage = state.stage;
            tracing::info!(%stage, cycle = state.cycles + 1, "Entering stage");

            let produced = match stage {
                Stage::Research => self.research.run(&state.log).await?,
                Stage::Chart => self.chart.run(&state.log).await?,
                Stage::End => break,
            };

            if let Some(ref observer) = self.observer {
                for msg in &produced {
                    observer(stage, msg);
                }
            }

            let next = state.advance(produced, &self.signal);
            tracing::debug!(from = %stage, to = %next, log_len = state.log.len(), "Transition");

            if next == Stage::Research && state.cycle_cap_reached() {
                let last_request = state
                    .log
                    .last()
                    .map(|m| m.content.clone())
                    .unwrap_or_default();
                tracing::warn!(cycles = state.cycles, "Cycle limit reached");
                return Err(ChartError::CycleLimitExceeded {
                    cycles: state.cycles,
                    last_request,
                });
            }
        }

        tracing::info!(cycles = state.cycles, messages = state.log.len(), "Pipeline complete");

        Ok(RunOutcome {
            log: state.log,
            cycles: state.cycles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_search_without_key() {
        let mut config = Config::default();
        config.search.api_key = None;
        assert!(search_backend(&config).unwrap().is_none());

        config.search.api_key = Some("tvly-key".to_string());
        let backend = search_backend(&config).unwrap().unwrap();
        assert_eq!(backend.name(), "tavily");
    }
}
