//! Tool-using worker
//!
//! A worker reads the message log, calls its model, runs any requested
//! tools, and repeats until the model answers without tool calls. It never
//! writes to the log itself; it returns the messages it wants appended.

use std::sync::Arc;

use crate::agent::log::MessageLog;
use crate::core::config::WorkerModel;
use crate::core::{ChartError, Message, Result, ToolCategory, ToolDefinition};
use crate::llm::{GenerateOptions, LLMProvider};
use crate::tools::ToolRegistry;

/// Which node of the loop a worker fills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerRole {
    Research,
    Chart,
}

impl std::fmt::Display for WorkerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerRole::Research => write!(f, "research"),
            WorkerRole::Chart => write!(f, "chart"),
        }
    }
}

/// A model plus the tools it may call
#[derive(Clone)]
pub struct Worker {
    /// Role of this worker
    role: WorkerRole,
    /// System prompt defining the worker's behavior
    system_prompt: String,
    /// Model provider
    llm: Arc<dyn LLMProvider>,
    /// Model and sampling settings
    model: WorkerModel,
    /// Tool registry
    tools: Arc<ToolRegistry>,
    /// Categories of tools offered to the model
    tool_categories: Vec<ToolCategory>,
    /// Maximum model calls per turn
    max_tool_turns: usize,
}

/// Builder for creating Workers
pub struct WorkerBuilder {
    role: WorkerRole,
    system_prompt: Option<String>,
    llm: Option<Arc<dyn LLMProvider>>,
    model: Option<WorkerModel>,
    tools: Option<Arc<ToolRegistry>>,
    tool_categories: Vec<ToolCategory>,
    max_tool_turns: usize,
}

impl WorkerBuilder {
    /// Create a new builder for the given role
    pub fn new(role: WorkerRole) -> Self {
        Self {
            role,
            system_prompt: None,
            llm: None,
            model: None,
            tools: None,
            tool_categories: Vec::new(),
            max_tool_turns: 12,
        }
    }

    /// Set the system prompt
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Set the model provider
    pub fn llm(mut self, llm: Arc<dyn LLMProvider>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Set the model to use
    pub fn model(mut self, model: WorkerModel) -> Self {
        self.model = Some(model);
        self
    }

    /// Set the tool registry
    pub fn tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Offer tools of this category to the model
    pub fn tool_category(mut self, category: ToolCategory) -> Self {
        self.tool_categories.push(category);
        self
    }

    /// Set maximum model calls per turn
    pub fn max_tool_turns(mut self, max: usize) -> Self {
        self.max_tool_turns = max;
        self
    }

    /// Build the Worker
    pub fn build(self) -> Result<Worker> {
        let llm = self.llm.ok_or_else(|| {
            ChartError::config(format!("{} worker needs a model provider", self.role))
        })?;
        let model = self
            .model
            .ok_or_else(|| ChartError::config(format!("{} worker needs a model", self.role)))?;

        Ok(Worker {
            role: self.role,
            system_prompt: self
                .system_prompt
                .unwrap_or_else(|| format!("You are the {} worker.", self.role)),
            llm,
            model,
            tools: self.tools.unwrap_or_else(|| Arc::new(ToolRegistry::new())),
            tool_categories: self.tool_categories,
            max_tool_turns: self.max_tool_turns.max(1),
        })
    }
}

impl Worker {
    /// Create a builder
    pub fn builder(role: WorkerRole) -> WorkerBuilder {
        WorkerBuilder::new(role)
    }

    /// Model settings of this worker
    pub fn model(&self) -> &WorkerModel {
        &self.model
    }

    fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tool_categories
            .iter()
            .flat_map(|c| self.tools.definitions_by_category(*c))
            .cloned()
            .collect()
    }

    /// Produce this worker's contribution to the log
    ///
    /// Returns the ai tool-call messages and tool results in order, ending
    /// with the ai message that carries the final answer.
    pub async fn respond(&self, log: &MessageLog) -> Result<Vec<Message>> {
        let tool_defs = self.tool_definitions();
        let mut produced: Vec<Message> = Vec::new();

        for turn in 1..=self.max_tool_turns {
            let mut context = Vec::with_capacity(log.len() + produced.len() + 1);
            context.push(Message::system(&self.system_prompt));
            context.extend(log.iter().cloned());
            context.extend(produced.iter().cloned());

            tracing::debug!(
                worker = %self.role,
                model = %self.model.model,
                turn,
                context = context.len(),
                "Calling model"
            );

            let response = self
                .llm
                .chat_with_tools(
                    &self.model.model,
                    &context,
                    &tool_defs,
                    Some(GenerateOptions::with_temperature(self.model.temperature)),
                )
                .await?;

            if let Some(ref usage) = response.usage {
                tracing::debug!(worker = %self.role, tokens = usage.total_tokens, "Model usage");
            }

            if response.is_empty() {
                return Err(ChartError::EmptyResponse(response.model));
            }

            let message = response.into_message();
            if !message.has_tool_calls() {
                produced.push(message);
                return Ok(produced);
            }

            let calls = message.tool_calls.clone();
            produced.push(message);

            // Tool calls run one at a time, in the order the model listed them
            for call in &calls {
                let result = self.tools.execute(call).await?;
                tracing::info!(
                    worker = %self.role,
                    tool = %result.tool_name,
                    success = result.success,
                    "Tool finished"
                );
                produced.push(Message::tool(&call.id, result.output));
            }
        }

        Err(ChartError::ToolTurnLimit {
            worker: self.role.to_string(),
            turns: self.max_tool_turns,
        })
    }
}
