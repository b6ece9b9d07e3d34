//! Chartwright - research-to-chart agent loop
//!
//! Two language-model workers cooperate: a research worker gathers facts with
//! web search, and a chart worker turns them into a JSON chart document. The
//! chart worker can send the run back for more research by writing a marker
//! into its answer; the loop ends when it answers with a valid document.
//!
//! # Architecture
//!
//! - **Core**: Shared types, chart document model, configuration, and errors
//! - **LLM**: Model provider trait with OpenAI-compatible and Ollama clients
//! - **Tools**: Web search, JSON validation, and the tool registry
//! - **Agent**: Message log, workers, and the orchestration loop
//! - **CLI**: Command-line interface and REPL
//!
//! # Usage
//!
//! ```rust,no_run
//! use chartwright::{ChartPipeline, Config};
//!
//! #[tokio::main]
//! async fn main() -> chartwright::Result<()> {
//!     let config = Config::load()?;
//!     let pipeline = ChartPipeline::from_config(&config)?;
//!
//!     let outcome = pipeline.run("Chart the top 5 EDM songs by streams.").await?;
//!     println!("{}", outcome.chart_json());
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod llm;
pub mod tools;

// Re-export commonly used items
pub use agent::{ChartPipeline, RunOutcome};
pub use cli::Repl;
pub use core::{ChartDocument, ChartError, Config, Result};
