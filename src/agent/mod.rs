//! Agent module - the research/chart loop
//!
//! Contains the message log, the workers, and the orchestrator that routes
//! between them.

pub mod log;
pub mod loop_state;
pub mod orchestrator;
pub mod prompts;
pub mod signal;
pub mod worker;
pub mod workers;

pub use log::MessageLog;
pub use loop_state::{next_stage, RunState, Stage};
pub use orchestrator::{ChartPipeline, RunOutcome, StepObserver};
pub use signal::CompletionSignal;
pub use worker::{Worker, WorkerBuilder, WorkerRole};
pub use workers::{ChartWorker, ResearchWorker};
