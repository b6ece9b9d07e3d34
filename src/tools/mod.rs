//! Tools module - Tool collaborators for the workers
//!
//! Contains the web search backend, the JSON validator, and the tool registry.

pub mod json_validator;
pub mod registry;
pub mod search;

pub use json_validator::{JsonValidator, Validation};
pub use registry::ToolRegistry;
pub use search::{SearchBackend, TavilySearch};
