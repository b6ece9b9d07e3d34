//! CLI module - command-line interface
//!
//! Contains the REPL, command parsing, and run reporting.

pub mod commands;
pub mod repl;
pub mod report;

pub use repl::Repl;
