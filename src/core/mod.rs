//! Core module - shared infrastructure for Chartwright
//!
//! This module contains foundational types, configuration, and error handling
//! used throughout the application.

pub mod chart;
pub mod config;
pub mod error;
pub mod types;

pub use chart::{Chart, ChartDocument, DataPoint};
pub use config::Config;
pub use error::{ChartError, Result};
pub use types::*;
