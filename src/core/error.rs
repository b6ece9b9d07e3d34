//! Custom error types for Chartwright
//!
//! One error enum shared by the providers, tools, workers and the pipeline.

use thiserror::Error;

/// Main error type for Chartwright operations
#[derive(Error, Debug)]
pub enum ChartError {
    /// Model provider connection or API errors
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider answered with a non-success HTTP status
    #[error("{provider} API error ({status}): {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    /// Model not available on the provider
    #[error("Model '{0}' not available. For Ollama run: ollama pull {0}")]
    ModelNotFound(String),

    /// Search collaborator errors
    #[error("Search error: {0}")]
    Search(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The chart worker kept producing output that does not parse as JSON
    #[error("Chart output still invalid after {revisions} revision(s): {reason}")]
    InvalidChartOutput { revisions: usize, reason: String },

    /// The chart worker kept asking for more research
    #[error("Research-chart cycle limit of {cycles} reached; last request: {last_request}")]
    CycleLimitExceeded { cycles: usize, last_request: String },

    /// A worker kept calling tools without producing an answer
    #[error("{worker} worker exceeded {turns} tool turns without answering")]
    ToolTurnLimit { worker: String, turns: usize },

    /// The model returned neither text nor tool calls
    #[error("Model '{0}' returned an empty response")]
    EmptyResponse(String),

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for Chartwright operations
pub type Result<T> = std::result::Result<T, ChartError>;

impl ChartError {
    /// Create a provider error
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Create a search error
    pub fn search(msg: impl Into<String>) -> Self {
        Self::Search(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether retrying the same request could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_limit_message() {
        let err = ChartError::CycleLimitExceeded {
            cycles: 3,
            last_request: "need Q3 numbers".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("3"));
        assert!(text.contains("need Q3 numbers"));
    }

    #[test]
    fn test_status_decides_retry_not_body_text() {
        let err = ChartError::Api {
            provider: "OpenAI".to_string(),
            status: 400,
            message: "context length exceeded (500000 tokens)".to_string(),
        };
        assert!(!err.is_transient());
        assert!(!ChartError::provider("upstream said (503)").is_transient());
        assert_eq!(
            err.to_string(),
            "OpenAI API error (400): context length exceeded (500000 tokens)"
        );
    }

    #[test]
    fn test_transient_classification() {
        let api = |status: u16, message: &str| ChartError::Api {
            provider: "OpenAI".to_string(),
            status,
            message: message.to_string(),
        };
        assert!(api(429, "slow down").is_transient());
        assert!(api(503, "unavailable").is_transient());
        assert!(!api(401, "bad key").is_transient());
        assert!(!ChartError::config("missing").is_transient());
    }
}
