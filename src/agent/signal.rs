//! Completion signal
//!
//! The chart worker asks for more research by embedding a marker in its
//! answer. Detection is plain substring containment.

/// Marker-based signal for "research is insufficient"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionSignal {
    marker: String,
}

impl CompletionSignal {
    /// Create a signal for the given marker
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    /// The marker text
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// How the chart model is told to write the marker
    pub fn decorated_marker(&self) -> String {
        format!("~{}~", self.marker)
    }

    /// Whether `text` asks the research worker for more information
    pub fn needs_more_research(&self, text: &str) -> bool {
        text.contains(&self.marker)
    }
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::new("QUESTION_TO_RESEARCHER")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decorated_marker_is_detected() {
        let signal = CompletionSignal::default();
        let text = format!(
            "{} please provide sales figures for the remaining 2 regions",
            signal.decorated_marker()
        );
        assert!(signal.needs_more_research(&text));
    }

    #[test]
    fn test_bare_marker_is_detected() {
        let signal = CompletionSignal::default();
        assert!(signal.needs_more_research("QUESTION_TO_RESEARCHER: which year?"));
    }

    #[test]
    fn test_chart_json_is_not_a_request() {
        let signal = CompletionSignal::default();
        assert!(!signal.needs_more_research(r#"{"chartsArray": [], "otherResearchFindings": ""}"#));
    }

    #[test]
    fn test_custom_marker() {
        let signal = CompletionSignal::new("NEED_MORE");
        assert!(signal.needs_more_research("NEED_MORE data"));
        assert!(!signal.needs_more_research("QUESTION_TO_RESEARCHER"));
    }
}
