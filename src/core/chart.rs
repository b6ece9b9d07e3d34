//! Chart document model
//!
//! Typed view of the JSON the chart worker produces. The pipeline only
//! requires the output to be well-formed JSON; this model is used when the
//! caller wants to inspect or summarise the charts.

use serde::{Deserialize, Serialize};

use crate::core::error::Result;

/// Top-level document returned by the chart worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDocument {
    /// Charts in display order
    #[serde(default)]
    pub charts_array: Vec<Chart>,
    /// Findings not attached to any chart footnote
    #[serde(default)]
    pub other_research_findings: String,
}

/// A single chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    /// Chart kind, e.g. "bar" or "pie"
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_axis_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis_label: Option<String>,
    /// What each label denotes, e.g. "song" or "artist"
    pub description_of_label: String,
    pub chart_data: Vec<DataPoint>,
    /// Research findings backing this chart
    pub chart_foot_note: String,
}

/// One labelled value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub label: String,
    pub value: f64,
}

impl ChartDocument {
    /// Parse a chart worker answer
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text.trim())?)
    }

    /// Short human-readable listing of the charts
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for (i, chart) in self.charts_array.iter().enumerate() {
            out.push_str(&format!(
                "{}. [{}] {} ({} data points)\n",
                i + 1,
                chart.kind,
                chart.title,
                chart.chart_data.len()
            ));
        }
        if out.is_empty() {
            out.push_str("(no charts)\n");
        }
        out
    }
}
