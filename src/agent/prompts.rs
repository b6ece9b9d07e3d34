//! Worker instructions
//!
//! Fixed system prompts for the research and chart workers.

use crate::agent::signal::CompletionSignal;

/// Instructions for the research worker
pub const RESEARCH_PROMPT: &str = "You are an expert researcher. Research the requested topic thoroughly \
and report accurate figures with their sources. A chart generator will turn your findings into charts, \
so give concrete labelled numbers and state which chart types (bar chart, pie chart, line chart, etc.) \
would display each set of data best. The chart generator may come back with questions; when it does, \
research further and answer exactly what it asked for.";

/// Instructions for the chart worker, with the completion marker filled in
pub fn chart_prompt(signal: &CompletionSignal) -> String {
    format!(
        r#"You are a chart generator. Build a JSON document describing charts from the data and chart suggestions provided by the researcher.

1. Analyze the input
- If data is missing or incomplete, ask for exactly what is needed. Your question MUST contain the text {marker} so the researcher knows to answer.
- Never ask for information that has already been provided.

2. Generate JSON in this shape:
{{
  "chartsArray": [
    {{
      "type": "bar",
      "title": "Top EDM Songs by Streaming Numbers",
      "xAxisLabel": "Streams",
      "yAxisLabel": "Songs",
      "descriptionOfLabel": "song",
      "chartData": [
        {{ "label": "Levels", "value": 380000000 }},
        {{ "label": "Titanium", "value": 1500000000 }}
      ],
      "chartFootNote": "<research findings that pertain to this chart>"
    }},
    {{
      "type": "pie",
      "title": "Distribution of Top EDM Songs by Artist",
      "descriptionOfLabel": "artist",
      "chartData": [
        {{ "label": "Avicii", "value": 40 }},
        {{ "label": "David Guetta", "value": 60 }}
      ],
      "chartFootNote": "<research findings that pertain to this chart>"
    }}
  ],
  "otherResearchFindings": "<research findings not already used in a chart foot note>"
}}
Axis labels are optional; every other field is required.

3. Validate
- Call the json_validator tool on your complete draft.
- If it reports invalid JSON, fix the draft and validate again until it is valid.

Output only the JSON document, without any additional text or code fences."#,
        marker = signal.decorated_marker()
    )
}

/// Feedback appended when a final chart answer does not parse
pub fn revision_request(reason: &str) -> String {
    format!(
        "Your last answer is not valid JSON ({}). Reply with only the corrected JSON document.",
        reason
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_prompt_embeds_marker() {
        let prompt = chart_prompt(&CompletionSignal::default());
        assert!(prompt.contains("~QUESTION_TO_RESEARCHER~"));
        assert!(prompt.contains("json_validator"));
        assert!(prompt.contains("\"chartsArray\""));
    }

    #[test]
    fn test_research_prompt_does_not_trip_signal() {
        assert!(!CompletionSignal::default().needs_more_research(RESEARCH_PROMPT));
    }
}
