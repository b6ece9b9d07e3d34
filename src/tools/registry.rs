//! Tool registry - manages and dispatches tool calls
//!
//! Central hub for registering tools and routing tool calls to handlers.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{Result, ToolCall, ToolCategory, ToolDefinition, ToolResult};
use crate::tools::json_validator::{JsonValidator, JSON_VALIDATOR_TOOL};
use crate::tools::search::{SearchBackend, SEARCH_TOOL};

/// Registry of available tools
pub struct ToolRegistry {
    /// Tool definitions indexed by name
    definitions: HashMap<String, ToolDefinition>,
    /// Tool categories
    categories: HashMap<String, ToolCategory>,
    /// Search backend, when search is enabled
    search: Option<Arc<dyn SearchBackend>>,
    /// Validation tools
    validator: JsonValidator,
}

impl ToolRegistry {
    /// Create a new tool registry with the validation tool only
    pub fn new() -> Self {
        let mut registry = Self {
            definitions: HashMap::new(),
            categories: HashMap::new(),
            search: None,
            validator: JsonValidator::new(),
        };

        registry.register_validation_tools();

        registry
    }

    /// Create a registry with the search tool enabled
    pub fn with_search(backend: Arc<dyn SearchBackend>) -> Self {
        let mut registry = Self::new();
        registry.search = Some(backend);
        registry.register_search_tools();
        registry
    }

    /// Register the JSON validation tool
    fn register_validation_tools(&mut self) {
        self.register(
            ToolDefinition::function(
                JSON_VALIDATOR_TOOL,
                "Validates if the given string is a correctly formatted JSON.",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "string": {
                            "type": "string",
                            "description": "The complete JSON text to validate"
                        }
                    },
                    "required": ["string"]
                }),
            ),
            ToolCategory::Validation,
        );
    }

    /// Register the web search tool
    fn register_search_tools(&mut self) {
        self.register(
            ToolDefinition::function(
                SEARCH_TOOL,
                "Search the web for current facts and figures. Returns an answer summary and ranked results with sources.",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "The search query"
                        }
                    },
                    "required": ["query"]
                }),
            ),
            ToolCategory::Search,
        );
    }

    /// Register a tool definition
    pub fn register(&mut self, definition: ToolDefinition, category: ToolCategory) {
        let name = definition.function.name.clone();
        self.definitions.insert(name.clone(), definition);
        self.categories.insert(name, category);
    }

    /// Get tool definitions by category
    pub fn definitions_by_category(&self, category: ToolCategory) -> Vec<&ToolDefinition> {
        let mut defs: Vec<&ToolDefinition> = self
            .definitions
            .iter()
            .filter(|(name, _)| self.categories.get(*name) == Some(&category))
            .map(|(_, def)| def)
            .collect();
        defs.sort_by(|a, b| a.name().cmp(b.name()));
        defs
    }

    /// Get search tool definitions
    pub fn search_tools(&self) -> Vec<&ToolDefinition> {
        self.definitions_by_category(ToolCategory::Search)
    }

    /// Get validation tool definitions
    pub fn validation_tools(&self) -> Vec<&ToolDefinition> {
        self.definitions_by_category(ToolCategory::Validation)
    }

    /// Check if search is enabled
    pub fn has_search(&self) -> bool {
        self.search.is_some()
    }

    /// Execute a tool call
    ///
    /// Collaborator failures become failed results so the model can carry on
    /// with whatever context it has.
    pub async fn execute(&self, tool_call: &ToolCall) -> Result<ToolResult> {
        let category = self.categories.get(&tool_call.name);

        match category {
            Some(ToolCategory::Validation) => Ok(self.validator.execute(tool_call)),
            Some(ToolCategory::Search) => Ok(self.execute_search_tool(tool_call).await),
            None => Ok(ToolResult::failure(
                &tool_call.name,
                format!("Unknown tool: {}", tool_call.name),
            )),
        }
    }

    /// Execute a search tool
    async fn execute_search_tool(&self, tool_call: &ToolCall) -> ToolResult {
        let Some(ref search) = self.search else {
            return ToolResult::failure(&tool_call.name, "Search is not enabled");
        };

        let Some(query) = tool_call.get_string("query") else {
            return ToolResult::failure(&tool_call.name, "Missing 'query' argument");
        };

        tracing::info!(backend = search.name(), query = %query, "Searching");

        match search.search(&query).await {
            Ok(text) => ToolResult::success(&tool_call.name, text),
            Err(e) => {
                tracing::warn!("Search failed, continuing without results: {}", e);
                ToolResult::failure(&tool_call.name, format!("Error: {}", e))
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ChartError;
    use async_trait::async_trait;

    struct DownSearch;

    #[async_trait]
    impl SearchBackend for DownSearch {
        async fn search(&self, _query: &str) -> Result<String> {
            Err(ChartError::search("service unavailable"))
        }

        fn name(&self) -> &str {
            "down"
        }
    }

    #[test]
    fn test_default_registry_has_only_validation() {
        let registry = ToolRegistry::new();
        assert!(!registry.has_search());
        assert!(registry.search_tools().is_empty());
        assert_eq!(registry.validation_tools()[0].name(), JSON_VALIDATOR_TOOL);
    }

    #[tokio::test]
    async fn test_search_failure_is_soft() {
        let registry = ToolRegistry::with_search(Arc::new(DownSearch));
        let call = ToolCall::new("c1", SEARCH_TOOL, serde_json::json!({"query": "sales"}));
        let result = registry.execute(&call).await.unwrap();
        assert!(!result.success);
        assert!(result.output.contains("service unavailable"));
    }

    #[test]
    fn test_unknown_tool() {
        let registry = ToolRegistry::new();
        let call = ToolCall::new("c1", "python_repl", serde_json::json!({}));
        let result = tokio_test::block_on(registry.execute(&call)).unwrap();
        assert!(!result.success);
        assert!(result.output.contains("Unknown tool"));
    }

    #[tokio::test]
    async fn test_search_not_enabled() {
        let registry = ToolRegistry::new();
        let call = ToolCall::new("c1", SEARCH_TOOL, serde_json::json!({"query": "x"}));
        // Not registered, so it is routed as unknown
        assert!(!registry.execute(&call).await.unwrap().success);
    }
}
