//! OpenAI Provider
//!
//! Client for the chat-completions API. Works against api.openai.com and any
//! server that speaks the same protocol.

use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::core::{ChartError, Config, Message, Result, Role, ToolCall, ToolDefinition};
use crate::llm::traits::{GenerateOptions, LLMProvider, LLMResponse, TokenUsage};

/// Chat-completions client
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
    max_retries: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: WireFunction,
}

/// Arguments travel as a JSON-encoded string on this API
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    arguments: String,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    model: String,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    data: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
struct ModelInfo {
    id: String,
}

impl OpenAiClient {
    /// Create a client from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.openai.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: normalize_base_url(&config.openai.base_url)?,
            api_key: config.openai.api_key.clone(),
            max_retries: config.openai.max_retries,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ChartError::config(format!("Invalid endpoint '{}': {}", path, e)))
    }

    fn to_wire_message(msg: &Message) -> WireMessage {
        let tool_calls = if msg.tool_calls.is_empty() {
            None
        } else {
            Some(
                msg.tool_calls
                    .iter()
                    .map(|tc| WireToolCall {
                        id: tc.id.clone(),
                        call_type: function_type(),
                        function: WireFunction {
                            name: tc.name.clone(),
                            arguments: tc.arguments.to_string(),
                        },
                    })
                    .collect(),
            )
        };

        // An assistant turn that only calls tools carries no content
        let content = if msg.role == Role::Ai && tool_calls.is_some() && msg.content.is_empty() {
            None
        } else {
            Some(msg.content.clone())
        };

        WireMessage {
            role: msg.role.as_api_str().to_string(),
            content,
            tool_calls,
            tool_call_id: msg.tool_call_id.clone(),
        }
    }

    fn to_llm_response(response: ChatResponse, requested_model: &str) -> Result<LLMResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ChartError::provider("Response contained no choices"))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| {
                let arguments = serde_json::from_str(&tc.function.arguments)
                    .unwrap_or(serde_json::Value::String(tc.function.arguments));
                ToolCall::new(tc.id, tc.function.name, arguments)
            })
            .collect();

        let model = if response.model.is_empty() {
            requested_model.to_string()
        } else {
            response.model
        };

        Ok(LLMResponse {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            model,
        })
    }

    async fn send_once(&self, request: &ChatRequest<'_>) -> Result<ChatResponse> {
        let mut builder = self
            .client
            .post(self.endpoint("chat/completions")?)
            .json(request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_connect() {
                tracing::warn!("Cannot connect to {}: {}", self.base_url, e);
            }
            ChartError::from(e)
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 404 && error_text.contains("model") {
                return Err(ChartError::ModelNotFound(request.model.to_string()));
            }

            return Err(ChartError::Api {
                provider: "OpenAI".to_string(),
                status: status.as_u16(),
                message: error_text,
            });
        }

        let response_text = response.text().await?;
        tracing::trace!(body = %truncate(&response_text, 500), "chat completion response");

        serde_json::from_str(&response_text)
            .map_err(|e| ChartError::provider(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl LLMProvider for OpenAiClient {
    async fn chat_with_tools(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        let options = options.unwrap_or_default();
        let request = ChatRequest {
            model,
            messages: messages.iter().map(Self::to_wire_message).collect(),
            tools: if tools.is_empty() { None } else { Some(tools) },
            temperature: options.temperature,
        };

        let mut attempt = 0;
        loop {
            match self.send_once(&request).await {
                Ok(response) => return Self::to_llm_response(response, model),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = backoff_delay(attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        "Retrying chat completion in {:?}: {}",
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let mut builder = self.client.get(self.endpoint("models")?);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            return Err(ChartError::provider(format!(
                "Failed to list models ({})",
                response.status()
            )));
        }

        let models: ModelsResponse = response.json().await?;
        Ok(models.data.into_iter().map(|m| m.id).collect())
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// `Url::join` drops the last path segment unless the base ends in '/'
fn normalize_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)
        .map_err(|e| ChartError::config(format!("Invalid base URL '{}': {}", raw, e)))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Exponential backoff starting at 500ms with up to 250ms of jitter
fn backoff_delay(attempt: u32) -> Duration {
    let base = 500u64.saturating_mul(1 << attempt.min(6));
    let jitter = rand::rng().random_range(0..250);
    Duration::from_millis(base + jitter)
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_keeps_version_segment() {
        let url = normalize_base_url("https://api.openai.com/v1").unwrap();
        assert_eq!(
            url.join("chat/completions").unwrap().as_str(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            normalize_base_url("not a url"),
            Err(ChartError::Config(_))
        ));
    }

    #[test]
    fn test_tool_message_conversion() {
        let wire = OpenAiClient::to_wire_message(&Message::tool("call_1", "Valid JSON"));
        assert_eq!(wire.role, "tool");
        assert_eq!(wire.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(wire.content.as_deref(), Some("Valid JSON"));
    }

    #[test]
    fn test_tool_call_arguments_are_encoded_as_string() {
        let msg = Message::ai_with_tools(
            "",
            vec![ToolCall::new(
                "call_9",
                "tavily_search",
                serde_json::json!({"query": "regional sales"}),
            )],
        );
        let wire = OpenAiClient::to_wire_message(&msg);
        assert!(wire.content.is_none());
        let calls = wire.tool_calls.unwrap();
        assert_eq!(calls[0].function.arguments, r#"{"query":"regional sales"}"#);
    }

    #[test]
    fn test_response_parsing_with_tool_calls() {
        let body = r#"{
            "model": "gpt-4o-2024-08-06",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {"name": "json_validator", "arguments": "{\"string\": \"{}\"}"}
                    }]
                }
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        let response = OpenAiClient::to_llm_response(parsed, "gpt-4o").unwrap();
        assert_eq!(response.content, "");
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].id, "call_abc");
        assert_eq!(response.tool_calls[0].get_string("string").as_deref(), Some("{}"));
        assert_eq!(response.usage.unwrap().total_tokens, 15);
        assert_eq!(response.model, "gpt-4o-2024-08-06");
    }

    #[test]
    fn test_empty_choices_is_error() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(OpenAiClient::to_llm_response(parsed, "gpt-4o").is_err());
    }

    #[test]
    fn test_backoff_grows() {
        assert!(backoff_delay(0) < Duration::from_millis(750));
        assert!(backoff_delay(2) >= Duration::from_millis(2000));
    }
}
