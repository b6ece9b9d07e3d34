//! Configuration management for Chartwright
//!
//! Supports environment variables, config files, and runtime overrides.
//! Each worker has its own model settings.
//!
//! Config file location: ~/.config/chartwright/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{ChartError, Result};

/// Main configuration for Chartwright
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Which model provider serves both workers
    #[serde(default)]
    pub provider: ProviderType,
    /// OpenAI-compatible endpoint configuration
    #[serde(default)]
    pub openai: OpenAiConfig,
    /// Ollama configuration
    #[serde(default)]
    pub ollama: OllamaConfig,
    /// Per-worker model configuration
    #[serde(default)]
    pub models: ModelConfig,
    /// Search collaborator configuration
    #[serde(default)]
    pub search: SearchConfig,
    /// Loop behavior
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Supported model providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// OpenAI or any server speaking the chat-completions protocol
    #[default]
    OpenAi,
    /// Local Ollama server
    Ollama,
}

impl std::str::FromStr for ProviderType {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(ChartError::config(format!(
                "Unknown provider '{}'. Available: openai, ollama",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderType::OpenAi => write!(f, "openai"),
            ProviderType::Ollama => write!(f, "ollama"),
        }
    }
}

/// OpenAI-compatible endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// Base URL, e.g. https://api.openai.com/v1
    pub base_url: String,
    /// API key; read from OPENAI_API_KEY, never written to disk
    #[serde(skip)]
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Client-level retries for transient failures
    pub max_retries: u32,
}

/// Ollama server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Host address (default: localhost)
    pub host: String,
    /// Port number (default: 11434)
    pub port: u16,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Model settings for one worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerModel {
    /// Model identifier on the provider
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
}

/// Model configuration - one entry per worker
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model used by the research worker
    /// Default: gpt-4o-mini
    pub research: WorkerModel,
    /// Model used by the chart worker
    /// Default: gpt-4o
    pub chart: WorkerModel,
}

/// Tavily search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Search API endpoint
    pub endpoint: String,
    /// API key; read from TAVILY_API_KEY, never written to disk
    #[serde(skip)]
    pub api_key: Option<String>,
    /// Number of results per query
    pub max_results: u32,
    /// "basic" or "advanced"
    pub search_depth: String,
    pub include_answer: bool,
    pub include_raw_content: bool,
    pub include_images: bool,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Orchestration loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum research-chart cycles; 0 in the file means unbounded
    #[serde(with = "cycle_cap")]
    pub max_cycles: Option<usize>,
    /// Maximum model calls a worker may spend on tool use per turn
    pub max_tool_turns: usize,
    /// Maximum forced rewrites of invalid chart JSON
    pub max_revisions: usize,
    /// Substring that marks a request for more research
    pub sentinel: String,
    /// Whether to show debug output
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderType::default(),
            openai: OpenAiConfig::default(),
            ollama: OllamaConfig::default(),
            models: ModelConfig::default(),
            search: SearchConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            timeout_secs: 120,
            max_retries: 2,
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 11434,
            timeout_secs: 120,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            research: WorkerModel {
                model: "gpt-4o-mini".to_string(),
                temperature: 0.0,
            },
            chart: WorkerModel {
                model: "gpt-4o".to_string(),
                temperature: 0.0,
            },
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.tavily.com/search".to_string(),
            api_key: None,
            max_results: 5,
            search_depth: "advanced".to_string(),
            include_answer: true,
            include_raw_content: true,
            include_images: true,
            timeout_secs: 60,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_cycles: Some(5),
            max_tool_turns: 12,
            max_revisions: 3,
            sentinel: "QUESTION_TO_RESEARCHER".to_string(),
            debug: false,
        }
    }
}

/// TOML has no null, so an unbounded cycle cap is stored as 0
mod cycle_cap {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<usize>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(value.unwrap_or(0) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<usize>, D::Error> {
        let raw = usize::deserialize(d)?;
        Ok(if raw == 0 { None } else { Some(raw) })
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chartwright")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > env vars > config file > defaults
    ///
    /// A missing file means defaults. A file that cannot be read or parsed
    /// is an error rather than a silent fallback.
    pub fn load() -> Result<Self> {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        Self::load_with(&Self::config_file(), |key| env::var(key).ok())
    }

    /// Load from `path`, then apply overrides from the `lookup` environment
    pub fn load_with(path: &Path, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = if path.exists() {
            Self::load_from_file(path)?
        } else {
            Self::default()
        };
        config.apply_env(lookup)?;
        Ok(config)
    }

    /// Load configuration from a file only
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ChartError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        toml::from_str(&content).map_err(|e| {
            ChartError::config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Override settings from environment variables
    ///
    /// Unset and empty variables leave the current value alone. API keys only
    /// ever come from here.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(provider) = var("CHARTWRIGHT_PROVIDER") {
            self.provider = provider.parse()?;
        }
        if let Some(url) = var("OPENAI_BASE_URL") {
            self.openai.base_url = url;
        }
        if let Some(key) = var("OPENAI_API_KEY") {
            self.openai.api_key = Some(key);
        }
        if let Some(host) = var("OLLAMA_HOST") {
            self.ollama.host = host;
        }
        if let Some(port) = var("OLLAMA_PORT") {
            self.ollama.port = port
                .parse()
                .map_err(|_| ChartError::config(format!("OLLAMA_PORT is not a port: {}", port)))?;
        }
        if let Some(model) = var("CHARTWRIGHT_RESEARCH_MODEL") {
            self.set_research_model(model);
        }
        if let Some(model) = var("CHARTWRIGHT_CHART_MODEL") {
            self.set_chart_model(model);
        }
        if let Some(key) = var("TAVILY_API_KEY") {
            self.search.api_key = Some(key);
        }
        if let Some(debug) = var("CHARTWRIGHT_DEBUG") {
            self.pipeline.debug = debug == "true" || debug == "1";
        }
        Ok(())
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ChartError::config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir();
        let config_path = Self::config_file();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .map_err(|e| ChartError::config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ChartError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)
            .map_err(|e| ChartError::config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Save configuration and return the path
    pub fn save_and_get_path(&self) -> Result<PathBuf> {
        self.save()?;
        Ok(Self::config_file())
    }

    /// Get the full Ollama API URL
    pub fn ollama_url(&self) -> String {
        format!("http://{}:{}", self.ollama.host, self.ollama.port)
    }

    /// Update the research worker model
    pub fn set_research_model(&mut self, model: impl Into<String>) {
        self.models.research.model = model.into();
    }

    /// Update the chart worker model
    pub fn set_chart_model(&mut self, model: impl Into<String>) {
        self.models.chart.model = model.into();
    }

    /// Check that the selected provider has what it needs
    pub fn validate(&self) -> Result<()> {
        if self.provider == ProviderType::OpenAi && self.openai.api_key.is_none() {
            return Err(ChartError::config(
                "OPENAI_API_KEY is not set (or choose --provider ollama)",
            ));
        }
        if self.pipeline.sentinel.trim().is_empty() {
            return Err(ChartError::config("pipeline.sentinel must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pipeline() {
        let pipeline = PipelineConfig::default();
        assert_eq!(pipeline.max_cycles, Some(5));
        assert_eq!(pipeline.max_revisions, 3);
        assert_eq!(pipeline.sentinel, "QUESTION_TO_RESEARCHER");
    }

    #[test]
    fn test_default_search_matches_tavily_options() {
        let search = SearchConfig::default();
        assert_eq!(search.max_results, 5);
        assert_eq!(search.search_depth, "advanced");
        assert!(search.include_answer && search.include_raw_content && search.include_images);
    }

    #[test]
    fn test_ollama_url() {
        let mut config = Config::default();
        config.ollama.host = "localhost".to_string();
        config.ollama.port = 11434;
        assert_eq!(config.ollama_url(), "http://localhost:11434");
    }

    #[test]
    fn test_config_serialization_skips_secrets() {
        let mut config = Config::default();
        config.openai.api_key = Some("sk-secret".to_string());
        config.search.api_key = Some("tvly-secret".to_string());
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("research"));
        assert!(toml_str.contains("chart"));
        assert!(!toml_str.contains("secret"));
    }

    #[test]
    fn test_zero_cycle_cap_means_unbounded() {
        let mut config = Config::default();
        config.pipeline.max_cycles = None;
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("max_cycles = 0"));

        let parsed = Config::from_toml(&toml_str).unwrap();
        assert_eq!(parsed.pipeline.max_cycles, None);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed = Config::from_toml("provider = \"ollama\"\n").unwrap();
        assert_eq!(parsed.provider, ProviderType::Ollama);
        assert_eq!(parsed.search.max_results, 5);
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!("OpenAI".parse::<ProviderType>().unwrap(), ProviderType::OpenAi);
        assert!("bard".parse::<ProviderType>().is_err());
    }

    #[test]
    fn test_validate_requires_openai_key() {
        let mut config = Config::default();
        config.provider = ProviderType::OpenAi;
        config.openai.api_key = None;
        assert!(config.validate().is_err());

        config.provider = ProviderType::Ollama;
        assert!(config.validate().is_ok());
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: std::collections::HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn scratch_file(name: &str, content: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("chartwright-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_env_beats_file() {
        let path = scratch_file(
            "env_beats_file.toml",
            "provider = \"openai\"\n\n[openai]\nbase_url = \"https://file.example/v1\"\n\n[ollama]\nport = 1234\n",
        );
        let lookup = env_of(&[
            ("CHARTWRIGHT_PROVIDER", "ollama"),
            ("OPENAI_BASE_URL", "https://env.example/v1"),
            ("OLLAMA_HOST", "gpu-box"),
            ("CHARTWRIGHT_DEBUG", "1"),
            ("TAVILY_API_KEY", "tvly-key"),
        ]);

        let config = Config::load_with(&path, lookup).unwrap();
        assert_eq!(config.provider, ProviderType::Ollama);
        assert_eq!(config.openai.base_url, "https://env.example/v1");
        assert_eq!(config.ollama.host, "gpu-box");
        // untouched by env, so the file wins over defaults
        assert_eq!(config.ollama.port, 1234);
        assert!(config.pipeline.debug);
        assert_eq!(config.search.api_key.as_deref(), Some("tvly-key"));
    }

    #[test]
    fn test_missing_file_uses_defaults_and_env() {
        let path = env::temp_dir().join("chartwright-no-such-dir").join("config.toml");
        let config =
            Config::load_with(&path, env_of(&[("CHARTWRIGHT_CHART_MODEL", "gpt-4.1")])).unwrap();
        assert_eq!(config.models.chart.model, "gpt-4.1");
        assert_eq!(config.models.research.model, "gpt-4o-mini");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let path = scratch_file("malformed.toml", "provider = \"openai\"\n[pipeline\n");
        let err = Config::load_with(&path, env_of(&[])).unwrap_err();
        assert!(matches!(err, ChartError::Config(ref msg) if msg.contains("malformed.toml")));
    }

    #[test]
    fn test_bad_env_value_is_an_error() {
        let mut config = Config::default();
        assert!(config.apply_env(env_of(&[("OLLAMA_PORT", "eleven")])).is_err());
        assert!(config.apply_env(env_of(&[("CHARTWRIGHT_PROVIDER", "bard")])).is_err());
        // empty values count as unset
        config.apply_env(env_of(&[("OPENAI_API_KEY", "")])).unwrap();
        assert!(config.openai.api_key.is_none());
    }

    #[test]
    fn test_config_dir() {
        let dir = Config::config_dir();
        assert!(dir.to_string_lossy().contains("chartwright"));
    }
}
