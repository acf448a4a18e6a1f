//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::layout::{LayoutMode, LayoutParams, Viewport};

/// Environment variables consulted for the LLM API key, in order
pub const LLM_API_KEY_VARS: [&str; 2] = ["TOPICTREE_API_KEY", "OPENAI_API_KEY"];

/// Environment variable holding the news API key
pub const NEWS_API_KEY_VAR: &str = "NEWS_API_KEY";

/// Topictree configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub news: NewsConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(skip_serializing, default)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: usize,
    pub timeout_secs: u64,
    /// Attempts per content fetch, including the first one
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsConfig {
    #[serde(skip_serializing, default)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub language: String,
    pub sort_by: String,
    pub page_size: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub mode: LayoutMode,
    pub width: f64,
    pub height: f64,
    pub node_spacing: f64,
    pub margin_x: f64,
    pub margin_y: f64,
    pub radial_padding: f64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            max_tokens: 1500,
            timeout_secs: 60,
            max_attempts: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://newsapi.org/v2/everything".to_string(),
            language: "en".to_string(),
            sort_by: "publishedAt".to_string(),
            page_size: 5,
            timeout_secs: 15,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            mode: LayoutMode::Horizontal,
            width: 1200.0,
            height: 800.0,
            node_spacing: 60.0,
            margin_x: 120.0,
            margin_y: 40.0,
            radial_padding: 40.0,
        }
    }
}

impl LlmConfig {
    pub fn resolved_api_key(&self) -> anyhow::Result<Option<String>> {
        self.enforce_env_only()?;

        Ok(LLM_API_KEY_VARS
            .iter()
            .find_map(|var| env::var(var).ok())
            .filter(|key| !key.trim().is_empty()))
    }

    pub fn redacted_api_key(&self) -> anyhow::Result<Option<String>> {
        self.resolved_api_key().map(|opt| opt.map(|key| redact(&key)))
    }

    pub fn enforce_env_only(&self) -> anyhow::Result<()> {
        if self.api_key.is_some() {
            return Err(anyhow!(
                "LLM API keys must be provided via environment variables, not stored in configuration"
            ));
        }
        Ok(())
    }
}

impl NewsConfig {
    pub fn resolved_api_key(&self) -> anyhow::Result<Option<String>> {
        if self.api_key.is_some() {
            return Err(anyhow!(
                "News API keys must be provided via the {} environment variable",
                NEWS_API_KEY_VAR
            ));
        }

        Ok(env::var(NEWS_API_KEY_VAR)
            .ok()
            .filter(|key| !key.trim().is_empty()))
    }
}

impl LayoutConfig {
    /// Viewport described by this configuration
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }

    /// Spacing parameters for the layout engine
    pub fn params(&self) -> LayoutParams {
        LayoutParams {
            node_spacing: self.node_spacing,
            margin_x: self.margin_x,
            margin_y: self.margin_y,
            radial_padding: self.radial_padding,
        }
    }
}

fn redact(key: &str) -> String {
    if key.len() <= 4 {
        "***".to_string()
    } else {
        format!("***{}", &key[key.len() - 4..])
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("TOPICTREE_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("topictree")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or fall back to defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, path: &std::path::Path) -> anyhow::Result<()> {
        self.validate()?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        self.llm.enforce_env_only()?;
        if self.news.api_key.is_some() {
            return Err(anyhow!(
                "News API keys must be provided via the {} environment variable",
                NEWS_API_KEY_VAR
            ));
        }
        if self.llm.max_attempts == 0 {
            return Err(anyhow!("llm.max_attempts must be at least 1"));
        }
        if !(self.layout.width > 0.0 && self.layout.height > 0.0) {
            return Err(anyhow!("layout.width and layout.height must be positive"));
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            // LLM settings
            "llm.base_url" => Ok(self.llm.base_url.clone()),
            "llm.model" => Ok(self.llm.model.clone()),
            "llm.temperature" => Ok(self.llm.temperature.to_string()),
            "llm.max_tokens" => Ok(self.llm.max_tokens.to_string()),
            "llm.timeout_secs" => Ok(self.llm.timeout_secs.to_string()),
            "llm.max_attempts" => Ok(self.llm.max_attempts.to_string()),
            "llm.retry_delay_ms" => Ok(self.llm.retry_delay_ms.to_string()),

            // News settings
            "news.base_url" => Ok(self.news.base_url.clone()),
            "news.language" => Ok(self.news.language.clone()),
            "news.sort_by" => Ok(self.news.sort_by.clone()),
            "news.page_size" => Ok(self.news.page_size.to_string()),
            "news.timeout_secs" => Ok(self.news.timeout_secs.to_string()),

            // Layout settings
            "layout.mode" => Ok(self.layout.mode.to_string()),
            "layout.width" => Ok(self.layout.width.to_string()),
            "layout.height" => Ok(self.layout.height.to_string()),
            "layout.node_spacing" => Ok(self.layout.node_spacing.to_string()),
            "layout.margin_x" => Ok(self.layout.margin_x.to_string()),
            "layout.margin_y" => Ok(self.layout.margin_y.to_string()),
            "layout.radial_padding" => Ok(self.layout.radial_padding.to_string()),

            // API keys (special handling - show redacted)
            "llm.api_key" => match self.llm.redacted_api_key()? {
                Some(redacted) => Ok(redacted),
                None => Ok("(not set - use TOPICTREE_API_KEY or OPENAI_API_KEY env var)".to_string()),
            },
            "news.api_key" => match self.news.resolved_api_key()? {
                Some(key) => Ok(redact(&key)),
                None => Ok(format!("(not set - use {} env var)", NEWS_API_KEY_VAR)),
            },

            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `topictree config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            // LLM settings
            "llm.base_url" => {
                self.llm.base_url = value.trim_end_matches('/').to_string();
            }
            "llm.model" => {
                if value.trim().is_empty() {
                    return Err(anyhow!("Model name must not be empty"));
                }
                self.llm.model = value.to_string();
            }
            "llm.temperature" => {
                let temp: f32 = value
                    .parse()
                    .with_context(|| format!("Invalid temperature value: {}", value))?;
                if !(0.0..=2.0).contains(&temp) {
                    return Err(anyhow!("Temperature must be between 0.0 and 2.0"));
                }
                self.llm.temperature = temp;
            }
            "llm.max_tokens" => {
                self.llm.max_tokens = value
                    .parse()
                    .with_context(|| format!("Invalid max_tokens value: {}", value))?;
            }
            "llm.timeout_secs" => {
                self.llm.timeout_secs = value
                    .parse()
                    .with_context(|| format!("Invalid timeout_secs value: {}", value))?;
            }
            "llm.max_attempts" => {
                let attempts: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid max_attempts value: {}", value))?;
                if attempts == 0 {
                    return Err(anyhow!("max_attempts must be at least 1"));
                }
                self.llm.max_attempts = attempts;
            }
            "llm.retry_delay_ms" => {
                self.llm.retry_delay_ms = value
                    .parse()
                    .with_context(|| format!("Invalid retry_delay_ms value: {}", value))?;
            }

            // News settings
            "news.base_url" => {
                self.news.base_url = value.to_string();
            }
            "news.language" => {
                self.news.language = value.to_string();
            }
            "news.sort_by" => {
                let valid = ["publishedAt", "relevancy", "popularity"];
                if !valid.contains(&value) {
                    return Err(anyhow!(
                        "Invalid sort order: {}. Valid options: {}",
                        value,
                        valid.join(", ")
                    ));
                }
                self.news.sort_by = value.to_string();
            }
            "news.page_size" => {
                let size: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid page_size value: {}", value))?;
                if !(1..=100).contains(&size) {
                    return Err(anyhow!("page_size must be between 1 and 100"));
                }
                self.news.page_size = size;
            }
            "news.timeout_secs" => {
                self.news.timeout_secs = value
                    .parse()
                    .with_context(|| format!("Invalid timeout_secs value: {}", value))?;
            }

            // Layout settings
            "layout.mode" => {
                self.layout.mode = value.parse()?;
            }
            "layout.width" => self.layout.width = parse_positive(key, value)?,
            "layout.height" => self.layout.height = parse_positive(key, value)?,
            "layout.node_spacing" => self.layout.node_spacing = parse_positive(key, value)?,
            "layout.margin_x" => self.layout.margin_x = parse_non_negative(key, value)?,
            "layout.margin_y" => self.layout.margin_y = parse_non_negative(key, value)?,
            "layout.radial_padding" => {
                self.layout.radial_padding = parse_non_negative(key, value)?
            }

            // API keys cannot be set via config
            "llm.api_key" | "news.api_key" => {
                return Err(anyhow!(
                    "API keys cannot be stored in configuration for security. \
                     Set TOPICTREE_API_KEY / OPENAI_API_KEY or {} instead.",
                    NEWS_API_KEY_VAR
                ));
            }

            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `topictree config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = [
            "llm.base_url",
            "llm.model",
            "llm.temperature",
            "llm.max_tokens",
            "llm.timeout_secs",
            "llm.max_attempts",
            "llm.retry_delay_ms",
            "llm.api_key",
            "news.base_url",
            "news.language",
            "news.sort_by",
            "news.page_size",
            "news.timeout_secs",
            "news.api_key",
            "layout.mode",
            "layout.width",
            "layout.height",
            "layout.node_spacing",
            "layout.margin_x",
            "layout.margin_y",
            "layout.radial_padding",
        ];

        keys.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}

fn parse_positive(key: &str, value: &str) -> anyhow::Result<f64> {
    let parsed: f64 = value
        .parse()
        .with_context(|| format!("Invalid {} value: {}", key, value))?;
    if !(parsed.is_finite() && parsed > 0.0) {
        return Err(anyhow!("{} must be a positive number", key));
    }
    Ok(parsed)
}

fn parse_non_negative(key: &str, value: &str) -> anyhow::Result<f64> {
    let parsed: f64 = value
        .parse()
        .with_context(|| format!("Invalid {} value: {}", key, value))?;
    if !(parsed.is_finite() && parsed >= 0.0) {
        return Err(anyhow!("{} must be non-negative", key));
    }
    Ok(parsed)
}
