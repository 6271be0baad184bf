use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{Result, VoxlateError};

// Default values for translation decoding. Low temperature keeps the
// translation deterministic rather than creative.
fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    250
}

fn default_severity_floor() -> u8 {
    0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub moderation: ModerationConfig,
    pub translate: TranslateConfig,
    pub speech: SpeechConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationConfig {
    /// Content moderation endpoint URL
    pub endpoint: String,
    /// API key; falls back to the AZURE_CONTENT_SAFETY_KEY environment variable
    pub api_key: Option<String>,
    /// REST API version
    pub api_version: String,
    /// Any category severity above this value flags the text as unsafe
    #[serde(default = "default_severity_floor")]
    pub severity_floor: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Chat completions endpoint URL
    pub endpoint: String,
    /// Model deployment name
    pub deployment: String,
    /// API key; falls back to the AZURE_OPENAI_API_KEY environment variable
    pub api_key: Option<String>,
    /// REST API version
    pub api_version: String,
    /// Sampling temperature for translation
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Upper bound on generated translation tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Speech service region (e.g. "eastus")
    pub region: String,
    /// API key; falls back to the AZURE_SPEECH_KEY environment variable
    pub api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            moderation: ModerationConfig {
                endpoint: String::new(),
                api_key: None,
                api_version: "2023-10-01".to_string(),
                severity_floor: 0,
            },
            translate: TranslateConfig {
                endpoint: String::new(),
                deployment: "gpt-4o".to_string(),
                api_key: None,
                api_version: "2023-12-01-preview".to_string(),
                temperature: 0.3,
                max_tokens: 250,
            },
            speech: SpeechConfig {
                region: "eastus".to_string(),
                api_key: None,
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| VoxlateError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| VoxlateError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| VoxlateError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| VoxlateError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}

/// Resolve an API key from a config value with an environment fallback.
pub fn resolve_api_key(configured: Option<&str>, env_var: &str) -> Result<String> {
    if let Some(key) = configured {
        if !key.is_empty() {
            return Ok(key.to_string());
        }
    }

    std::env::var(env_var).map_err(|_| {
        VoxlateError::Config(format!(
            "API key not configured and {} is not set",
            env_var
        ))
    })
}
