//! TOML configuration for the planning driver and validator.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validator::ValidateOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Invalid config: {0}")]
    Parse(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub model: ModelConfig,
    pub validator: ValidatorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub tasks_csv: PathBuf,
    pub objects_dir: PathBuf,
    pub system_prompt: PathBuf,
    pub results_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            tasks_csv: PathBuf::from("data/tasks.csv"),
            objects_dir: PathBuf::from("objects"),
            system_prompt: PathBuf::from("prompts/system_prompt.txt"),
            results_dir: PathBuf::from("results"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// `openai` (any OpenAI-compatible endpoint) or `stub`.
    pub provider: String,
    pub model: String,
    /// Defaults to the OpenAI endpoint when unset.
    pub base_url: Option<String>,
    /// Environment variable the API key is read from.
    pub api_key_env: String,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o".to_string(),
            base_url: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: None,
            max_tokens: None,
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    pub auto_fix: bool,
    pub strict_subtasks: bool,
    pub max_abs_v: f64,
    pub max_abs_m: f64,
    pub max_steps: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        let opts = ValidateOptions::default();
        Self {
            auto_fix: opts.auto_fix,
            strict_subtasks: opts.strict_subtasks,
            max_abs_v: opts.max_abs_v,
            max_abs_m: opts.max_abs_m,
            max_steps: opts.max_steps,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load the given file, or fall back to defaults when no path is
    /// given. A named-but-missing file is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// The API key from the configured environment variable, if set.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.model.api_key_env).ok().filter(|k| !k.is_empty())
    }

    pub fn validate_options(&self) -> ValidateOptions {
        ValidateOptions {
            auto_fix: self.validator.auto_fix,
            strict_subtasks: self.validator.strict_subtasks,
            max_abs_v: self.validator.max_abs_v,
            max_abs_m: self.validator.max_abs_m,
            max_steps: self.validator.max_steps,
        }
    }
}
