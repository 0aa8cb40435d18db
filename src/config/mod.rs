use crate::error::DocGenError;
use chrono::{DateTime, Local};
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert code reviewer.";
pub const DEFAULT_USER_PROMPT: &str =
    "Analyze the following code and provide detailed documentation in a professional format:";

#[derive(Deserialize, Debug, Default)]
pub struct Config {
    pub llm_provider: Option<String>,
    pub groq_model: Option<String>,
    pub openai_model: Option<String>,
    pub custom_openai_url: Option<String>,
    pub ollama_model: Option<String>,
    pub ollama_url: Option<String>,
    pub gemini_model: Option<String>,
    pub system_prompt: Option<String>,
    pub user_prompt: Option<String>,
    pub sampling: Option<SamplingConfig>,
    pub retry: Option<RetryConfig>,
    pub output_path: Option<String>,
    pub output_filename_format: Option<String>,
    pub ignore_patterns: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct SamplingConfig {
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_tokens: Option<u32>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct RetryConfig {
    pub max_retries: Option<u32>,
    pub initial_retry_delay_secs: Option<u64>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, DocGenError> {
        let config_str = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&config_str)?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, DocGenError> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!("No config file at {}, using defaults", path.display());
            Ok(Config::default())
        }
    }

    pub fn get_system_prompt(&self) -> String {
        self.system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string())
    }

    pub fn get_user_prompt(&self) -> String {
        self.user_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_PROMPT.to_string())
    }

    pub fn get_temperature(&self) -> f64 {
        self.sampling
            .as_ref()
            .and_then(|s| s.temperature)
            .unwrap_or(0.7)
    }

    pub fn get_top_p(&self) -> f64 {
        self.sampling.as_ref().and_then(|s| s.top_p).unwrap_or(1.0)
    }

    pub fn get_max_tokens(&self) -> u32 {
        self.sampling
            .as_ref()
            .and_then(|s| s.max_tokens)
            .unwrap_or(2048)
    }

    pub fn get_max_retries(&self) -> u32 {
        self.retry.as_ref().and_then(|r| r.max_retries).unwrap_or(5)
    }

    pub fn get_initial_retry_delay(&self) -> Duration {
        let secs = self
            .retry
            .as_ref()
            .and_then(|r| r.initial_retry_delay_secs)
            .unwrap_or(2);
        Duration::from_secs(secs)
    }

    pub fn get_output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn get_output_filename(&self, project_name: &str) -> String {
        let now: DateTime<Local> = SystemTime::now().into();
        let date_str = now.format("%Y-%m-%d").to_string();

        self.output_filename_format
            .as_ref()
            .map(|format| {
                format
                    .replace("{project}", &sanitize_file_component(project_name))
                    .replace("{date}", &date_str)
            })
            .unwrap_or_else(|| "documentation.md".to_string())
    }

    pub fn get_ignore_patterns(&self) -> Vec<String> {
        self.ignore_patterns.clone().unwrap_or_default()
    }
}

/// Makes a name from an uploaded manifest safe to use inside a file name:
/// separators become `_`, and a name made only of dots becomes `project`.
fn sanitize_file_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "project".to_string()
    } else {
        cleaned
    }
}
