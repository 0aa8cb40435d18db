mod gemini;
mod ollama;
mod openai;

pub use gemini::Gemini;
pub use ollama::Ollama;
pub use openai::OpenAI;

use crate::config::Config;
use crate::error::DocGenError;
use async_trait::async_trait;
use log::info;
use serde_json::Value;
use std::env;
use std::time::Instant;

/// Substring the hosted providers put in throttling error messages.
pub const RATE_LIMIT_MARKER: &str = "Rate limit reached";

const HTTP_TOO_MANY_REQUESTS: u16 = 429;

pub const GROQ_URL: &str = "https://api.groq.com/openai/v1";
pub const OPENAI_URL: &str = "https://api.openai.com/v1";
pub const OLLAMA_URL: &str = "http://localhost:11434";
pub const GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// One chat completion: a system/user prompt pair plus sampling parameters.
/// Requests are always non-streaming.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Template carrying the configured prompts and sampling, with no source
    /// attached yet.
    pub fn from_config(config: &Config) -> Self {
        CompletionRequest {
            system_prompt: config.get_system_prompt(),
            user_prompt: config.get_user_prompt(),
            temperature: config.get_temperature(),
            top_p: config.get_top_p(),
            max_tokens: config.get_max_tokens(),
        }
    }

    pub fn with_source(&self, content: &str) -> Self {
        CompletionRequest {
            user_prompt: format!("{}\n\n{}", self.user_prompt, content),
            ..self.clone()
        }
    }
}

/// Outcome of a single remote call.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    /// The call succeeded; the text is `None` when the response carried no
    /// content at the expected field.
    Success(Option<String>),
    RateLimited(String),
    Failed(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LLM: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> CompletionOutcome;
    fn model_name(&self) -> String;
}

pub fn calculate_tokens(text: &str) -> usize {
    // Whitespace split is only an approximation of the provider's tokenizer.
    text.split_whitespace().count()
}

pub fn log_performance(
    model: &str,
    start_time: Instant,
    input_tokens: usize,
    output_tokens: usize,
) {
    let duration = start_time.elapsed();
    let total_tokens = input_tokens + output_tokens;
    let tokens_per_second = total_tokens as f64 / duration.as_secs_f64();

    info!(
        "{} - Total duration: {:?}, Input tokens: {}, Output tokens: {}, Total tokens: {}, Tokens per second: {:.2}",
        model, duration, input_tokens, output_tokens, total_tokens, tokens_per_second
    );
}

/// Tags a failed call as rate limited or not.
pub fn classify_failure(status: Option<u16>, message: String) -> CompletionOutcome {
    if status == Some(HTTP_TOO_MANY_REQUESTS) || message.contains(RATE_LIMIT_MARKER) {
        CompletionOutcome::RateLimited(message)
    } else {
        CompletionOutcome::Failed(message)
    }
}

/// Turns a raw HTTP response into an outcome. `extract` pulls the generated
/// text out of a successful body.
pub fn outcome_from_response(
    status: u16,
    body: &str,
    extract: fn(&Value) -> Option<&str>,
) -> CompletionOutcome {
    if !(200..300).contains(&status) {
        return classify_failure(Some(status), format!("Error code: {} - {}", status, body));
    }

    match serde_json::from_str::<Value>(body) {
        Ok(value) => CompletionOutcome::Success(extract(&value).map(String::from)),
        Err(err) => CompletionOutcome::Failed(format!("Invalid response body: {}", err)),
    }
}

/// Builds the provider named by `provider_override`, else `LLM_PROVIDER`, else
/// the config file, else Groq.
pub fn get_llm(
    config: &Config,
    provider_override: Option<&str>,
) -> Result<Box<dyn LLM>, DocGenError> {
    let llm_provider = match provider_override {
        Some(provider) => provider.to_string(),
        None => env::var("LLM_PROVIDER").unwrap_or_else(|_| {
            config
                .llm_provider
                .clone()
                .unwrap_or_else(|| "groq".to_string())
        }),
    };

    match llm_provider.as_str() {
        "groq" => {
            let api_key = require_env("GROQ_API_KEY")?;
            let model = env::var("GROQ_MODEL").unwrap_or_else(|_| {
                config
                    .groq_model
                    .clone()
                    .unwrap_or_else(|| "llama-3.1-70b-versatile".to_string())
            });
            Ok(Box::new(OpenAI::new("Groq", &api_key, &model, GROQ_URL)))
        }
        "openai" => {
            let api_key = require_env("OPENAI_API_KEY")?;
            let model = env::var("OPENAI_MODEL").unwrap_or_else(|_| {
                config
                    .openai_model
                    .clone()
                    .unwrap_or_else(|| "gpt-4o-mini".to_string())
            });
            let url = env::var("CUSTOM_OPENAI_URL").unwrap_or_else(|_| {
                config
                    .custom_openai_url
                    .clone()
                    .unwrap_or_else(|| OPENAI_URL.to_string())
            });
            Ok(Box::new(OpenAI::new("OpenAI", &api_key, &model, &url)))
        }
        "gemini" => {
            let api_key = require_env("GEMINI_API_KEY")?;
            let model = env::var("GEMINI_MODEL").unwrap_or_else(|_| {
                config
                    .gemini_model
                    .clone()
                    .unwrap_or_else(|| "gemini-1.5-flash".to_string())
            });
            Ok(Box::new(Gemini::new(&api_key, &model, GEMINI_URL)))
        }
        "ollama" => {
            let model = env::var("OLLAMA_MODEL").unwrap_or_else(|_| {
                config
                    .ollama_model
                    .clone()
                    .unwrap_or_else(|| "llama3.1".to_string())
            });
            let url = env::var("OLLAMA_URL").unwrap_or_else(|_| {
                config
                    .ollama_url
                    .clone()
                    .unwrap_or_else(|| OLLAMA_URL.to_string())
            });
            Ok(Box::new(Ollama::new(&model, &url)))
        }
        other => Err(DocGenError::ConfigError(format!(
            "Invalid LLM provider: {}",
            other
        ))),
    }
}

fn require_env(name: &str) -> Result<String, DocGenError> {
    env::var(name).map_err(|_| DocGenError::ConfigError(format!("{} is not set", name)))
}
