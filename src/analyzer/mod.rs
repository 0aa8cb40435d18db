mod backoff;

pub use backoff::{BackoffPolicy, Sleeper, TokioSleeper};

use crate::config::Config;
use crate::error::DocGenError;
use crate::llm::{CompletionOutcome, CompletionRequest, LLM};
use crate::utils::collect_files;
use indicatif::ProgressBar;
use log::{error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Returned when the provider answered but without text at the expected field.
/// Carried as a failure, so the markdown shows the could-not-analyze notice.
pub const UNEXPECTED_RESPONSE: &str = "Error: Unexpected response structure.";

/// A file's path and its text, with undecodable bytes dropped.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub path: PathBuf,
    pub content: String,
}

impl AnalysisRequest {
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = fs::read(path)?;
        Ok(AnalysisRequest {
            path: path.to_path_buf(),
            content: decode_discarding_invalid(&bytes),
        })
    }
}

pub fn decode_discarding_invalid(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisResult {
    Documented(String),
    Failed(String),
}

impl AnalysisResult {
    /// Generated documentation or the failure description.
    pub fn text(&self) -> &str {
        match self {
            AnalysisResult::Documented(text) | AnalysisResult::Failed(text) => text,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, AnalysisResult::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentationEntry {
    /// Path relative to the analyzed folder.
    pub path: PathBuf,
    pub result: AnalysisResult,
}

/// Sends files to the completion provider one at a time, backing off and
/// retrying while the provider reports a rate limit.
pub struct RetryingAnalyzer {
    llm: Box<dyn LLM>,
    template: CompletionRequest,
    policy: BackoffPolicy,
    sleeper: Box<dyn Sleeper>,
}

impl RetryingAnalyzer {
    pub fn new(llm: Box<dyn LLM>, config: &Config) -> Self {
        RetryingAnalyzer {
            llm,
            template: CompletionRequest::from_config(config),
            policy: BackoffPolicy::from_config(config),
            sleeper: Box::new(TokioSleeper),
        }
    }

    pub fn with_policy(mut self, policy: BackoffPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Box<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn model_name(&self) -> String {
        self.llm.model_name()
    }

    pub async fn analyze(&self, path: &Path) -> AnalysisResult {
        match AnalysisRequest::read(path) {
            Ok(request) => self.analyze_request(&request).await,
            Err(err) => terminal_failure(path, &err.to_string()),
        }
    }

    pub async fn analyze_request(&self, request: &AnalysisRequest) -> AnalysisResult {
        let completion = self.template.with_source(&request.content);
        let mut retries_remaining = self.policy.max_retries;

        loop {
            match self.llm.complete(&completion).await {
                CompletionOutcome::Success(Some(text)) => return AnalysisResult::Documented(text),
                CompletionOutcome::Success(None) => {
                    error!(
                        "Unexpected response structure for file {}",
                        request.path.display()
                    );
                    return AnalysisResult::Failed(UNEXPECTED_RESPONSE.to_string());
                }
                CompletionOutcome::RateLimited(_) if retries_remaining > 0 => {
                    let retry = self.policy.max_retries - retries_remaining + 1;
                    let wait = self.policy.delay_for(retry);
                    warn!(
                        "Rate limit reached for {}, retrying in {} seconds...",
                        request.path.display(),
                        wait.as_secs()
                    );
                    self.sleeper.sleep(wait).await;
                    retries_remaining -= 1;
                }
                CompletionOutcome::RateLimited(message) | CompletionOutcome::Failed(message) => {
                    return terminal_failure(&request.path, &message);
                }
            }
        }
    }

    /// Analyzes `files` in order. Failures are recorded per entry and never
    /// stop the run.
    pub async fn analyze_files(
        &self,
        root: &Path,
        files: &[PathBuf],
        pb: &ProgressBar,
    ) -> Vec<DocumentationEntry> {
        let mut documentation = Vec::with_capacity(files.len());
        for file in files {
            let relative = file.strip_prefix(root).unwrap_or(file.as_path()).to_path_buf();
            pb.set_message(relative.display().to_string());
            let result = self.analyze(file).await;
            documentation.push(DocumentationEntry {
                path: relative,
                result,
            });
            pb.inc(1);
        }

        let failures = documentation
            .iter()
            .filter(|entry| entry.result.is_failure())
            .count();
        info!(
            "Analyzed {} files, {} failed",
            documentation.len(),
            failures
        );
        documentation
    }

    pub async fn analyze_project_folder(
        &self,
        root: &Path,
        ignore_patterns: &[String],
        pb: &ProgressBar,
    ) -> Result<Vec<DocumentationEntry>, DocGenError> {
        let files = collect_files(root, ignore_patterns)?;
        pb.set_length(files.len() as u64);
        Ok(self.analyze_files(root, &files, pb).await)
    }
}

fn terminal_failure(path: &Path, message: &str) -> AnalysisResult {
    error!("Error analyzing file {}: {}", path.display(), message);
    AnalysisResult::Failed(format!(
        "Error analyzing file {}: {}",
        path.display(),
        message
    ))
}
