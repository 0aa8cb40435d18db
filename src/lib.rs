pub mod analyzer;
pub mod archive;
pub mod config;
pub mod documentation;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod utils;

pub use analyzer::{AnalysisResult, DocumentationEntry, RetryingAnalyzer};
pub use config::Config;
pub use error::DocGenError;
pub use llm::LLM;
