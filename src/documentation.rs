use crate::analyzer::{AnalysisResult, DocumentationEntry};
use crate::config::Config;
use crate::error::DocGenError;
use log::info;
use std::fs;
use std::path::PathBuf;

pub const ANALYSIS_FAILED_NOTICE: &str =
    "**Error**: Could not analyze this file due to rate limiting or other issues.";

pub fn format_documentation(entry: &DocumentationEntry) -> String {
    let overview = match &entry.result {
        AnalysisResult::Documented(text) => text.as_str(),
        AnalysisResult::Failed(_) => ANALYSIS_FAILED_NOTICE,
    };

    format!(
        r#"
# Documentation for {path}

## Description
The file is analyzed to extract key information and provide a detailed explanation of its functionality.

## Code Overview
{overview}

## Key Functions and Classes
- [Function/Class Name]: Brief description of purpose and functionality.

## Dependencies (if applicable)
List any dependencies or external libraries used within the file.

## Usage
Provide example usages or instructions for using any code components in the file.

## Notes
Any additional notes, such as limitations, edge cases, or special considerations.
"#,
        path = entry.path.display(),
        overview = overview,
    )
}

pub fn render_documentation(entries: &[DocumentationEntry]) -> String {
    entries.iter().map(format_documentation).collect()
}

/// Writes the rendered entries under the configured output directory and
/// returns the file's path, or `None` when there is nothing to write.
pub fn write_documentation(
    entries: &[DocumentationEntry],
    config: &Config,
    project_name: &str,
) -> Result<Option<PathBuf>, DocGenError> {
    let output_path = config.get_output_path();
    let target = output_path.join(config.get_output_filename(project_name));
    write_documentation_to(entries, target)
}

pub fn write_documentation_to(
    entries: &[DocumentationEntry],
    target: PathBuf,
) -> Result<Option<PathBuf>, DocGenError> {
    if entries.is_empty() {
        info!("No documentation entries, nothing written");
        return Ok(None);
    }

    info!("Writing documentation for {} files...", entries.len());
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&target, render_documentation(entries))?;
    Ok(Some(target))
}
