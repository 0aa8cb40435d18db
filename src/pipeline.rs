use crate::analyzer::{DocumentationEntry, RetryingAnalyzer};
use crate::archive::ExtractedArchive;
use crate::config::Config;
use crate::documentation::{write_documentation, write_documentation_to};
use crate::error::DocGenError;
use crate::utils::get_project_name;
use indicatif::ProgressBar;
use log::{error, info};
use std::path::{Path, PathBuf};

pub struct DocumentationRun {
    pub project_name: String,
    pub entries: Vec<DocumentationEntry>,
    /// Where the markdown landed; `None` when the archive held no files.
    pub output: Option<PathBuf>,
}

/// Extracts `archive`, analyzes every file in it and writes the markdown.
/// The extraction directory is gone by the time this returns.
pub async fn document_archive(
    archive: &Path,
    analyzer: &RetryingAnalyzer,
    config: &Config,
    output: Option<PathBuf>,
    pb: &ProgressBar,
) -> Result<DocumentationRun, DocGenError> {
    let extracted = ExtractedArchive::extract(archive).map_err(|e| {
        error!("Error processing zip file: {}", e);
        e
    })?;

    let project_name = get_project_name(extracted.root())
        .or_else(|| {
            archive
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(String::from)
        })
        .unwrap_or_else(|| "project".to_string());
    info!("Analyzing project {}", project_name);

    let entries = analyzer
        .analyze_project_folder(extracted.root(), &config.get_ignore_patterns(), pb)
        .await?;

    let output = match output {
        Some(target) => write_documentation_to(&entries, target)?,
        None => write_documentation(&entries, config, &project_name)?,
    };

    Ok(DocumentationRun {
        project_name,
        entries,
        output,
    })
}
