use crate::error::DocGenError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Every regular file under `dir`, in the order the file system reports
/// directory entries. Paths matching `ignore_patterns` (globs, tested against
/// the path relative to `dir` and each of its components) are skipped along
/// with everything beneath them.
pub fn collect_files(dir: &Path, ignore_patterns: &[String]) -> Result<Vec<PathBuf>, DocGenError> {
    let ignore_set = create_ignore_set(ignore_patterns)?;

    info!("Starting to collect files from: {:?}", dir);
    debug!("Ignore patterns: {:?}", ignore_patterns);

    let files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_entry(|entry| {
            let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
            relative.as_os_str().is_empty() || !is_ignored(relative, &ignore_set)
        })
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Error accessing entry: {:?}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();

    info!("Collected {} files", files.len());
    Ok(files)
}

fn create_ignore_set(patterns: &[String]) -> Result<GlobSet, DocGenError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

fn is_ignored(path: &Path, ignore_set: &GlobSet) -> bool {
    ignore_set.is_match(path) || path.components().any(|c| ignore_set.is_match(c.as_os_str()))
}

/// Name declared by a `Cargo.toml` or `package.json` at the top of `dir`, or
/// of its only subdirectory when the archive wraps the project in a folder.
pub fn get_project_name(dir: &Path) -> Option<String> {
    declared_name(dir).or_else(|| single_subdirectory(dir).and_then(|sub| declared_name(&sub)))
}

fn declared_name(dir: &Path) -> Option<String> {
    if let Ok(content) = fs::read_to_string(dir.join("Cargo.toml")) {
        if let Ok(toml) = content.parse::<toml::Value>() {
            if let Some(name) = toml
                .get("package")
                .and_then(|package| package.get("name"))
                .and_then(|name| name.as_str())
            {
                return Some(name.to_string());
            }
        }
    }

    if let Ok(content) = fs::read_to_string(dir.join("package.json")) {
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(&content) {
            if let Some(name) = json.get("name").and_then(|name| name.as_str()) {
                return Some(name.to_string());
            }
        }
    }

    None
}

fn single_subdirectory(dir: &Path) -> Option<PathBuf> {
    let mut entries = fs::read_dir(dir).ok()?.filter_map(|e| e.ok());
    let only = entries.next()?;
    if entries.next().is_some() || !only.file_type().ok()?.is_dir() {
        return None;
    }
    Some(only.path())
}
