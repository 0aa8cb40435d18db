use async_trait::async_trait;
use code_docgen::analyzer::{AnalysisResult, RetryingAnalyzer};
use code_docgen::archive::ExtractedArchive;
use code_docgen::config::Config;
use code_docgen::documentation::ANALYSIS_FAILED_NOTICE;
use code_docgen::llm::{CompletionOutcome, CompletionRequest, LLM};
use code_docgen::pipeline::document_archive;
use code_docgen::DocGenError;
use indicatif::ProgressBar;
use mockall::mock;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::tempdir;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

mock! {
    pub Provider {}

    #[async_trait]
    impl LLM for Provider {
        async fn complete(&self, request: &CompletionRequest) -> CompletionOutcome;
        fn model_name(&self) -> String;
    }
}

fn write_zip(path: &Path, files: &[(&str, &str)]) {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in files {
        writer
            .start_file(name.to_string(), SimpleFileOptions::default())
            .unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }
    let bytes = writer.finish().unwrap().into_inner();
    fs::write(path, bytes).unwrap();
}

/// Fails permanently for sources containing "BROKEN", documents the rest.
fn scripted_provider() -> MockProvider {
    let mut provider = MockProvider::new();
    provider.expect_complete().returning(|request| {
        if request.user_prompt.contains("BROKEN") {
            CompletionOutcome::Failed("Error code: 400 - context length exceeded".to_string())
        } else {
            CompletionOutcome::Success(Some("Prints a greeting.".to_string()))
        }
    });
    provider
}

#[tokio::test]
async fn two_file_archive_yields_one_error_block_and_one_documentation_block() {
    let tmp = tempdir().unwrap();
    let archive = tmp.path().join("upload.zip");
    write_zip(
        &archive,
        &[("hello.py", "print('hello')"), ("broken.py", "BROKEN")],
    );
    let output = tmp.path().join("docs/documentation.md");

    let config = Config::default();
    let analyzer = RetryingAnalyzer::new(Box::new(scripted_provider()), &config);

    let run = document_archive(
        &archive,
        &analyzer,
        &config,
        Some(output.clone()),
        &ProgressBar::hidden(),
    )
    .await
    .unwrap();

    assert_eq!(run.project_name, "upload");
    assert_eq!(run.entries.len(), 2);

    // Entries come in file-system order, unsorted and undeduplicated.
    let relisted = ExtractedArchive::extract(&archive).unwrap();
    let walk_order: Vec<PathBuf> = WalkDir::new(relisted.root())
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(relisted.root()).unwrap().to_path_buf())
        .collect();
    let paths: Vec<PathBuf> = run.entries.iter().map(|e| e.path.clone()).collect();
    assert_eq!(paths, walk_order);
    let mut sorted = paths.clone();
    sorted.sort();
    assert_eq!(sorted, vec![PathBuf::from("broken.py"), PathBuf::from("hello.py")]);

    for entry in &run.entries {
        if entry.path == Path::new("broken.py") {
            assert!(entry.result.is_failure());
            assert!(entry
                .result
                .text()
                .contains("Error code: 400 - context length exceeded"));
        } else {
            assert_eq!(
                entry.result,
                AnalysisResult::Documented("Prints a greeting.".to_string())
            );
        }
    }

    assert_eq!(run.output.as_deref(), Some(output.as_path()));
    let markdown = fs::read_to_string(&output).unwrap();
    assert_eq!(markdown.matches(ANALYSIS_FAILED_NOTICE).count(), 1);
    assert_eq!(markdown.matches("Prints a greeting.").count(), 1);
    assert_eq!(markdown.matches("# Documentation for ").count(), 2);

    // Blocks follow the traversal order of the entries.
    let first = markdown
        .find(&format!("# Documentation for {}", run.entries[0].path.display()))
        .unwrap();
    let second = markdown
        .find(&format!("# Documentation for {}", run.entries[1].path.display()))
        .unwrap();
    assert!(first < second);
}

#[tokio::test]
async fn corrupt_archive_aborts_before_any_call() {
    let tmp = tempdir().unwrap();
    let archive = tmp.path().join("upload.zip");
    fs::write(&archive, b"definitely not a zip").unwrap();
    let output = tmp.path().join("documentation.md");

    let mut provider = MockProvider::new();
    provider.expect_complete().times(0);
    let config = Config::default();
    let analyzer = RetryingAnalyzer::new(Box::new(provider), &config);

    let result = document_archive(
        &archive,
        &analyzer,
        &config,
        Some(output.clone()),
        &ProgressBar::hidden(),
    )
    .await;

    assert!(matches!(result, Err(DocGenError::ArchiveError(_))));
    assert!(!output.exists());
}

#[tokio::test]
async fn project_name_comes_from_the_archived_manifest() {
    let tmp = tempdir().unwrap();
    let archive = tmp.path().join("upload.zip");
    write_zip(
        &archive,
        &[(
            "Cargo.toml",
            "[package]\nname = \"widget\"\nversion = \"0.1.0\"\n",
        )],
    );

    let config = Config {
        output_path: Some(tmp.path().to_string_lossy().into_owned()),
        output_filename_format: Some("{project}-docs.md".to_string()),
        ..Config::default()
    };
    let analyzer = RetryingAnalyzer::new(Box::new(scripted_provider()), &config);

    let run = document_archive(&archive, &analyzer, &config, None, &ProgressBar::hidden())
        .await
        .unwrap();

    assert_eq!(run.project_name, "widget");
    assert_eq!(run.output, Some(tmp.path().join("widget-docs.md")));
}

#[tokio::test]
async fn manifest_name_cannot_steer_output_outside_the_output_directory() {
    let tmp = tempdir().unwrap();
    let archive = tmp.path().join("upload.zip");
    write_zip(&archive, &[("package.json", r#"{"name":"../../escaped"}"#)]);
    let out_dir = tmp.path().join("nested/out");

    let config = Config {
        output_path: Some(out_dir.to_string_lossy().into_owned()),
        output_filename_format: Some("{project}-docs.md".to_string()),
        ..Config::default()
    };
    let analyzer = RetryingAnalyzer::new(Box::new(scripted_provider()), &config);

    let run = document_archive(&archive, &analyzer, &config, None, &ProgressBar::hidden())
        .await
        .unwrap();

    let written = run.output.unwrap();
    assert_eq!(written.parent(), Some(out_dir.as_path()));
    assert!(written.is_file());
    assert!(!tmp.path().join("escaped-docs.md").exists());
}
