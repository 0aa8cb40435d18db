use crate::error::DocGenError;
use log::{debug, info};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use tempfile::TempDir;
use zip::ZipArchive;

/// A zip archive extracted into a temporary directory owned by this value.
/// The directory and everything in it is removed on drop, including when
/// extraction fails halfway.
pub struct ExtractedArchive {
    dir: TempDir,
}

impl ExtractedArchive {
    pub fn extract(archive_path: &Path) -> Result<Self, DocGenError> {
        info!("Extracting {}", archive_path.display());
        let file = File::open(archive_path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self, DocGenError> {
        let dir = tempfile::Builder::new().prefix("code-docgen-").tempdir()?;
        let mut archive = ZipArchive::new(reader)?;
        debug!(
            "Archive holds {} entries, extracting into {}",
            archive.len(),
            dir.path().display()
        );
        // Entries whose names escape the target directory are rejected here.
        archive.extract(dir.path())?;
        Ok(ExtractedArchive { dir })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn zip_of(files: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in files {
            writer
                .start_file(name.to_string(), SimpleFileOptions::default())
                .unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn extracts_nested_entries() {
        let bytes = zip_of(&[("src/main.py", "print(1)"), ("README.md", "# hi")]);

        let extracted = ExtractedArchive::from_reader(Cursor::new(bytes)).unwrap();

        let main = std::fs::read_to_string(extracted.root().join("src/main.py")).unwrap();
        assert_eq!(main, "print(1)");
        assert!(extracted.root().join("README.md").is_file());
    }

    #[test]
    fn directory_is_removed_on_drop() {
        let bytes = zip_of(&[("a.txt", "a")]);
        let extracted = ExtractedArchive::from_reader(Cursor::new(bytes)).unwrap();
        let root = extracted.root().to_path_buf();
        assert!(root.exists());

        drop(extracted);

        assert!(!root.exists());
    }

    #[test]
    fn corrupt_archive_is_an_archive_error() {
        let result = ExtractedArchive::from_reader(Cursor::new(b"not a zip".to_vec()));
        assert!(matches!(result, Err(DocGenError::ArchiveError(_))));
    }

    #[test]
    fn escaping_entry_is_rejected() {
        let bytes = zip_of(&[("../evil.txt", "x")]);
        assert!(ExtractedArchive::from_reader(Cursor::new(bytes)).is_err());
    }

    #[test]
    fn missing_archive_is_an_io_error() {
        let result = ExtractedArchive::extract(Path::new("/no/such/upload.zip"));
        assert!(matches!(result, Err(DocGenError::IoError(_))));
    }
}
