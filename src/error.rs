use std::fmt;

#[derive(Debug)]
pub enum DocGenError {
    IoError(std::io::Error),
    ConfigError(String),
    ArchiveError(String),
}

impl std::error::Error for DocGenError {}

impl fmt::Display for DocGenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DocGenError::IoError(err) => write!(f, "IO error: {}", err),
            DocGenError::ConfigError(err) => write!(f, "Configuration error: {}", err),
            DocGenError::ArchiveError(err) => write!(f, "Archive error: {}", err),
        }
    }
}

impl From<std::io::Error> for DocGenError {
    fn from(err: std::io::Error) -> Self {
        DocGenError::IoError(err)
    }
}

impl From<toml::de::Error> for DocGenError {
    fn from(err: toml::de::Error) -> Self {
        DocGenError::ConfigError(err.to_string())
    }
}

impl From<zip::result::ZipError> for DocGenError {
    fn from(err: zip::result::ZipError) -> Self {
        DocGenError::ArchiveError(err.to_string())
    }
}

impl From<globset::Error> for DocGenError {
    fn from(err: globset::Error) -> Self {
        DocGenError::ConfigError(err.to_string())
    }
}
