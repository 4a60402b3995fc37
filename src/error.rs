use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransubError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Audio extraction failed: {0}")]
    AudioExtraction(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Failed to write {}: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Translation failed: {0}")]
    Translation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid file type: {0}")]
    InvalidFileType(String),

    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid subtitle data: {0}")]
    Subtitle(String),

    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransubError {
    pub(crate) fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TransubError::FileWrite {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransubError>;
