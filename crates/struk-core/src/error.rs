//! Error types for Struk

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The model answered, but no usable JSON object could be found in its reply
    #[error("Malformed model output: {0}")]
    MalformedModelOutput(String),

    /// Network failure, timeout, or model-side error while extracting
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// True for failures that originate from the image-understanding model
    pub fn is_extraction_error(&self) -> bool {
        matches!(
            self,
            Error::MalformedModelOutput(_) | Error::ExtractionFailed(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
