use thiserror::Error;

/// Gemini chat errors
#[derive(Error, Debug)]
pub enum GeminiError {
    #[error("Configuration Error: {0}")]
    ConfigError(String),

    #[error("Request Error: {0}")]
    RequestError(String),

    #[error("HTTP Error: {status_code} - {message}")]
    HttpError { status_code: u16, message: String },

    #[error("Parsing Error: {0}")]
    ParsingError(String),

    #[error("Attachment Error: {0}")]
    AttachmentError(String),

    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),

    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

impl GeminiError {
    /// True for failures that happened on the way to or from the API,
    /// as opposed to local setup problems.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            GeminiError::RequestError(_)
                | GeminiError::HttpError { .. }
                | GeminiError::ParsingError(_)
        )
    }
}

/// Result type for Gemini operations
pub type GeminiResult<T> = Result<T, GeminiError>;
