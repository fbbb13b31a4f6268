use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF extraction error: {0}")]
    PdfExtraction(String),
    #[error("Embedding error: {0}")]
    Embedding(String),
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("Speech recognition model not found at {0}")]
    ModelNotFound(String),
    #[error("Voice I/O error: {0}")]
    Voice(String),
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("No document loaded")]
    NoDocument,
}

impl From<lopdf::Error> for AssistantError {
    fn from(e: lopdf::Error) -> Self {
        AssistantError::PdfExtraction(e.to_string())
    }
}

impl From<pdf_extract::OutputError> for AssistantError {
    fn from(e: pdf_extract::OutputError) -> Self {
        AssistantError::PdfExtraction(e.to_string())
    }
}

impl From<figment::Error> for AssistantError {
    fn from(e: figment::Error) -> Self {
        AssistantError::Config(Box::new(e))
    }
}

pub type Result<T> = std::result::Result<T, AssistantError>;
