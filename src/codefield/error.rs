use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodefieldError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Bridge error: {0}")]
    Bridge(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("{0}")]
    Validation(String),

    #[error("Editor document error: {0}")]
    EditorDocument(String),
}

pub type Result<T> = std::result::Result<T, CodefieldError>;
