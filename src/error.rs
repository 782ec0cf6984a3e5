use thiserror::Error;

/// Main error type for kgqa
#[derive(Error, Debug)]
pub enum KgqaError {
    /// No known entity could be located in the question
    #[error("No known entity found in query: {0}. Please clarify.")]
    EntityNotFound(String),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Embedding model errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Graph exchange format errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenient Result type using KgqaError
pub type Result<T> = std::result::Result<T, KgqaError>;
