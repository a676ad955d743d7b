/// Domain-specific error types for the auction engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience type alias.
pub type EngineResult<T> = Result<T, EngineError>;
