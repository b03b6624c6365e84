use thiserror::Error;

/// Error taxonomy for the indexer. Fatal variants (`Discovery`, `ProjectSetup`,
/// `Configuration`) abort the run; everything else is collected into
/// `IndexResult.errors` by the orchestrator and the run continues.
#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("discovery failed: {0}")]
    Discovery(String),

    #[error("parse error in {file}: {message}")]
    Parse { file: String, message: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("project/language setup failed: {0}")]
    ProjectSetup(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("symbol not found: {0}")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),
}

impl IndexerError {
    /// Fatal errors abort the run; everything else is accumulated.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            IndexerError::Discovery(_) | IndexerError::ProjectSetup(_) | IndexerError::Configuration(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, IndexerError>;
