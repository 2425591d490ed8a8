use thiserror::Error;

pub type Result<T> = std::result::Result<T, TaskdeckError>;

#[derive(Debug, Error)]
pub enum TaskdeckError {
    #[error("Board not found: {0}")]
    BoardNotFound(String),

    #[error("Column not found: {column} (board {board})")]
    ColumnNotFound { board: String, column: String },

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Storage quota exceeded writing '{key}': {size} bytes, quota {quota} bytes")]
    QuotaExceeded {
        key: String,
        size: usize,
        quota: usize,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
