//! Error types for workflow documents and storage

use thiserror::Error;

/// Error type for document and storage operations
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Workflow not found: {0}")]
    NotFound(String),

    #[error("Invalid workflow document: {0}")]
    InvalidDocument(String),

    #[error("Unsupported export version: {0}")]
    UnsupportedVersion(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, WorkflowError>;
