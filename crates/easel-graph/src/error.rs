//! Error types for the graph engine

use thiserror::Error;

/// Result type alias using EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur in the graph engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// A node id was not found in the graph
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// Run was triggered on a node kind with no Run action
    #[error("Node '{node_id}' ({kind}) is not runnable")]
    NotRunnable { node_id: String, kind: String },

    /// A required input was missing or empty at Run time
    #[error("Missing required input '{port}' on node '{node_id}'")]
    MissingInput { node_id: String, port: String },

    /// The generation collaborator failed before producing an envelope
    #[error("Generation call failed: {0}")]
    Generation(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Snapshot compression error
    #[error("Compression error: {0}")]
    Compression(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Create a missing-input error
    pub fn missing_input(node_id: impl Into<String>, port: impl Into<String>) -> Self {
        Self::MissingInput {
            node_id: node_id.into(),
            port: port.into(),
        }
    }
}
