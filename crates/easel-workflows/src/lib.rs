//! Easel Workflows - document layer over the canvas graph engine
//!
//! Wraps [`easel_graph`] graphs in named, timestamped documents:
//! schema validation for untrusted JSON, sanitized export/import, and a
//! CRUD service over a pluggable async storage gateway.

pub mod document;
pub mod error;
pub mod schema;
pub mod service;

pub use document::{export, import, WorkflowDocument, WorkflowExport, EXPORT_VERSION};
pub use error::{Result, WorkflowError};
pub use schema::{validate, Validated};
pub use service::{MemoryStorage, WorkflowPatch, WorkflowService, WorkflowStorage};
