//! Workflow documents and the portable export format
//!
//! A document is a named, timestamped canvas graph. Exports carry the
//! graph in sanitized form: connected fields, per-node errors, and
//! transient client state are stripped so an export is reproducible from
//! authored inputs and kept outputs alone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use easel_graph::WorkflowGraph;

use crate::error::{Result, WorkflowError};

/// Export format version understood by this crate
pub const EXPORT_VERSION: &str = "1.0";

/// A stored workflow: a canvas graph plus ownership metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDocument {
    pub id: String,
    /// Owner user id; list queries are scoped to it
    pub owner: String,
    pub name: String,
    /// The canvas graph
    pub data: WorkflowGraph,
    /// Optional preview image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Whether the document is visible through a read-only share link
    pub shared: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowDocument {
    /// Create an empty document with a fresh id and current timestamps
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            owner: owner.into(),
            name: name.into(),
            data: WorkflowGraph::default(),
            thumbnail: None,
            shared: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a document around an existing graph
    pub fn with_graph(
        owner: impl Into<String>,
        name: impl Into<String>,
        data: WorkflowGraph,
    ) -> Self {
        let mut doc = Self::new(owner, name);
        doc.data = data;
        doc
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Portable snapshot of a workflow, suitable for files and sharing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowExport {
    pub version: String,
    pub name: String,
    pub exported_at: DateTime<Utc>,
    pub graph: WorkflowGraph,
}

/// Build a portable export of a document.
///
/// Nodes are sanitized with the same rules as history snapshots: connected
/// mirrors, error fields, and transient client state are dropped; authored
/// fields and kept outputs survive.
pub fn export(doc: &WorkflowDocument) -> WorkflowExport {
    let graph = WorkflowGraph {
        nodes: doc.data.nodes.iter().map(|n| n.sanitized()).collect(),
        edges: doc.data.edges.clone(),
        viewport: doc.data.viewport,
    };
    WorkflowExport {
        version: EXPORT_VERSION.to_string(),
        name: doc.name.clone(),
        exported_at: Utc::now(),
        graph,
    }
}

/// Rebuild a document from an export, owned by `owner`. The document gets
/// a fresh id and current timestamps; the graph (including viewport) is
/// taken as-is. Exports carry no owner: whoever imports becomes the owner.
pub fn import(export: WorkflowExport, owner: impl Into<String>) -> Result<WorkflowDocument> {
    if export.version != EXPORT_VERSION {
        return Err(WorkflowError::UnsupportedVersion(export.version));
    }
    Ok(WorkflowDocument::with_graph(owner, export.name, export.graph))
}

#[cfg(test)]
mod tests {
    use super::*;
    use easel_graph::{GraphBuilder, NodeData, PropagationEngine};

    fn sample_document() -> WorkflowDocument {
        let mut graph = GraphBuilder::new()
            .text_input("t1", "city at night", (0.0, 0.0))
            .image_generate("g1", (250.0, 0.0))
            .connect("t1", "text", "g1", "prompt")
            .viewport(10.0, 20.0, 1.5)
            .build();
        PropagationEngine::new().propagate(&mut graph);
        WorkflowDocument::with_graph("user-1", "Night scenes", graph)
    }

    #[test]
    fn test_export_import_round_trip() {
        let doc = sample_document();
        let exported = export(&doc);

        let json = serde_json::to_string(&exported).unwrap();
        let parsed: WorkflowExport = serde_json::from_str(&json).unwrap();
        let restored = import(parsed, "user-2").unwrap();

        assert_eq!(restored.name, "Night scenes");
        assert_eq!(restored.owner, "user-2");
        assert_eq!(restored.data.nodes.len(), 2);
        assert_eq!(restored.data.edges.len(), 1);
        assert_eq!(restored.data.viewport.x, 10.0);
        assert_eq!(restored.data.viewport.y, 20.0);
        assert_eq!(restored.data.viewport.zoom, 1.5);
        // Fresh identity, same content.
        assert_ne!(restored.id, doc.id);
    }

    #[test]
    fn test_export_strips_connected_fields() {
        let doc = sample_document();
        let exported = export(&doc);

        let gen = exported.graph.find_node("g1").unwrap();
        match &gen.data {
            NodeData::ImageGenerate(data) => {
                assert!(data.connected_prompt.is_empty());
                assert!(data.error.is_empty());
            }
            other => panic!("unexpected node data: {other:?}"),
        }
        // The source document keeps its propagated state.
        match &doc.data.find_node("g1").unwrap().data {
            NodeData::ImageGenerate(data) => {
                assert_eq!(data.connected_prompt, "city at night");
            }
            other => panic!("unexpected node data: {other:?}"),
        }
    }

    #[test]
    fn test_export_serializes_exported_at_camel_case() {
        let exported = export(&sample_document());
        let value = serde_json::to_value(&exported).unwrap();
        assert!(value.get("exportedAt").is_some());
        assert_eq!(value["version"], EXPORT_VERSION);
    }

    #[test]
    fn test_import_rejects_unknown_version() {
        let mut exported = export(&sample_document());
        exported.version = "99.0".to_string();
        assert!(matches!(
            import(exported, "user-1"),
            Err(WorkflowError::UnsupportedVersion(_))
        ));
    }
}
