//! Core types for canvas graphs
//!
//! These types define the structure of a canvas workflow graph:
//! nodes, edges, ports, and the viewport camera.

use serde::{Deserialize, Serialize};

use crate::node_data::{NodeData, NodeKind};

/// Unique identifier for a node
pub type NodeId = String;

/// Unique identifier for an edge
pub type EdgeId = String;

/// Unique identifier for a port (handle)
pub type PortId = String;

/// The kind of value flowing through a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortKind {
    /// Accepts any kind
    Any,
    /// Prompt or other plain text
    Text,
    /// Image URL
    Image,
    /// Video URL
    Video,
    /// Audio URL
    Audio,
    /// Mask image URL (alpha/selection mask)
    Mask,
}

impl PortKind {
    /// Check whether a source port of this kind may connect to a target port
    /// of `other` kind.
    pub fn is_compatible_with(&self, other: &PortKind) -> bool {
        if matches!(self, PortKind::Any) || matches!(other, PortKind::Any) {
            return true;
        }

        // A mask is an image; masking tools can feed image inputs.
        if matches!(self, PortKind::Mask) && matches!(other, PortKind::Image) {
            return true;
        }

        self == other
    }
}

/// Declaration of a single port on a node instance.
///
/// Ports are declared by the node's data variant (see [`NodeData`]), so the
/// mapping from a target handle to the connected field it writes is fixed at
/// the type level rather than inferred from a name prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortSpec {
    /// Handle id as it appears on edges (e.g. "prompt", "ref_image_0")
    pub id: PortId,
    /// Kind of value the port carries
    pub kind: PortKind,
    /// Whether execution requires this input to be present
    pub required: bool,
}

impl PortSpec {
    /// Create a required port
    pub fn required(id: impl Into<String>, kind: PortKind) -> Self {
        Self {
            id: id.into(),
            kind,
            required: true,
        }
    }

    /// Create an optional port
    pub fn optional(id: impl Into<String>, kind: PortKind) -> Self {
        Self {
            id: id.into(),
            kind,
            required: false,
        }
    }
}

/// 2D canvas position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width/height styling for resizable nodes (groups, notes)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStyle {
    pub width: f64,
    pub height: f64,
}

/// Camera transform for the canvas, persisted with the graph
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

/// An edge connecting a source node's output handle to a target node's
/// input handle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    /// Unique identifier for this edge
    pub id: EdgeId,
    /// Source node ID
    pub source: NodeId,
    /// Source port ID
    pub source_handle: PortId,
    /// Target node ID
    pub target: NodeId,
    /// Target port ID
    pub target_handle: PortId,
}

impl GraphEdge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        source_handle: impl Into<String>,
        target: impl Into<String>,
        target_handle: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            source_handle: source_handle.into(),
            target: target.into(),
            target_handle: target_handle.into(),
        }
    }
}

/// A node instance on the canvas
///
/// The `data` variant carries the node's typed fields and doubles as the
/// kind discriminator; the wire shape is `{id, type, position, data, style?}`.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    /// Unique identifier, stable for the node's lifetime
    pub id: NodeId,
    /// Typed per-kind data (authored, connected, output fields)
    pub data: NodeData,
    /// Position on the canvas
    pub position: Position,
    /// Optional width/height styling
    pub style: Option<NodeStyle>,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, data: NodeData, position: Position) -> Self {
        Self {
            id: id.into(),
            data,
            position,
            style: None,
        }
    }

    /// The node kind discriminator
    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    /// Copy of this node with connected/derived and transient fields
    /// stripped. Shared by history snapshots and document export.
    pub fn sanitized(&self) -> GraphNode {
        GraphNode {
            id: self.id.clone(),
            data: self.data.sanitized(),
            position: self.position,
            style: self.style,
        }
    }
}

/// Wire representation of a node; `data` stays untyped until the kind
/// discriminator has been read.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNode {
    id: NodeId,
    #[serde(rename = "type")]
    kind: NodeKind,
    position: Position,
    #[serde(default)]
    data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    style: Option<NodeStyle>,
}

impl Serialize for GraphNode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let raw = RawNode {
            id: self.id.clone(),
            kind: self.data.kind(),
            position: self.position,
            data: self.data.to_value().map_err(serde::ser::Error::custom)?,
            style: self.style,
        };
        raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for GraphNode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawNode::deserialize(deserializer)?;
        let data = NodeData::from_value(raw.kind, raw.data).map_err(serde::de::Error::custom)?;
        Ok(GraphNode {
            id: raw.id,
            data,
            position: raw.position,
            style: raw.style,
        })
    }
}

/// A complete canvas graph: the state the store owns for one open workflow
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowGraph {
    /// Nodes on the canvas
    pub nodes: Vec<GraphNode>,
    /// Edges connecting nodes
    pub edges: Vec<GraphEdge>,
    /// Camera transform
    #[serde(default)]
    pub viewport: Viewport,
}

impl WorkflowGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a node by ID
    pub fn find_node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Find a node by ID (mutable)
    pub fn find_node_mut(&mut self, id: &str) -> Option<&mut GraphNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Edges coming into a node
    pub fn incoming_edges<'a>(
        &'a self,
        node_id: &'a str,
    ) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |e| e.target == node_id)
    }

    /// Edges going out of a node
    pub fn outgoing_edges<'a>(
        &'a self,
        node_id: &'a str,
    ) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |e| e.source == node_id)
    }

    /// The inbound edge for a specific target handle, if any.
    ///
    /// Input ports are single-connection, so at most one edge matches.
    pub fn inbound_edge(&self, node_id: &str, target_handle: &str) -> Option<&GraphEdge> {
        self.edges
            .iter()
            .find(|e| e.target == node_id && e.target_handle == target_handle)
    }

    /// IDs of nodes this node depends on (upstream)
    pub fn dependencies(&self, node_id: &str) -> Vec<NodeId> {
        self.incoming_edges(node_id)
            .map(|e| e.source.clone())
            .collect()
    }

    /// IDs of nodes that depend on this node (downstream)
    pub fn dependents(&self, node_id: &str) -> Vec<NodeId> {
        self.outgoing_edges(node_id)
            .map(|e| e.target.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node_data::TextInputData;

    #[test]
    fn test_port_kind_compatibility() {
        assert!(PortKind::Any.is_compatible_with(&PortKind::Text));
        assert!(PortKind::Image.is_compatible_with(&PortKind::Any));
        assert!(PortKind::Mask.is_compatible_with(&PortKind::Image));
        assert!(!PortKind::Image.is_compatible_with(&PortKind::Mask));
        assert!(!PortKind::Video.is_compatible_with(&PortKind::Text));
    }

    #[test]
    fn test_viewport_default() {
        let vp = Viewport::default();
        assert_eq!(vp.x, 0.0);
        assert_eq!(vp.y, 0.0);
        assert_eq!(vp.zoom, 1.0);
    }

    #[test]
    fn test_graph_edges() {
        let mut graph = WorkflowGraph::new();
        graph.nodes.push(GraphNode::new(
            "node1",
            NodeData::TextInput(TextInputData {
                text: "hello".into(),
            }),
            Position::new(0.0, 0.0),
        ));
        graph.nodes.push(GraphNode::new(
            "node2",
            NodeData::TextInput(TextInputData::default()),
            Position::new(100.0, 0.0),
        ));
        graph
            .edges
            .push(GraphEdge::new("edge1", "node1", "text", "node2", "text"));

        assert_eq!(graph.dependencies("node2"), vec!["node1"]);
        assert_eq!(graph.dependents("node1"), vec!["node2"]);
        assert!(graph.inbound_edge("node2", "text").is_some());
        assert!(graph.inbound_edge("node2", "image").is_none());
    }

    #[test]
    fn test_node_serde_roundtrip() {
        let node = GraphNode::new(
            "n1",
            NodeData::TextInput(TextInputData {
                text: "sunset over water".into(),
            }),
            Position::new(10.0, 20.0),
        );

        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "text-input");
        assert_eq!(json["data"]["text"], "sunset over water");

        let restored: GraphNode = serde_json::from_value(json).unwrap();
        assert_eq!(restored, node);
    }
}
