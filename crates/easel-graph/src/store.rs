//! Graph store: the authoritative mutable state for one open workflow
//!
//! All mutations are synchronous and validate-then-apply, so no partial
//! state is ever observable. Connection attempts that violate the port
//! rules are rejected without mutating anything; the rejection reason is
//! returned for logging but the gesture simply does not complete.

use log::{debug, warn};
use serde_json::Value;

use crate::error::Result;
use crate::node_data::{NodeData, NodeKind};
use crate::types::{
    EdgeId, GraphEdge, GraphNode, NodeId, NodeStyle, Position, Viewport, WorkflowGraph,
};

/// Why an attempted edge connection was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeRejection {
    /// Source and target are the same node
    SelfLoop,
    /// An endpoint node does not exist
    UnknownNode(NodeId),
    /// The named handle does not exist on the endpoint node
    UnknownHandle { node_id: NodeId, handle: String },
    /// The target handle already has an inbound edge (inputs are
    /// single-connection)
    HandleOccupied { node_id: NodeId, handle: String },
    /// The source and target port kinds cannot be connected
    IncompatibleKinds { source: String, target: String },
    /// An edge with this id already exists
    DuplicateEdgeId(EdgeId),
}

impl std::fmt::Display for EdgeRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelfLoop => write!(f, "Edge connects a node to itself"),
            Self::UnknownNode(id) => write!(f, "Edge references unknown node '{id}'"),
            Self::UnknownHandle { node_id, handle } => {
                write!(f, "Node '{node_id}' has no handle '{handle}'")
            }
            Self::HandleOccupied { node_id, handle } => {
                write!(f, "Handle '{handle}' on node '{node_id}' is already connected")
            }
            Self::IncompatibleKinds { source, target } => {
                write!(f, "Incompatible port kinds: {source} -> {target}")
            }
            Self::DuplicateEdgeId(id) => write!(f, "Edge id '{id}' already exists"),
        }
    }
}

/// Authoritative node/edge/viewport state for one open workflow
#[derive(Debug, Default)]
pub struct GraphStore {
    graph: WorkflowGraph,
}

impl GraphStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt an existing graph, dropping any dangling edges it carries
    pub fn from_graph(graph: WorkflowGraph) -> Self {
        let mut store = Self { graph };
        store.normalize();
        store
    }

    /// The current graph state
    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    /// Mutable graph access for the propagation engine and node runner.
    ///
    /// Those collaborators only write connected/derived and output fields;
    /// user edits go through the store's own mutation primitives.
    pub fn graph_mut(&mut self) -> &mut WorkflowGraph {
        &mut self.graph
    }

    /// Consume the store, yielding the graph
    pub fn into_graph(self) -> WorkflowGraph {
        self.graph
    }

    /// Add a node. Rejected (returns false) if the id is already taken.
    pub fn add_node(&mut self, node: GraphNode) -> bool {
        if self.graph.find_node(&node.id).is_some() {
            warn!("add_node rejected: id '{}' already exists", node.id);
            return false;
        }
        debug!("add_node {} ({})", node.id, node.kind());
        self.graph.nodes.push(node);
        true
    }

    /// Create a node of `kind` with default data at `position`, returning
    /// its generated id
    pub fn spawn_node(&mut self, kind: NodeKind, position: Position) -> NodeId {
        let id = format!("{}-{}", kind.as_str(), uuid::Uuid::new_v4());
        self.graph.nodes.push(GraphNode::new(
            id.clone(),
            NodeData::default_for(kind),
            position,
        ));
        id
    }

    /// Remove a node, cascading to every edge that references it as source
    /// or target. Returns the removed node, if it existed.
    pub fn remove_node(&mut self, id: &str) -> Option<GraphNode> {
        let pos = self.graph.nodes.iter().position(|n| n.id == id)?;
        let node = self.graph.nodes.remove(pos);
        let before = self.graph.edges.len();
        self.graph
            .edges
            .retain(|e| e.source != id && e.target != id);
        debug!(
            "remove_node {} cascaded {} edge(s)",
            id,
            before - self.graph.edges.len()
        );
        Some(node)
    }

    /// Shallow-merge `patch` into node `id`'s data.
    ///
    /// Keys naming connected/derived fields are dropped from the patch:
    /// those fields are owned by the propagation engine and must never be
    /// hand-edited. Returns whether the merge produced any actual value
    /// difference; an all-equal merge is a no-op and signals no change.
    pub fn update_node_data(&mut self, id: &str, patch: &Value) -> Result<bool> {
        let Some(node) = self.graph.find_node_mut(id) else {
            return Ok(false);
        };
        let Some(patch_obj) = patch.as_object() else {
            return Ok(false);
        };

        let mut merged = match node.data.to_value()? {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        for (key, value) in patch_obj {
            if NodeData::is_connected_field(key) {
                warn!("update_node_data: ignoring connected field '{key}' in patch");
                continue;
            }
            merged.insert(key.clone(), value.clone());
        }

        let mut next = NodeData::from_value(node.kind(), Value::Object(merged))?;
        next.carry_transient_from(&node.data);
        if next == node.data {
            return Ok(false);
        }
        node.data = next;
        Ok(true)
    }

    /// Move a node to a new position
    pub fn move_node(&mut self, id: &str, position: Position) -> bool {
        match self.graph.find_node_mut(id) {
            Some(node) if node.position != position => {
                node.position = position;
                true
            }
            _ => false,
        }
    }

    /// Resize a node (groups, notes)
    pub fn resize_node(&mut self, id: &str, style: NodeStyle) -> bool {
        match self.graph.find_node_mut(id) {
            Some(node) if node.style != Some(style) => {
                node.style = Some(style);
                true
            }
            _ => false,
        }
    }

    /// Set the viewport camera transform
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.graph.viewport = viewport;
    }

    /// Expose one more reference-image port on an image-generate node.
    ///
    /// Already-populated connected slots are untouched; edges can attach
    /// to the new handle immediately.
    pub fn add_ref_image_port(&mut self, id: &str) -> bool {
        match self.graph.find_node_mut(id) {
            Some(GraphNode {
                data: NodeData::ImageGenerate(d),
                ..
            }) => {
                d.ref_image_count += 1;
                debug!("add_ref_image_port {} -> {}", id, d.ref_image_count);
                true
            }
            _ => false,
        }
    }

    /// Attempt to add an edge. On rejection nothing is mutated.
    pub fn add_edge(&mut self, edge: GraphEdge) -> std::result::Result<(), EdgeRejection> {
        if let Err(rejection) = self.check_edge(&edge) {
            warn!("add_edge rejected: {rejection}");
            return Err(rejection);
        }
        debug!(
            "add_edge {}: {}.{} -> {}.{}",
            edge.id, edge.source, edge.source_handle, edge.target, edge.target_handle
        );
        self.graph.edges.push(edge);
        Ok(())
    }

    /// Connect two nodes, generating the edge id
    pub fn connect(
        &mut self,
        source: &str,
        source_handle: &str,
        target: &str,
        target_handle: &str,
    ) -> std::result::Result<EdgeId, EdgeRejection> {
        let id = format!("edge-{}", uuid::Uuid::new_v4());
        self.add_edge(GraphEdge::new(
            id.clone(),
            source,
            source_handle,
            target,
            target_handle,
        ))?;
        Ok(id)
    }

    /// Remove an edge by id
    pub fn remove_edge(&mut self, id: &str) -> bool {
        let before = self.graph.edges.len();
        self.graph.edges.retain(|e| e.id != id);
        before != self.graph.edges.len()
    }

    /// Drop edges with a dangling endpoint. Returns how many were dropped.
    pub fn normalize(&mut self) -> usize {
        let ids: std::collections::HashSet<&str> =
            self.graph.nodes.iter().map(|n| n.id.as_str()).collect();
        let before = self.graph.edges.len();
        self.graph
            .edges
            .retain(|e| ids.contains(e.source.as_str()) && ids.contains(e.target.as_str()));
        let dropped = before - self.graph.edges.len();
        if dropped > 0 {
            warn!("normalize dropped {dropped} dangling edge(s)");
        }
        dropped
    }

    fn check_edge(&self, edge: &GraphEdge) -> std::result::Result<(), EdgeRejection> {
        if edge.source == edge.target {
            return Err(EdgeRejection::SelfLoop);
        }
        if self.graph.edges.iter().any(|e| e.id == edge.id) {
            return Err(EdgeRejection::DuplicateEdgeId(edge.id.clone()));
        }
        let source = self
            .graph
            .find_node(&edge.source)
            .ok_or_else(|| EdgeRejection::UnknownNode(edge.source.clone()))?;
        let target = self
            .graph
            .find_node(&edge.target)
            .ok_or_else(|| EdgeRejection::UnknownNode(edge.target.clone()))?;

        let source_port =
            source
                .data
                .output_port(&edge.source_handle)
                .ok_or_else(|| EdgeRejection::UnknownHandle {
                    node_id: edge.source.clone(),
                    handle: edge.source_handle.clone(),
                })?;
        let target_port =
            target
                .data
                .input_port(&edge.target_handle)
                .ok_or_else(|| EdgeRejection::UnknownHandle {
                    node_id: edge.target.clone(),
                    handle: edge.target_handle.clone(),
                })?;

        if self
            .graph
            .inbound_edge(&edge.target, &edge.target_handle)
            .is_some()
        {
            return Err(EdgeRejection::HandleOccupied {
                node_id: edge.target.clone(),
                handle: edge.target_handle.clone(),
            });
        }

        if !source_port.kind.is_compatible_with(&target_port.kind) {
            return Err(EdgeRejection::IncompatibleKinds {
                source: format!("{:?}", source_port.kind),
                target: format!("{:?}", target_port.kind),
            });
        }

        Ok(())
    }
}
