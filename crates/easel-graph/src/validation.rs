//! Structural validation for canvas graphs
//!
//! Validates edge references, handle existence, port kind compatibility,
//! input cardinality, and detects cycles. Returns all errors found, not
//! just the first.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::types::WorkflowGraph;

/// Validation error with location context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Cycle detected in the graph; data propagation over a cycle has no
    /// settled meaning
    CycleDetected,
    /// Two nodes share an id
    DuplicateNodeId { node_id: String },
    /// An edge references a non-existent node
    UnknownNode { edge_id: String, node_id: String },
    /// An edge references a handle its endpoint does not expose
    UnknownHandle {
        edge_id: String,
        node_id: String,
        handle: String,
    },
    /// An edge connects a node to itself
    SelfLoop { edge_id: String },
    /// An edge connects incompatible port kinds
    IncompatiblePortKinds {
        edge_id: String,
        source_kind: String,
        target_kind: String,
    },
    /// More than one edge targets the same single-connection input handle
    MultipleInboundEdges { node_id: String, handle: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CycleDetected => write!(f, "Cycle detected in graph"),
            Self::DuplicateNodeId { node_id } => {
                write!(f, "Duplicate node id '{node_id}'")
            }
            Self::UnknownNode { edge_id, node_id } => {
                write!(f, "Edge '{edge_id}' references unknown node '{node_id}'")
            }
            Self::UnknownHandle {
                edge_id,
                node_id,
                handle,
            } => {
                write!(
                    f,
                    "Edge '{edge_id}' references unknown handle '{handle}' on node '{node_id}'"
                )
            }
            Self::SelfLoop { edge_id } => {
                write!(f, "Edge '{edge_id}' connects a node to itself")
            }
            Self::IncompatiblePortKinds {
                edge_id,
                source_kind,
                target_kind,
            } => {
                write!(
                    f,
                    "Edge '{edge_id}' connects incompatible kinds: {source_kind} -> {target_kind}"
                )
            }
            Self::MultipleInboundEdges { node_id, handle } => {
                write!(
                    f,
                    "Handle '{handle}' on node '{node_id}' has multiple inbound edges"
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a canvas graph, returning every error found
pub fn validate_graph(graph: &WorkflowGraph) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    validate_node_ids(graph, &mut errors);
    validate_edges(graph, &mut errors);
    validate_input_cardinality(graph, &mut errors);
    detect_cycles(graph, &mut errors);

    errors
}

fn validate_node_ids(graph: &WorkflowGraph, errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    for node in &graph.nodes {
        if !seen.insert(node.id.as_str()) {
            errors.push(ValidationError::DuplicateNodeId {
                node_id: node.id.clone(),
            });
        }
    }
}

fn validate_edges(graph: &WorkflowGraph, errors: &mut Vec<ValidationError>) {
    for edge in &graph.edges {
        if edge.source == edge.target {
            errors.push(ValidationError::SelfLoop {
                edge_id: edge.id.clone(),
            });
            continue;
        }

        let source = graph.find_node(&edge.source);
        let target = graph.find_node(&edge.target);
        if source.is_none() {
            errors.push(ValidationError::UnknownNode {
                edge_id: edge.id.clone(),
                node_id: edge.source.clone(),
            });
        }
        if target.is_none() {
            errors.push(ValidationError::UnknownNode {
                edge_id: edge.id.clone(),
                node_id: edge.target.clone(),
            });
        }
        let (Some(source), Some(target)) = (source, target) else {
            continue;
        };

        let source_port = source.data.output_port(&edge.source_handle);
        if source_port.is_none() {
            errors.push(ValidationError::UnknownHandle {
                edge_id: edge.id.clone(),
                node_id: edge.source.clone(),
                handle: edge.source_handle.clone(),
            });
        }
        let target_port = target.data.input_port(&edge.target_handle);
        if target_port.is_none() {
            errors.push(ValidationError::UnknownHandle {
                edge_id: edge.id.clone(),
                node_id: edge.target.clone(),
                handle: edge.target_handle.clone(),
            });
        }

        if let (Some(sp), Some(tp)) = (source_port, target_port) {
            if !sp.kind.is_compatible_with(&tp.kind) {
                errors.push(ValidationError::IncompatiblePortKinds {
                    edge_id: edge.id.clone(),
                    source_kind: format!("{:?}", sp.kind),
                    target_kind: format!("{:?}", tp.kind),
                });
            }
        }
    }
}

fn validate_input_cardinality(graph: &WorkflowGraph, errors: &mut Vec<ValidationError>) {
    let mut inbound: HashMap<(&str, &str), usize> = HashMap::new();
    for edge in &graph.edges {
        *inbound
            .entry((edge.target.as_str(), edge.target_handle.as_str()))
            .or_insert(0) += 1;
    }
    for ((node_id, handle), count) in inbound {
        if count > 1 {
            errors.push(ValidationError::MultipleInboundEdges {
                node_id: node_id.to_string(),
                handle: handle.to_string(),
            });
        }
    }
}

/// Detect cycles using Kahn's algorithm (topological sort)
fn detect_cycles(graph: &WorkflowGraph, errors: &mut Vec<ValidationError>) {
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    for node in &graph.nodes {
        in_degree.insert(&node.id, 0);
    }
    for edge in &graph.edges {
        if let Some(deg) = in_degree.get_mut(edge.target.as_str()) {
            *deg += 1;
        }
    }

    let mut queue: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(&id, _)| id)
        .collect();

    let mut visited = 0;
    while let Some(node_id) = queue.pop_front() {
        visited += 1;
        for edge in &graph.edges {
            if edge.source == node_id {
                if let Some(deg) = in_degree.get_mut(edge.target.as_str()) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(&edge.target);
                    }
                }
            }
        }
    }

    if visited < graph.nodes.len() {
        errors.push(ValidationError::CycleDetected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;

    #[test]
    fn test_valid_graph() {
        let graph = GraphBuilder::new()
            .text_input("a", "x", (0.0, 0.0))
            .image_generate("b", (200.0, 0.0))
            .connect("a", "text", "b", "prompt")
            .build();

        assert!(validate_graph(&graph).is_empty());
    }

    #[test]
    fn test_edge_to_missing_node() {
        let graph = GraphBuilder::new()
            .text_input("a", "x", (0.0, 0.0))
            .connect("a", "text", "ghost", "prompt")
            .build();

        let errors = validate_graph(&graph);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::UnknownNode { .. })));
    }

    #[test]
    fn test_incompatible_kinds() {
        let graph = GraphBuilder::new()
            .video_generate("v", (0.0, 0.0))
            .describe_image("d", (200.0, 0.0))
            .connect("v", "video", "d", "image")
            .build();

        let errors = validate_graph(&graph);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::IncompatiblePortKinds { .. })));
    }

    #[test]
    fn test_unknown_handle() {
        let graph = GraphBuilder::new()
            .text_input("a", "x", (0.0, 0.0))
            .image_generate("b", (200.0, 0.0))
            .connect("a", "audio", "b", "prompt")
            .build();

        let errors = validate_graph(&graph);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::UnknownHandle { .. })));
    }

    #[test]
    fn test_duplicate_inbound_edges() {
        let graph = GraphBuilder::new()
            .text_input("a", "x", (0.0, 0.0))
            .text_input("b", "y", (0.0, 100.0))
            .image_generate("c", (200.0, 0.0))
            .connect("a", "text", "c", "prompt")
            .connect("b", "text", "c", "prompt")
            .build();

        let errors = validate_graph(&graph);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::MultipleInboundEdges { .. })));
    }

    #[test]
    fn test_detect_cycle() {
        let graph = GraphBuilder::new()
            .image_filter("f1", "sepia", (0.0, 0.0))
            .image_filter("f2", "blur", (200.0, 0.0))
            .connect("f1", "image", "f2", "image")
            .connect("f2", "image", "f1", "image")
            .build();

        let errors = validate_graph(&graph);
        assert!(errors.contains(&ValidationError::CycleDetected));
    }

    #[test]
    fn test_collects_multiple_errors() {
        let graph = GraphBuilder::new()
            .text_input("a", "x", (0.0, 0.0))
            .edge("e1", "a", "text", "a", "text")
            .connect("ghost", "text", "a", "text")
            .build();

        let errors = validate_graph(&graph);
        assert!(errors.len() >= 2);
    }
}
