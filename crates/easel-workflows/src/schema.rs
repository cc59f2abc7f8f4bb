//! Document schema validation and normalization
//!
//! Validates untrusted workflow JSON (imports, shared links, API bodies)
//! before it reaches the graph store. Structural defects in the document
//! shape are hard errors; repairable defects (dangling edges, malformed
//! viewport) are normalized away with a log line instead of failing the
//! whole document.

use log::warn;
use serde_json::Value;

use easel_graph::{Viewport, WorkflowGraph};

/// Outcome of validating a raw document value
#[derive(Debug)]
pub enum Validated {
    /// Document accepted; the graph is normalized and ready for the store
    Valid(WorkflowGraph),
    /// Document rejected; field-level messages
    Invalid(Vec<String>),
}

impl Validated {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validated::Valid(_))
    }

    pub fn into_graph(self) -> Option<WorkflowGraph> {
        match self {
            Validated::Valid(graph) => Some(graph),
            Validated::Invalid(_) => None,
        }
    }
}

/// Validate a raw JSON document against the canvas schema.
///
/// Requires `nodes` and `edges` arrays; every node must parse as a known
/// kind. Edges whose endpoints are missing are dropped, and an absent or
/// malformed `viewport` becomes the identity transform.
pub fn validate(value: &Value) -> Validated {
    let mut errors = Vec::new();

    let Some(obj) = value.as_object() else {
        return Validated::Invalid(vec!["document must be a JSON object".to_string()]);
    };

    match obj.get("nodes") {
        Some(Value::Array(_)) => {}
        Some(_) => errors.push("'nodes' must be an array".to_string()),
        None => errors.push("missing required field 'nodes'".to_string()),
    }
    match obj.get("edges") {
        Some(Value::Array(_)) => {}
        Some(_) => errors.push("'edges' must be an array".to_string()),
        None => errors.push("missing required field 'edges'".to_string()),
    }
    if !errors.is_empty() {
        return Validated::Invalid(errors);
    }

    // Viewport is repairable: strip it before deserializing if malformed.
    let mut candidate = value.clone();
    let viewport_ok = candidate
        .get("viewport")
        .map(|v| serde_json::from_value::<Viewport>(v.clone()).is_ok())
        .unwrap_or(false);
    if !viewport_ok {
        if candidate.get("viewport").is_some() {
            warn!("Replacing malformed viewport with identity transform");
        }
        candidate["viewport"] = serde_json::to_value(Viewport::default())
            .unwrap_or(Value::Null);
    }

    let mut graph: WorkflowGraph = match serde_json::from_value(candidate) {
        Ok(graph) => graph,
        Err(err) => {
            return Validated::Invalid(vec![format!("document failed to parse: {err}")]);
        }
    };

    let dropped = normalize_edges(&mut graph);
    if dropped > 0 {
        warn!("Dropped {dropped} edge(s) with missing endpoints during validation");
    }

    Validated::Valid(graph)
}

/// Drop edges whose endpoints are not present; returns the number dropped
fn normalize_edges(graph: &mut WorkflowGraph) -> usize {
    let node_ids: std::collections::HashSet<&str> =
        graph.nodes.iter().map(|n| n.id.as_str()).collect();
    let before = graph.edges.len();
    graph
        .edges
        .retain(|edge| node_ids.contains(edge.source.as_str()) && node_ids.contains(edge.target.as_str()));
    before - graph.edges.len()
}
