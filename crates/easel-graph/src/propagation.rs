//! Propagation engine: keeps connected fields consistent with upstream state
//!
//! After any edge-set change or upstream-output change, every downstream
//! node's connected fields are recomputed so they always mirror current
//! upstream state. Change detection uses a graph signature combining two
//! halves:
//!
//! - the edge signature (id/source/target/handles of every edge)
//! - the node-output signature (every field that can serve as a
//!   propagation source, plus port-shape such as variable ref-image count)
//!
//! Tracking node outputs alone misses newly drawn edges; tracking edges
//! alone misses a re-run upstream node producing a new output on an
//! unchanged edge. Both halves are required.
//!
//! A single `propagate()` call runs passes to a fixed point (bounded by the
//! node count), so multi-hop chains settle within one triggering event and
//! repeated calls on settled state are no-ops.

use log::debug;

use crate::types::WorkflowGraph;

/// Change-detection fingerprint over propagation-relevant graph state
pub type GraphSignature = blake3::Hash;

/// Compute the signature for the current graph state.
///
/// Changes if and only if propagation-relevant state changed: positions,
/// viewport, and authored-but-non-source fields do not contribute.
pub fn graph_signature(graph: &WorkflowGraph) -> GraphSignature {
    let mut hasher = blake3::Hasher::new();

    for edge in &graph.edges {
        hasher.update(edge.id.as_bytes());
        hasher.update(edge.source.as_bytes());
        hasher.update(edge.source_handle.as_bytes());
        hasher.update(edge.target.as_bytes());
        hasher.update(edge.target_handle.as_bytes());
        hasher.update(&[0xff]);
    }
    hasher.update(&[0xfe]);
    for node in &graph.nodes {
        hasher.update(node.id.as_bytes());
        node.data.fingerprint(&mut hasher);
        hasher.update(&[0xff]);
    }

    hasher.finalize()
}

/// Outcome of one `propagate()` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropagationReport {
    /// Whether any node field changed
    pub changed: bool,
    /// Number of passes run (0 on the memoized fast path)
    pub passes: usize,
}

impl PropagationReport {
    fn noop() -> Self {
        Self {
            changed: false,
            passes: 0,
        }
    }
}

/// Recomputes connected fields whenever the graph signature changes.
///
/// Mutates only connected/derived fields, never authored fields, keeping a
/// clear write partition between user edits and propagation.
#[derive(Debug, Default)]
pub struct PropagationEngine {
    last_signature: Option<GraphSignature>,
}

impl PropagationEngine {
    /// Create a new engine with no memoized signature
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the memoized signature, forcing the next call to recompute.
    /// Called when a different document is loaded.
    pub fn reset(&mut self) {
        self.last_signature = None;
    }

    /// Recompute connected fields if the graph signature changed since the
    /// last settled state. Runs passes to a fixed point so multi-hop
    /// chains (A -> B -> C) settle within this one call.
    pub fn propagate(&mut self, graph: &mut WorkflowGraph) -> PropagationReport {
        let signature = graph_signature(graph);
        if self.last_signature == Some(signature) {
            return PropagationReport::noop();
        }

        let max_passes = graph.nodes.len().max(1);
        let mut passes = 0;
        let mut changed_any = false;
        loop {
            passes += 1;
            let changed = propagate_pass(graph);
            changed_any |= changed;
            if !changed || passes >= max_passes {
                break;
            }
        }

        debug!("propagate settled after {passes} pass(es), changed={changed_any}");
        self.last_signature = Some(graph_signature(graph));
        PropagationReport {
            changed: changed_any,
            passes,
        }
    }
}

/// One pass over the current node list.
///
/// For every input port of every node: resolve the inbound edge (if any)
/// through the source node's total resolver and write the value into the
/// port's declared connected field; ports with no inbound edge have their
/// connected field (and dependent outputs) cleared. Values are only
/// written when they actually differ, so a settled pass reports no change.
fn propagate_pass(graph: &mut WorkflowGraph) -> bool {
    let ids: Vec<String> = graph.nodes.iter().map(|n| n.id.clone()).collect();
    let mut changed = false;

    for id in &ids {
        let Some(node) = graph.find_node(id) else {
            continue;
        };
        let ports = node.data.input_ports();
        if ports.is_empty() {
            continue;
        }

        // Resolve against current upstream state before taking the
        // mutable borrow; earlier nodes' writes in this pass are visible.
        let mut resolved: Vec<(String, Option<String>)> = Vec::with_capacity(ports.len());
        for port in &ports {
            match graph.inbound_edge(id, &port.id) {
                Some(edge) => {
                    let value = graph
                        .find_node(&edge.source)
                        .map(|source| source.data.source_value(&edge.source_handle).to_string())
                        .unwrap_or_default();
                    resolved.push((port.id.clone(), Some(value)));
                }
                None => resolved.push((port.id.clone(), None)),
            }
        }

        let Some(node) = graph.find_node_mut(id) else {
            continue;
        };
        for (handle, value) in resolved {
            changed |= match value {
                Some(value) => node.data.set_connected(&handle, &value),
                None => node.data.clear_connected(&handle),
            };
        }
    }

    changed
}
