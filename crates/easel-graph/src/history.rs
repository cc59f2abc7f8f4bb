//! Undo/redo over sanitized, compressed graph snapshots
//!
//! Linear history with two bounded stacks (`past`/`future`); a new snapshot
//! invalidates redo history. Snapshots are sanitized before cloning:
//! connected/derived fields, error state, and transient local-resource
//! references are stripped, since the propagation engine re-derives them
//! deterministically right after a restore. Stripping them keeps snapshots
//! small and avoids restoring values that may have gone stale.
//!
//! Snapshots are zstd-compressed serialized state; compression is fast and
//! effective on the JSON-shaped node data, and no inverse operation has to
//! be implemented per mutation.
//!
//! History is client-local only: it is never persisted, and [`HistoryManager::clear`]
//! is called when switching documents so history cannot leak across them.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::types::{GraphEdge, GraphNode};

/// Default maximum number of undo steps
pub const DEFAULT_HISTORY_DEPTH: usize = 50;

/// A restorable graph state: nodes and edges, without viewport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphState {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Linear undo/redo stack over compressed snapshots
pub struct HistoryManager {
    past: VecDeque<Vec<u8>>,
    future: VecDeque<Vec<u8>>,
    max_depth: usize,
}

impl HistoryManager {
    /// Create a manager with the default depth
    pub fn new() -> Self {
        Self::with_depth(DEFAULT_HISTORY_DEPTH)
    }

    /// Create a manager bounded to `max_depth` snapshots per stack
    pub fn with_depth(max_depth: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: VecDeque::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Record the pre-mutation state. Call before applying a user action.
    ///
    /// Evicts the oldest entry once the bound is exceeded and clears the
    /// redo stack: a new action invalidates redo history.
    pub fn take_snapshot(&mut self, nodes: &[GraphNode], edges: &[GraphEdge]) -> Result<()> {
        let encoded = encode(nodes, edges)?;
        self.past.push_back(encoded);
        while self.past.len() > self.max_depth {
            self.past.pop_front();
        }
        self.future.clear();
        Ok(())
    }

    /// Step back one snapshot.
    ///
    /// The current state is pushed (sanitized) onto the redo stack and the
    /// most recent past state is returned for restoration. `None` when
    /// there is nothing to undo.
    pub fn undo(
        &mut self,
        current_nodes: &[GraphNode],
        current_edges: &[GraphEdge],
    ) -> Option<Result<GraphState>> {
        let snapshot = self.past.pop_back()?;
        Some(self.swap(snapshot, current_nodes, current_edges, Stack::Future))
    }

    /// Step forward one snapshot; mirror of [`HistoryManager::undo`]
    pub fn redo(
        &mut self,
        current_nodes: &[GraphNode],
        current_edges: &[GraphEdge],
    ) -> Option<Result<GraphState>> {
        let snapshot = self.future.pop_back()?;
        Some(self.swap(snapshot, current_nodes, current_edges, Stack::Past))
    }

    /// Empty both stacks. Called when switching to a different document.
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    /// Whether undo is available
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    /// Whether redo is available
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Number of undo steps currently available
    pub fn depth(&self) -> usize {
        self.past.len()
    }

    /// Total compressed size of all held snapshots, in bytes
    pub fn compressed_size(&self) -> usize {
        self.past.iter().chain(self.future.iter()).map(Vec::len).sum()
    }

    fn swap(
        &mut self,
        snapshot: Vec<u8>,
        current_nodes: &[GraphNode],
        current_edges: &[GraphEdge],
        push_to: Stack,
    ) -> Result<GraphState> {
        let current = encode(current_nodes, current_edges)?;
        let stack = match push_to {
            Stack::Past => &mut self.past,
            Stack::Future => &mut self.future,
        };
        stack.push_back(current);
        while stack.len() > self.max_depth {
            stack.pop_front();
        }
        decode(&snapshot)
    }
}

enum Stack {
    Past,
    Future,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new()
    }
}

fn encode(nodes: &[GraphNode], edges: &[GraphEdge]) -> Result<Vec<u8>> {
    let state = GraphState {
        nodes: nodes.iter().map(GraphNode::sanitized).collect(),
        edges: edges.to_vec(),
    };
    let json = serde_json::to_vec(&state)?;
    zstd::encode_all(&json[..], 3).map_err(|e| EngineError::Compression(e.to_string()))
}

fn decode(bytes: &[u8]) -> Result<GraphState> {
    let json = zstd::decode_all(bytes).map_err(|e| EngineError::Compression(e.to_string()))?;
    Ok(serde_json::from_slice(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::node_data::NodeData;
    use crate::types::WorkflowGraph;

    fn sample_graph(text: &str) -> WorkflowGraph {
        GraphBuilder::new()
            .text_input("a", text, (0.0, 0.0))
            .image_generate("b", (200.0, 0.0))
            .connect("a", "text", "b", "prompt")
            .build()
    }

    #[test]
    fn test_undo_redo_roundtrip() {
        let mut history = HistoryManager::new();
        let before = sample_graph("first");

        history.take_snapshot(&before.nodes, &before.edges).unwrap();
        let after = sample_graph("second");

        let restored = history.undo(&after.nodes, &after.edges).unwrap().unwrap();
        match &restored.nodes[0].data {
            NodeData::TextInput(d) => assert_eq!(d.text, "first"),
            _ => unreachable!(),
        }
        assert_eq!(restored.edges, before.edges);

        let redone = history
            .redo(&restored.nodes, &restored.edges)
            .unwrap()
            .unwrap();
        match &redone.nodes[0].data {
            NodeData::TextInput(d) => assert_eq!(d.text, "second"),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_undo_on_empty_history_is_noop() {
        let mut history = HistoryManager::new();
        let graph = sample_graph("x");
        assert!(history.undo(&graph.nodes, &graph.edges).is_none());
        assert!(!history.can_undo());
    }

    #[test]
    fn test_snapshot_strips_connected_fields() {
        let mut graph = sample_graph("a prompt");
        if let NodeData::ImageGenerate(d) = &mut graph.find_node_mut("b").unwrap().data {
            d.connected_prompt = "a prompt".to_string();
            d.error = "old failure".to_string();
        }

        let mut history = HistoryManager::new();
        history.take_snapshot(&graph.nodes, &graph.edges).unwrap();
        let current = sample_graph("changed");
        let restored = history.undo(&current.nodes, &current.edges).unwrap().unwrap();

        match &restored.nodes[1].data {
            NodeData::ImageGenerate(d) => {
                assert!(d.connected_prompt.is_empty());
                assert!(d.error.is_empty());
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_bounded_depth_evicts_oldest() {
        let mut history = HistoryManager::with_depth(3);
        for i in 0..5 {
            let graph = sample_graph(&format!("state-{i}"));
            history.take_snapshot(&graph.nodes, &graph.edges).unwrap();
        }
        assert_eq!(history.depth(), 3);

        // Only the three newest snapshots survive; the deepest undo is state-2.
        let current = sample_graph("live");
        let mut last = None;
        let mut steps = 0;
        let mut nodes = current.nodes.clone();
        let mut edges = current.edges.clone();
        while let Some(state) = history.undo(&nodes, &edges) {
            let state = state.unwrap();
            nodes = state.nodes.clone();
            edges = state.edges.clone();
            last = Some(state);
            steps += 1;
        }
        assert_eq!(steps, 3);
        match &last.unwrap().nodes[0].data {
            NodeData::TextInput(d) => assert_eq!(d.text, "state-2"),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_new_snapshot_clears_redo() {
        let mut history = HistoryManager::new();
        let g1 = sample_graph("one");
        history.take_snapshot(&g1.nodes, &g1.edges).unwrap();

        let g2 = sample_graph("two");
        history.undo(&g2.nodes, &g2.edges).unwrap().unwrap();
        assert!(history.can_redo());

        let g3 = sample_graph("three");
        history.take_snapshot(&g3.nodes, &g3.edges).unwrap();
        assert!(!history.can_redo());
    }

    #[test]
    fn test_clear_empties_both_stacks() {
        let mut history = HistoryManager::new();
        let g = sample_graph("x");
        history.take_snapshot(&g.nodes, &g.edges).unwrap();
        history.undo(&g.nodes, &g.edges).unwrap().unwrap();

        history.clear();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(history.compressed_size(), 0);
    }
}
