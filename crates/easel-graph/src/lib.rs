//! Easel Graph - node canvas engine for generative-media workflows
//!
//! This crate holds the editing core of the Easel canvas: the graph of
//! generation/editing nodes, the propagation engine that keeps connected
//! input fields mirroring upstream outputs, and snapshot-based undo/redo.
//!
//! - `GraphStore`: authoritative node/edge/viewport state with atomic,
//!   validate-then-apply mutations
//! - `PropagationEngine`: signature-memoized, fixed-point recomputation of
//!   connected fields after edge or output changes
//! - `HistoryManager`: bounded linear undo/redo over sanitized, compressed
//!   snapshots
//! - `NodeRunner`: per-node on-demand execution against an external
//!   generation collaborator, with stale-completion discard
//!
//! # Example
//!
//! ```ignore
//! use easel_graph::{GraphBuilder, PropagationEngine};
//!
//! let mut graph = GraphBuilder::new()
//!     .text_input("prompt-1", "a lighthouse at dusk", (0.0, 0.0))
//!     .image_generate("gen-1", (250.0, 0.0))
//!     .connect("prompt-1", "text", "gen-1", "prompt")
//!     .build();
//!
//! PropagationEngine::new().propagate(&mut graph);
//! ```

pub mod builder;
pub mod error;
pub mod events;
pub mod execution;
pub mod groups;
pub mod history;
pub mod node_data;
pub mod propagation;
pub mod registry;
pub mod store;
pub mod types;
pub mod validation;

// Re-export key types
pub use builder::GraphBuilder;
pub use error::{EngineError, Result};
pub use events::{EngineEvent, EventSink, NullEventSink, VecEventSink};
pub use execution::{
    GenerationClient, GenerationRequest, GenerationResponse, NodeRunner, PendingRun, RunOutcome,
};
pub use history::{GraphState, HistoryManager, DEFAULT_HISTORY_DEPTH};
pub use node_data::{NodeData, NodeKind};
pub use propagation::{graph_signature, PropagationEngine, PropagationReport};
pub use registry::{NodeCategory, NodeDescriptor, NodeRegistry};
pub use store::{EdgeRejection, GraphStore};
pub use types::{
    GraphEdge, GraphNode, NodeStyle, PortKind, PortSpec, Position, Viewport, WorkflowGraph,
};
pub use validation::{validate_graph, ValidationError};
