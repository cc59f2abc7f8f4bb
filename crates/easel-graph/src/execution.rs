//! Node execution adapter
//!
//! On an explicit user Run, the runner gathers the node's effective inputs,
//! validates them, invokes the external generation collaborator, and writes
//! the results back into the node's output fields (which immediately feed
//! the propagation engine for downstream nodes).
//!
//! Input gathering prefers a fresh direct lookup of the immediate source
//! node's current data over the node's own cached connected fields, so a
//! Run triggered before a pending propagation pass has settled still sees
//! current upstream state.
//!
//! Each node carries a monotonic invocation counter; a completion is
//! applied only while its counter matches the node's current one, so a
//! result that arrives after a newer Run was issued (or after the node was
//! deleted) is discarded instead of producing a late write. There is no
//! mutual exclusion: concurrent Runs on one node are independent attempts.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::events::{EngineEvent, EventSink, NullEventSink};
use crate::node_data::{NodeData, NodeKind, HANDLE_PROMPT};
use crate::types::{NodeId, WorkflowGraph};

/// Resolved inputs for one generation/processing call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// The node being run
    pub node_id: NodeId,
    /// Node kind, selecting the collaborator-side model/tool
    pub kind: NodeKind,
    /// Effective input values keyed by port id, plus authored parameters
    pub inputs: BTreeMap<String, String>,
}

/// Response envelope from the generation collaborator; opaque beyond this
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    pub success: bool,
    /// Output values keyed by output handle id
    #[serde(default)]
    pub outputs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerationResponse {
    /// A successful response with a single output
    pub fn output(handle: impl Into<String>, value: impl Into<String>) -> Self {
        let mut outputs = BTreeMap::new();
        outputs.insert(handle.into(), value.into());
        Self {
            success: true,
            outputs,
            error: None,
        }
    }

    /// A failed response with a human-readable message
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            outputs: BTreeMap::new(),
            error: Some(message.into()),
        }
    }
}

/// External generation/processing collaborator
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Perform one generation call. At most one call is made per Run.
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse>;
}

/// A Run that has been validated and assigned an invocation number
#[derive(Debug, Clone)]
pub struct PendingRun {
    /// The node being run
    pub node_id: NodeId,
    /// This run's invocation number
    pub invocation: u64,
    /// The request to hand to the collaborator
    pub request: GenerationRequest,
}

/// How a completion was applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Outputs were written to the node
    Completed,
    /// The collaborator reported failure; the node's error field is set
    /// and prior outputs are kept
    Failed(String),
    /// A newer invocation superseded this one (or the node was deleted);
    /// the result was discarded
    Superseded,
}

/// Executes nodes against a generation collaborator
pub struct NodeRunner {
    client: Arc<dyn GenerationClient>,
    sink: Arc<dyn EventSink>,
    invocations: HashMap<NodeId, u64>,
}

impl NodeRunner {
    /// Create a runner with no event sink
    pub fn new(client: Arc<dyn GenerationClient>) -> Self {
        Self {
            client,
            sink: Arc::new(NullEventSink),
            invocations: HashMap::new(),
        }
    }

    /// Attach an event sink for run progress events
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Validate a Run and allocate its invocation number.
    ///
    /// Fails when the node is missing, not runnable, or a required input
    /// is empty after resolution; a validation failure is terminal for
    /// this invocation and is never retried automatically.
    pub fn begin(&mut self, graph: &WorkflowGraph, node_id: &str) -> Result<PendingRun> {
        let node = graph
            .find_node(node_id)
            .ok_or_else(|| EngineError::NodeNotFound(node_id.to_string()))?;
        if !node.data.is_runnable() {
            return Err(EngineError::NotRunnable {
                node_id: node_id.to_string(),
                kind: node.kind().to_string(),
            });
        }

        let inputs = gather_inputs(graph, node_id)?;
        let invocation = self
            .invocations
            .entry(node_id.to_string())
            .and_modify(|n| *n += 1)
            .or_insert(1);
        let invocation = *invocation;

        debug!("run {} invocation {}", node_id, invocation);
        let _ = self.sink.send(EngineEvent::RunStarted {
            node_id: node_id.to_string(),
            invocation,
        });

        Ok(PendingRun {
            node_id: node_id.to_string(),
            invocation,
            request: GenerationRequest {
                node_id: node_id.to_string(),
                kind: node.kind(),
                inputs,
            },
        })
    }

    /// Apply a completion if its invocation is still current.
    ///
    /// Stale completions (a newer Run started, or the node is gone) are
    /// discarded. On failure the node's error field is set and prior
    /// outputs are left untouched.
    pub fn complete(
        &mut self,
        graph: &mut WorkflowGraph,
        pending: &PendingRun,
        response: GenerationResponse,
    ) -> RunOutcome {
        let current = self.invocations.get(&pending.node_id).copied();
        if current != Some(pending.invocation) {
            warn!(
                "discarding stale completion for {} (invocation {} superseded)",
                pending.node_id, pending.invocation
            );
            let _ = self.sink.send(EngineEvent::RunSuperseded {
                node_id: pending.node_id.clone(),
                invocation: pending.invocation,
            });
            return RunOutcome::Superseded;
        }
        let Some(node) = graph.find_node_mut(&pending.node_id) else {
            let _ = self.sink.send(EngineEvent::RunSuperseded {
                node_id: pending.node_id.clone(),
                invocation: pending.invocation,
            });
            return RunOutcome::Superseded;
        };

        if response.success && !response.outputs.is_empty() {
            node.data.apply_outputs(&response.outputs);
            let _ = self.sink.send(EngineEvent::RunCompleted {
                node_id: pending.node_id.clone(),
                invocation: pending.invocation,
            });
            RunOutcome::Completed
        } else {
            let message = response
                .error
                .unwrap_or_else(|| "generation returned no usable output".to_string());
            node.data.set_error(&message);
            let _ = self.sink.send(EngineEvent::RunFailed {
                node_id: pending.node_id.clone(),
                invocation: pending.invocation,
                error: message.clone(),
            });
            RunOutcome::Failed(message)
        }
    }

    /// Run a node end to end: validate, call the collaborator, apply.
    ///
    /// A collaborator transport error is treated like a failed envelope:
    /// it becomes the node's inline error rather than propagating.
    pub async fn run(&mut self, graph: &mut WorkflowGraph, node_id: &str) -> Result<RunOutcome> {
        let pending = match self.begin(graph, node_id) {
            Ok(pending) => pending,
            Err(err) => {
                if let Some(node) = graph.find_node_mut(node_id) {
                    node.data.set_error(&err.to_string());
                }
                let _ = self.sink.send(EngineEvent::RunFailed {
                    node_id: node_id.to_string(),
                    invocation: self.invocations.get(node_id).copied().unwrap_or(0),
                    error: err.to_string(),
                });
                return Err(err);
            }
        };

        let response = match self.client.generate(pending.request.clone()).await {
            Ok(response) => response,
            Err(err) => GenerationResponse::failed(err.to_string()),
        };

        Ok(self.complete(graph, &pending, response))
    }
}

/// Gather a node's effective inputs.
///
/// For each declared input port: a connected edge is resolved directly
/// against the source node's current data (fresh), falling back to the
/// cached connected field when no edge is present; a prompt port further
/// falls back to the authored prompt. Authored parameters (aspect ratio,
/// filter settings) ride along under their own keys.
fn gather_inputs(graph: &WorkflowGraph, node_id: &str) -> Result<BTreeMap<String, String>> {
    let node = graph
        .find_node(node_id)
        .ok_or_else(|| EngineError::NodeNotFound(node_id.to_string()))?;

    let mut inputs = BTreeMap::new();
    for port in node.data.input_ports() {
        let fresh = graph.inbound_edge(node_id, &port.id).and_then(|edge| {
            graph
                .find_node(&edge.source)
                .map(|source| source.data.source_value(&edge.source_handle).to_string())
        });
        let mut value = fresh.unwrap_or_else(|| node.data.connected_value(&port.id).to_string());

        if value.is_empty() && port.id == HANDLE_PROMPT {
            value = match &node.data {
                NodeData::ImageGenerate(d) => d.prompt.clone(),
                NodeData::VideoGenerate(d) => d.prompt.clone(),
                _ => String::new(),
            };
        }

        if port.required && value.is_empty() {
            return Err(EngineError::missing_input(node_id, port.id));
        }
        if !value.is_empty() {
            inputs.insert(port.id, value);
        }
    }

    match &node.data {
        NodeData::ImageGenerate(d) => {
            inputs.insert("aspect_ratio".to_string(), d.aspect_ratio.clone());
        }
        NodeData::ImageFilter(d) => {
            inputs.insert("filter".to_string(), d.filter.clone());
            inputs.insert("strength".to_string(), d.strength.to_string());
        }
        _ => {}
    }

    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::events::VecEventSink;
    use crate::propagation::PropagationEngine;

    /// Client that always returns the same response and records requests
    struct FixedClient {
        response: GenerationResponse,
        requests: std::sync::Mutex<Vec<GenerationRequest>>,
    }

    impl FixedClient {
        fn new(response: GenerationResponse) -> Arc<Self> {
            Arc::new(Self {
                response,
                requests: std::sync::Mutex::new(Vec::new()),
            })
        }

        fn last_request(&self) -> GenerationRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl GenerationClient for FixedClient {
        async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse> {
            self.requests.lock().unwrap().push(request);
            Ok(self.response.clone())
        }
    }

    /// Client whose call always errors at the transport level
    struct BrokenClient;

    #[async_trait]
    impl GenerationClient for BrokenClient {
        async fn generate(&self, _request: GenerationRequest) -> Result<GenerationResponse> {
            Err(EngineError::Generation("connection reset".to_string()))
        }
    }

    fn prompt_graph() -> WorkflowGraph {
        GraphBuilder::new()
            .text_input("prompt-1", "a lighthouse at dusk", (0.0, 0.0))
            .image_generate("gen-1", (200.0, 0.0))
            .connect("prompt-1", "text", "gen-1", "prompt")
            .build()
    }

    #[tokio::test]
    async fn test_successful_run_writes_output_and_feeds_propagation() {
        let mut graph = GraphBuilder::new()
            .text_input("prompt-1", "a lighthouse", (0.0, 0.0))
            .image_generate("gen-1", (200.0, 0.0))
            .describe_image("desc-1", (400.0, 0.0))
            .connect("prompt-1", "text", "gen-1", "prompt")
            .connect("gen-1", "image", "desc-1", "image")
            .build();

        let client = FixedClient::new(GenerationResponse::output("image", "img://generated.png"));
        let mut runner = NodeRunner::new(client.clone());

        let outcome = runner.run(&mut graph, "gen-1").await.unwrap();
        assert_eq!(outcome, RunOutcome::Completed);
        match &graph.find_node("gen-1").unwrap().data {
            NodeData::ImageGenerate(d) => assert_eq!(d.image_output, "img://generated.png"),
            _ => unreachable!(),
        }

        // The new output immediately reaches the downstream node.
        PropagationEngine::new().propagate(&mut graph);
        match &graph.find_node("desc-1").unwrap().data {
            NodeData::DescribeImage(d) => assert_eq!(d.connected_image, "img://generated.png"),
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_inputs_prefer_fresh_source_over_cached_connected() {
        let mut graph = prompt_graph();
        // A stale cached value from an unsettled propagation pass.
        graph
            .find_node_mut("gen-1")
            .unwrap()
            .data
            .set_connected("prompt", "an old prompt");

        let client = FixedClient::new(GenerationResponse::output("image", "img://x.png"));
        let mut runner = NodeRunner::new(client.clone());
        runner.run(&mut graph, "gen-1").await.unwrap();

        assert_eq!(
            client.last_request().inputs.get("prompt").unwrap(),
            "a lighthouse at dusk"
        );
    }

    #[tokio::test]
    async fn test_authored_prompt_fallback_without_edge() {
        let mut graph = GraphBuilder::new().image_generate("gen-1", (0.0, 0.0)).build();
        if let NodeData::ImageGenerate(d) = &mut graph.find_node_mut("gen-1").unwrap().data {
            d.prompt = "hand-typed prompt".to_string();
        }

        let client = FixedClient::new(GenerationResponse::output("image", "img://x.png"));
        let mut runner = NodeRunner::new(client.clone());
        runner.run(&mut graph, "gen-1").await.unwrap();
        assert_eq!(
            client.last_request().inputs.get("prompt").unwrap(),
            "hand-typed prompt"
        );
    }

    #[tokio::test]
    async fn test_missing_required_input_is_terminal() {
        let mut graph = GraphBuilder::new().image_generate("gen-1", (0.0, 0.0)).build();

        let client = FixedClient::new(GenerationResponse::output("image", "img://x.png"));
        let mut runner = NodeRunner::new(client.clone());
        let err = runner.run(&mut graph, "gen-1").await.unwrap_err();
        assert!(matches!(err, EngineError::MissingInput { .. }));

        // No network call was made; the node shows an inline error.
        assert!(client.requests.lock().unwrap().is_empty());
        assert!(graph.find_node("gen-1").unwrap().data.error().is_some());
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_output() {
        let mut graph = prompt_graph();
        if let NodeData::ImageGenerate(d) = &mut graph.find_node_mut("gen-1").unwrap().data {
            d.image_output = "img://previous.png".to_string();
        }

        let mut runner = NodeRunner::new(Arc::new(BrokenClient));
        let outcome = runner.run(&mut graph, "gen-1").await.unwrap();
        assert!(matches!(outcome, RunOutcome::Failed(_)));

        match &graph.find_node("gen-1").unwrap().data {
            NodeData::ImageGenerate(d) => {
                assert_eq!(d.image_output, "img://previous.png");
                assert!(!d.error.is_empty());
            }
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_stale_completion_is_discarded() {
        let mut graph = prompt_graph();
        let sink = Arc::new(VecEventSink::new());
        let client = FixedClient::new(GenerationResponse::output("image", "img://new.png"));
        let mut runner = NodeRunner::new(client).with_event_sink(sink.clone());

        let first = runner.begin(&graph, "gen-1").unwrap();
        let second = runner.begin(&graph, "gen-1").unwrap();
        assert!(second.invocation > first.invocation);

        // The older run's result arrives late and must not be applied.
        let outcome = runner.complete(
            &mut graph,
            &first,
            GenerationResponse::output("image", "img://stale.png"),
        );
        assert_eq!(outcome, RunOutcome::Superseded);
        match &graph.find_node("gen-1").unwrap().data {
            NodeData::ImageGenerate(d) => assert!(d.image_output.is_empty()),
            _ => unreachable!(),
        }

        let outcome = runner.complete(
            &mut graph,
            &second,
            GenerationResponse::output("image", "img://new.png"),
        );
        assert_eq!(outcome, RunOutcome::Completed);
        assert!(sink
            .events()
            .iter()
            .any(|e| matches!(e, EngineEvent::RunSuperseded { .. })));
    }

    #[tokio::test]
    async fn test_completion_for_deleted_node_is_discarded() {
        let mut graph = prompt_graph();
        let client = FixedClient::new(GenerationResponse::output("image", "img://x.png"));
        let mut runner = NodeRunner::new(client);

        let pending = runner.begin(&graph, "gen-1").unwrap();
        graph.nodes.retain(|n| n.id != "gen-1");

        let outcome = runner.complete(
            &mut graph,
            &pending,
            GenerationResponse::output("image", "img://x.png"),
        );
        assert_eq!(outcome, RunOutcome::Superseded);
    }

    #[tokio::test]
    async fn test_non_runnable_kind_is_rejected() {
        let mut graph = GraphBuilder::new().text_input("t", "hi", (0.0, 0.0)).build();
        let client = FixedClient::new(GenerationResponse::output("text", "x"));
        let mut runner = NodeRunner::new(client);
        let err = runner.run(&mut graph, "t").await.unwrap_err();
        assert!(matches!(err, EngineError::NotRunnable { .. }));
    }
}
