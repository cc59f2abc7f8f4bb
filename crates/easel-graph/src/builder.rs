//! Fluent builder for canvas graphs
//!
//! Constructs graphs programmatically without store-level connection
//! checks; useful for tests and for assembling graphs from trusted input.

use crate::node_data::{
    GroupData, ImageFilterData, ImageGenerateData, ImageUploadData, NodeData, NoteData,
    TextInputData,
};
use crate::types::{GraphEdge, GraphNode, Position, Viewport, WorkflowGraph};

/// Fluent builder for [`WorkflowGraph`]
///
/// # Example
///
/// ```ignore
/// let graph = GraphBuilder::new()
///     .text_input("prompt-1", "a lighthouse at dusk", (0.0, 0.0))
///     .image_generate("gen-1", (200.0, 0.0))
///     .connect("prompt-1", "text", "gen-1", "prompt")
///     .build();
/// ```
#[derive(Default)]
pub struct GraphBuilder {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    viewport: Viewport,
    edge_counter: usize,
}

impl GraphBuilder {
    /// Create a new builder with an empty graph and default viewport
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with explicit data
    pub fn node(mut self, id: impl Into<String>, data: NodeData, position: (f64, f64)) -> Self {
        self.nodes.push(GraphNode::new(
            id,
            data,
            Position::new(position.0, position.1),
        ));
        self
    }

    /// Add a text input node
    pub fn text_input(
        self,
        id: impl Into<String>,
        text: impl Into<String>,
        position: (f64, f64),
    ) -> Self {
        self.node(
            id,
            NodeData::TextInput(TextInputData { text: text.into() }),
            position,
        )
    }

    /// Add an image upload node with a stored URL
    pub fn image_upload(
        self,
        id: impl Into<String>,
        image_url: impl Into<String>,
        position: (f64, f64),
    ) -> Self {
        self.node(
            id,
            NodeData::ImageUpload(ImageUploadData {
                image_url: image_url.into(),
                local_preview: None,
            }),
            position,
        )
    }

    /// Add an image generation node with default data
    pub fn image_generate(self, id: impl Into<String>, position: (f64, f64)) -> Self {
        self.node(
            id,
            NodeData::ImageGenerate(ImageGenerateData::default()),
            position,
        )
    }

    /// Add an image description node
    pub fn describe_image(self, id: impl Into<String>, position: (f64, f64)) -> Self {
        self.node(id, NodeData::DescribeImage(Default::default()), position)
    }

    /// Add an image filter node
    pub fn image_filter(
        self,
        id: impl Into<String>,
        filter: impl Into<String>,
        position: (f64, f64),
    ) -> Self {
        self.node(
            id,
            NodeData::ImageFilter(ImageFilterData {
                filter: filter.into(),
                ..ImageFilterData::default()
            }),
            position,
        )
    }

    /// Add a mask editor node
    pub fn mask_editor(self, id: impl Into<String>, position: (f64, f64)) -> Self {
        self.node(id, NodeData::MaskEditor(Default::default()), position)
    }

    /// Add a video generation node
    pub fn video_generate(self, id: impl Into<String>, position: (f64, f64)) -> Self {
        self.node(id, NodeData::VideoGenerate(Default::default()), position)
    }

    /// Add a group container node
    pub fn group(
        self,
        id: impl Into<String>,
        title: impl Into<String>,
        position: (f64, f64),
        size: (f64, f64),
    ) -> Self {
        let mut builder = self.node(
            id,
            NodeData::Group(GroupData {
                title: title.into(),
                color: None,
            }),
            position,
        );
        if let Some(node) = builder.nodes.last_mut() {
            node.style = Some(crate::types::NodeStyle {
                width: size.0,
                height: size.1,
            });
        }
        builder
    }

    /// Add an annotation node
    pub fn note(
        self,
        id: impl Into<String>,
        text: impl Into<String>,
        position: (f64, f64),
    ) -> Self {
        self.node(id, NodeData::Note(NoteData { text: text.into() }), position)
    }

    /// Add an edge with an auto-generated id
    pub fn connect(
        mut self,
        source: impl Into<String>,
        source_handle: impl Into<String>,
        target: impl Into<String>,
        target_handle: impl Into<String>,
    ) -> Self {
        self.edge_counter += 1;
        self.edges.push(GraphEdge::new(
            format!("edge-{}", self.edge_counter),
            source,
            source_handle,
            target,
            target_handle,
        ));
        self
    }

    /// Add an edge with an explicit id
    pub fn edge(
        mut self,
        id: impl Into<String>,
        source: impl Into<String>,
        source_handle: impl Into<String>,
        target: impl Into<String>,
        target_handle: impl Into<String>,
    ) -> Self {
        self.edges
            .push(GraphEdge::new(id, source, source_handle, target, target_handle));
        self
    }

    /// Set the viewport
    pub fn viewport(mut self, x: f64, y: f64, zoom: f64) -> Self {
        self.viewport = Viewport { x, y, zoom };
        self
    }

    /// Build the graph without validation
    pub fn build(self) -> WorkflowGraph {
        WorkflowGraph {
            nodes: self.nodes,
            edges: self.edges,
            viewport: self.viewport,
        }
    }
}
