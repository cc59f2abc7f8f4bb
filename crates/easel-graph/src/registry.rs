//! Node descriptor registry
//!
//! Maps each node kind to its static metadata (category, label, base
//! ports) for palette listing and document validation. The registry is a
//! single source of truth built lazily from the kind catalog.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::node_data::{NodeData, NodeKind};
use crate::types::PortSpec;

/// Category of a node, for palette grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    /// Plain inputs (text, uploads)
    Input,
    /// Generative model calls
    Generation,
    /// Editing/processing tools
    Editing,
    /// Visual-only nodes (groups, notes)
    Layout,
}

/// Static metadata for a node kind
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescriptor {
    /// The kind this descriptor describes
    pub kind: NodeKind,
    /// Category for palette grouping
    pub category: NodeCategory,
    /// Human-readable label
    pub label: String,
    /// Description of what the node does
    pub description: String,
    /// Input ports of a freshly created node (variable-port kinds may
    /// expose more at runtime)
    pub inputs: Vec<PortSpec>,
    /// Output ports
    pub outputs: Vec<PortSpec>,
}

fn descriptor_for(kind: NodeKind) -> NodeDescriptor {
    let (category, label, description) = match kind {
        NodeKind::TextInput => (NodeCategory::Input, "Text", "Plain text input"),
        NodeKind::ImageUpload => (NodeCategory::Input, "Image", "Uploaded image"),
        NodeKind::ImageGenerate => (
            NodeCategory::Generation,
            "Generate Image",
            "Generate an image from a prompt and optional reference images",
        ),
        NodeKind::DescribeImage => (
            NodeCategory::Editing,
            "Describe",
            "Describe an image as text",
        ),
        NodeKind::ImageFilter => (
            NodeCategory::Editing,
            "Filter",
            "Apply an editing filter to an image",
        ),
        NodeKind::MaskEditor => (
            NodeCategory::Editing,
            "Mask",
            "Paint a mask over an image",
        ),
        NodeKind::VideoGenerate => (
            NodeCategory::Generation,
            "Generate Video",
            "Generate a video from a prompt and optional key frames",
        ),
        NodeKind::Group => (NodeCategory::Layout, "Group", "Visual container"),
        NodeKind::Note => (NodeCategory::Layout, "Note", "Canvas annotation"),
    };

    let data = NodeData::default_for(kind);
    NodeDescriptor {
        kind,
        category,
        label: label.to_string(),
        description: description.to_string(),
        inputs: data.input_ports(),
        outputs: data.output_ports(),
    }
}

/// Registry of node descriptors, keyed by kind
pub struct NodeRegistry {
    entries: HashMap<NodeKind, NodeDescriptor>,
}

impl NodeRegistry {
    fn build() -> Self {
        let entries = NodeKind::ALL
            .iter()
            .map(|&kind| (kind, descriptor_for(kind)))
            .collect();
        Self { entries }
    }

    /// The process-wide registry
    pub fn global() -> &'static NodeRegistry {
        static REGISTRY: Lazy<NodeRegistry> = Lazy::new(NodeRegistry::build);
        &REGISTRY
    }

    /// Descriptor for a kind
    pub fn get(&self, kind: NodeKind) -> Option<&NodeDescriptor> {
        self.entries.get(&kind)
    }

    /// All descriptors, in palette order
    pub fn all(&self) -> Vec<&NodeDescriptor> {
        NodeKind::ALL
            .iter()
            .filter_map(|kind| self.entries.get(kind))
            .collect()
    }

    /// Descriptors in a category, in palette order
    pub fn in_category(&self, category: NodeCategory) -> Vec<&NodeDescriptor> {
        self.all()
            .into_iter()
            .filter(|d| d.category == category)
            .collect()
    }
}
