//! Typed per-kind node data
//!
//! Each node kind owns a strongly-typed struct of authored, connected, and
//! output fields. The mapping from a handle to the connected field it writes
//! is fixed here at the type level, so propagation never guesses field names
//! at runtime.
//!
//! Field roles:
//! - *authored* fields mutate only via explicit user edits
//!   (`GraphStore::update_node_data`)
//! - *connected* fields are written exclusively by the propagation engine
//! - *output* fields are written exclusively by the node runner
//! - *transient* fields (local blob previews) never serialize and are
//!   stripped from snapshots and exports

use serde::{Deserialize, Serialize};

use crate::types::{PortKind, PortSpec};

/// Handle id for text/prompt outputs
pub const HANDLE_TEXT: &str = "text";
/// Handle id for image inputs/outputs
pub const HANDLE_IMAGE: &str = "image";
/// Handle id for prompt inputs
pub const HANDLE_PROMPT: &str = "prompt";
/// Handle id for video outputs
pub const HANDLE_VIDEO: &str = "video";
/// Handle id for mask outputs
pub const HANDLE_MASK: &str = "mask";
/// Handle id for a video's first-frame input
pub const HANDLE_FIRST_FRAME: &str = "first_frame";
/// Handle id for a video's last-frame input
pub const HANDLE_LAST_FRAME: &str = "last_frame";

/// Prefix for indexed reference-image handles (`ref_image_0`, `ref_image_1`, ...)
pub const REF_IMAGE_PREFIX: &str = "ref_image_";

/// Wire names of connected/derived fields, shared by the history sanitizer
/// and the patch filter in `GraphStore::update_node_data`.
pub const CONNECTED_FIELD_NAMES: &[&str] = &[
    "connectedPrompt",
    "connectedImage",
    "connectedRefImages",
    "connectedFirstFrame",
    "connectedLastFrame",
];

/// Parse the index out of a `ref_image_N` handle id
pub fn ref_image_index(handle: &str) -> Option<usize> {
    handle.strip_prefix(REF_IMAGE_PREFIX)?.parse().ok()
}

/// Node kind discriminator, matching the wire `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    TextInput,
    ImageUpload,
    ImageGenerate,
    DescribeImage,
    ImageFilter,
    MaskEditor,
    VideoGenerate,
    Group,
    Note,
}

impl NodeKind {
    /// All known kinds, in palette order
    pub const ALL: &'static [NodeKind] = &[
        NodeKind::TextInput,
        NodeKind::ImageUpload,
        NodeKind::ImageGenerate,
        NodeKind::DescribeImage,
        NodeKind::ImageFilter,
        NodeKind::MaskEditor,
        NodeKind::VideoGenerate,
        NodeKind::Group,
        NodeKind::Note,
    ];

    /// The wire name of this kind (e.g. "image-generate")
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::TextInput => "text-input",
            NodeKind::ImageUpload => "image-upload",
            NodeKind::ImageGenerate => "image-generate",
            NodeKind::DescribeImage => "describe-image",
            NodeKind::ImageFilter => "image-filter",
            NodeKind::MaskEditor => "mask-editor",
            NodeKind::VideoGenerate => "video-generate",
            NodeKind::Group => "group",
            NodeKind::Note => "note",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Plain text input node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextInputData {
    /// Authored text, exposed on the `text` handle
    pub text: String,
}

/// Uploaded image node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageUploadData {
    /// Stored URL of the uploaded image
    pub image_url: String,
    /// Client-local blob handle shown before upload finishes; invalid
    /// outside the current session, so never serialized or snapshotted.
    #[serde(skip)]
    pub local_preview: Option<String>,
}

fn default_ref_image_count() -> usize {
    1
}

/// Image generation node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageGenerateData {
    /// Authored prompt, used when no prompt edge is connected
    pub prompt: String,
    /// Authored aspect ratio (e.g. "16:9")
    pub aspect_ratio: String,
    /// Number of reference-image input ports currently exposed
    pub ref_image_count: usize,
    /// Prompt mirrored from the upstream `prompt` edge
    #[serde(skip_serializing_if = "String::is_empty")]
    pub connected_prompt: String,
    /// Reference images mirrored per `ref_image_N` edge
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub connected_ref_images: Vec<String>,
    /// Generated image URL
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image_output: String,
    /// Last execution error, empty when the last run succeeded
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl Default for ImageGenerateData {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            aspect_ratio: "1:1".to_string(),
            ref_image_count: default_ref_image_count(),
            connected_prompt: String::new(),
            connected_ref_images: Vec::new(),
            image_output: String::new(),
            error: String::new(),
        }
    }
}

/// Image description node (image in, caption text out)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DescribeImageData {
    /// Image mirrored from the upstream `image` edge
    #[serde(skip_serializing_if = "String::is_empty")]
    pub connected_image: String,
    /// Generated caption; depends on the connected image, so cleared
    /// together with it on disconnect
    #[serde(skip_serializing_if = "String::is_empty")]
    pub output: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
}

fn default_strength() -> f64 {
    1.0
}

/// Image editing filter node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageFilterData {
    /// Authored filter name (e.g. "grayscale")
    pub filter: String,
    /// Authored filter strength, 0.0..=1.0
    pub strength: f64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub connected_image: String,
    /// Filtered preview; a filter with no connected image must blank it
    /// rather than keep a stale result
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image_output: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl Default for ImageFilterData {
    fn default() -> Self {
        Self {
            filter: "grayscale".to_string(),
            strength: default_strength(),
            connected_image: String::new(),
            image_output: String::new(),
            error: String::new(),
        }
    }
}

/// Masking tool node, exposing separate result and mask handles
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MaskEditorData {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub connected_image: String,
    /// Masked result image
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image_output: String,
    /// The mask itself
    #[serde(skip_serializing_if = "String::is_empty")]
    pub mask_output: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
}

/// Video generation node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VideoGenerateData {
    pub prompt: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub connected_prompt: String,
    /// First video frame mirrored from the `first_frame` edge
    #[serde(skip_serializing_if = "String::is_empty")]
    pub connected_first_frame: String,
    /// Last video frame mirrored from the `last_frame` edge
    #[serde(skip_serializing_if = "String::is_empty")]
    pub connected_last_frame: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub video_output: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
}

/// Visual container node; has no ports and does not propagate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GroupData {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Free-floating annotation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NoteData {
    pub text: String,
}

/// Tagged union over node kinds
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    TextInput(TextInputData),
    ImageUpload(ImageUploadData),
    ImageGenerate(ImageGenerateData),
    DescribeImage(DescribeImageData),
    ImageFilter(ImageFilterData),
    MaskEditor(MaskEditorData),
    VideoGenerate(VideoGenerateData),
    Group(GroupData),
    Note(NoteData),
}

impl NodeData {
    /// Fresh default data for a kind
    pub fn default_for(kind: NodeKind) -> NodeData {
        match kind {
            NodeKind::TextInput => NodeData::TextInput(TextInputData::default()),
            NodeKind::ImageUpload => NodeData::ImageUpload(ImageUploadData::default()),
            NodeKind::ImageGenerate => NodeData::ImageGenerate(ImageGenerateData::default()),
            NodeKind::DescribeImage => NodeData::DescribeImage(DescribeImageData::default()),
            NodeKind::ImageFilter => NodeData::ImageFilter(ImageFilterData::default()),
            NodeKind::MaskEditor => NodeData::MaskEditor(MaskEditorData::default()),
            NodeKind::VideoGenerate => NodeData::VideoGenerate(VideoGenerateData::default()),
            NodeKind::Group => NodeData::Group(GroupData::default()),
            NodeKind::Note => NodeData::Note(NoteData::default()),
        }
    }

    /// The kind discriminator for this data
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::TextInput(_) => NodeKind::TextInput,
            NodeData::ImageUpload(_) => NodeKind::ImageUpload,
            NodeData::ImageGenerate(_) => NodeKind::ImageGenerate,
            NodeData::DescribeImage(_) => NodeKind::DescribeImage,
            NodeData::ImageFilter(_) => NodeKind::ImageFilter,
            NodeData::MaskEditor(_) => NodeKind::MaskEditor,
            NodeData::VideoGenerate(_) => NodeKind::VideoGenerate,
            NodeData::Group(_) => NodeKind::Group,
            NodeData::Note(_) => NodeKind::Note,
        }
    }

    /// Serialize the inner struct to a JSON object
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            NodeData::TextInput(d) => serde_json::to_value(d),
            NodeData::ImageUpload(d) => serde_json::to_value(d),
            NodeData::ImageGenerate(d) => serde_json::to_value(d),
            NodeData::DescribeImage(d) => serde_json::to_value(d),
            NodeData::ImageFilter(d) => serde_json::to_value(d),
            NodeData::MaskEditor(d) => serde_json::to_value(d),
            NodeData::VideoGenerate(d) => serde_json::to_value(d),
            NodeData::Group(d) => serde_json::to_value(d),
            NodeData::Note(d) => serde_json::to_value(d),
        }
    }

    /// Deserialize data for a kind; a null/missing `data` object yields
    /// the kind's defaults
    pub fn from_value(
        kind: NodeKind,
        value: serde_json::Value,
    ) -> Result<NodeData, serde_json::Error> {
        let value = if value.is_null() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            value
        };
        Ok(match kind {
            NodeKind::TextInput => NodeData::TextInput(serde_json::from_value(value)?),
            NodeKind::ImageUpload => NodeData::ImageUpload(serde_json::from_value(value)?),
            NodeKind::ImageGenerate => NodeData::ImageGenerate(serde_json::from_value(value)?),
            NodeKind::DescribeImage => NodeData::DescribeImage(serde_json::from_value(value)?),
            NodeKind::ImageFilter => NodeData::ImageFilter(serde_json::from_value(value)?),
            NodeKind::MaskEditor => NodeData::MaskEditor(serde_json::from_value(value)?),
            NodeKind::VideoGenerate => NodeData::VideoGenerate(serde_json::from_value(value)?),
            NodeKind::Group => NodeData::Group(serde_json::from_value(value)?),
            NodeKind::Note => NodeData::Note(serde_json::from_value(value)?),
        })
    }

    /// Input ports currently exposed by this node.
    ///
    /// The set can vary at runtime: an image-generate node exposes one
    /// `ref_image_N` port per `ref_image_count`.
    pub fn input_ports(&self) -> Vec<PortSpec> {
        match self {
            NodeData::ImageGenerate(d) => {
                let mut ports = vec![PortSpec::required(HANDLE_PROMPT, PortKind::Text)];
                for i in 0..d.ref_image_count {
                    ports.push(PortSpec::optional(
                        format!("{REF_IMAGE_PREFIX}{i}"),
                        PortKind::Image,
                    ));
                }
                ports
            }
            NodeData::DescribeImage(_) | NodeData::ImageFilter(_) | NodeData::MaskEditor(_) => {
                vec![PortSpec::required(HANDLE_IMAGE, PortKind::Image)]
            }
            NodeData::VideoGenerate(_) => vec![
                PortSpec::required(HANDLE_PROMPT, PortKind::Text),
                PortSpec::optional(HANDLE_FIRST_FRAME, PortKind::Image),
                PortSpec::optional(HANDLE_LAST_FRAME, PortKind::Image),
            ],
            NodeData::TextInput(_)
            | NodeData::ImageUpload(_)
            | NodeData::Group(_)
            | NodeData::Note(_) => Vec::new(),
        }
    }

    /// Output ports exposed by this node
    pub fn output_ports(&self) -> Vec<PortSpec> {
        match self {
            NodeData::TextInput(_) => vec![PortSpec::optional(HANDLE_TEXT, PortKind::Text)],
            NodeData::ImageUpload(_) => vec![PortSpec::optional(HANDLE_IMAGE, PortKind::Image)],
            NodeData::ImageGenerate(_) | NodeData::ImageFilter(_) => {
                vec![PortSpec::optional(HANDLE_IMAGE, PortKind::Image)]
            }
            NodeData::DescribeImage(_) => vec![PortSpec::optional(HANDLE_TEXT, PortKind::Text)],
            NodeData::MaskEditor(_) => vec![
                PortSpec::optional(HANDLE_IMAGE, PortKind::Image),
                PortSpec::optional(HANDLE_MASK, PortKind::Mask),
            ],
            NodeData::VideoGenerate(_) => vec![PortSpec::optional(HANDLE_VIDEO, PortKind::Video)],
            NodeData::Group(_) | NodeData::Note(_) => Vec::new(),
        }
    }

    /// Look up an input port by handle id
    pub fn input_port(&self, handle: &str) -> Option<PortSpec> {
        self.input_ports().into_iter().find(|p| p.id == handle)
    }

    /// Look up an output port by handle id
    pub fn output_port(&self, handle: &str) -> Option<PortSpec> {
        self.output_ports().into_iter().find(|p| p.id == handle)
    }

    /// Resolve the value this node exposes on a source handle.
    ///
    /// Total over all (kind, handle) combinations: unresolved shapes yield
    /// an empty string, never an error. Propagation runs on every edit and
    /// must not be able to fail here.
    pub fn source_value(&self, handle: &str) -> &str {
        match (self, handle) {
            (NodeData::TextInput(d), HANDLE_TEXT) => &d.text,
            (NodeData::ImageUpload(d), HANDLE_IMAGE) => &d.image_url,
            (NodeData::ImageGenerate(d), HANDLE_IMAGE) => &d.image_output,
            (NodeData::DescribeImage(d), HANDLE_TEXT) => &d.output,
            (NodeData::ImageFilter(d), HANDLE_IMAGE) => &d.image_output,
            (NodeData::MaskEditor(d), HANDLE_IMAGE) => &d.image_output,
            (NodeData::MaskEditor(d), HANDLE_MASK) => &d.mask_output,
            (NodeData::VideoGenerate(d), HANDLE_VIDEO) => &d.video_output,
            _ => "",
        }
    }

    /// Read the cached connected field declared for `handle`.
    ///
    /// Empty when nothing is connected or the handle has no connected field.
    pub fn connected_value(&self, handle: &str) -> &str {
        match (self, handle) {
            (NodeData::ImageGenerate(d), HANDLE_PROMPT) => &d.connected_prompt,
            (NodeData::ImageGenerate(d), _) => ref_image_index(handle)
                .and_then(|i| d.connected_ref_images.get(i))
                .map(String::as_str)
                .unwrap_or(""),
            (NodeData::DescribeImage(d), HANDLE_IMAGE) => &d.connected_image,
            (NodeData::ImageFilter(d), HANDLE_IMAGE) => &d.connected_image,
            (NodeData::MaskEditor(d), HANDLE_IMAGE) => &d.connected_image,
            (NodeData::VideoGenerate(d), HANDLE_PROMPT) => &d.connected_prompt,
            (NodeData::VideoGenerate(d), HANDLE_FIRST_FRAME) => &d.connected_first_frame,
            (NodeData::VideoGenerate(d), HANDLE_LAST_FRAME) => &d.connected_last_frame,
            _ => "",
        }
    }

    /// Write a propagated value into the connected field declared for
    /// `handle`. Returns whether the stored value actually changed.
    pub fn set_connected(&mut self, handle: &str, value: &str) -> bool {
        fn assign(slot: &mut String, value: &str) -> bool {
            if slot == value {
                false
            } else {
                *slot = value.to_string();
                true
            }
        }

        match self {
            NodeData::ImageGenerate(d) => {
                if handle == HANDLE_PROMPT {
                    return assign(&mut d.connected_prompt, value);
                }
                if let Some(i) = ref_image_index(handle) {
                    if i < d.ref_image_count {
                        if d.connected_ref_images.len() <= i {
                            d.connected_ref_images.resize(i + 1, String::new());
                        }
                        return assign(&mut d.connected_ref_images[i], value);
                    }
                }
                false
            }
            NodeData::DescribeImage(d) if handle == HANDLE_IMAGE => {
                assign(&mut d.connected_image, value)
            }
            NodeData::ImageFilter(d) if handle == HANDLE_IMAGE => {
                assign(&mut d.connected_image, value)
            }
            NodeData::MaskEditor(d) if handle == HANDLE_IMAGE => {
                assign(&mut d.connected_image, value)
            }
            NodeData::VideoGenerate(d) => match handle {
                HANDLE_PROMPT => assign(&mut d.connected_prompt, value),
                HANDLE_FIRST_FRAME => assign(&mut d.connected_first_frame, value),
                HANDLE_LAST_FRAME => assign(&mut d.connected_last_frame, value),
                _ => false,
            },
            _ => false,
        }
    }

    /// Clear the connected field for `handle`, plus any output fields that
    /// are a pure function of it (an editing tool with no connected image
    /// must blank its preview rather than show a stale result).
    pub fn clear_connected(&mut self, handle: &str) -> bool {
        fn take(slot: &mut String) -> bool {
            if slot.is_empty() {
                false
            } else {
                slot.clear();
                true
            }
        }

        match self {
            NodeData::ImageGenerate(d) => {
                if handle == HANDLE_PROMPT {
                    return take(&mut d.connected_prompt);
                }
                if let Some(i) = ref_image_index(handle) {
                    if let Some(slot) = d.connected_ref_images.get_mut(i) {
                        return take(slot);
                    }
                }
                false
            }
            NodeData::DescribeImage(d) if handle == HANDLE_IMAGE => {
                take(&mut d.connected_image) | take(&mut d.output)
            }
            NodeData::ImageFilter(d) if handle == HANDLE_IMAGE => {
                take(&mut d.connected_image) | take(&mut d.image_output)
            }
            NodeData::MaskEditor(d) if handle == HANDLE_IMAGE => {
                take(&mut d.connected_image) | take(&mut d.image_output) | take(&mut d.mask_output)
            }
            NodeData::VideoGenerate(d) => match handle {
                HANDLE_PROMPT => take(&mut d.connected_prompt),
                HANDLE_FIRST_FRAME => take(&mut d.connected_first_frame),
                HANDLE_LAST_FRAME => take(&mut d.connected_last_frame),
                _ => false,
            },
            _ => false,
        }
    }

    /// Feed the propagation-relevant half of this node into the graph
    /// signature: every field that can serve as a propagation source, plus
    /// any shape that changes the exposed port set.
    pub fn fingerprint(&self, hasher: &mut blake3::Hasher) {
        hasher.update(self.kind().as_str().as_bytes());
        match self {
            NodeData::TextInput(d) => {
                hasher.update(d.text.as_bytes());
            }
            NodeData::ImageUpload(d) => {
                hasher.update(d.image_url.as_bytes());
            }
            NodeData::ImageGenerate(d) => {
                hasher.update(d.image_output.as_bytes());
                hasher.update(&d.ref_image_count.to_le_bytes());
            }
            NodeData::DescribeImage(d) => {
                hasher.update(d.output.as_bytes());
            }
            NodeData::ImageFilter(d) => {
                hasher.update(d.image_output.as_bytes());
            }
            NodeData::MaskEditor(d) => {
                hasher.update(d.image_output.as_bytes());
                hasher.update(d.mask_output.as_bytes());
            }
            NodeData::VideoGenerate(d) => {
                hasher.update(d.video_output.as_bytes());
            }
            NodeData::Group(_) | NodeData::Note(_) => {}
        }
    }

    /// Copy of this data with connected/derived, error, and transient
    /// fields stripped. The single sanitizer definition shared by history
    /// snapshots and document export.
    pub fn sanitized(&self) -> NodeData {
        let mut data = self.clone();
        match &mut data {
            NodeData::ImageUpload(d) => {
                d.local_preview = None;
            }
            NodeData::ImageGenerate(d) => {
                d.connected_prompt.clear();
                d.connected_ref_images.clear();
                d.error.clear();
            }
            NodeData::DescribeImage(d) => {
                d.connected_image.clear();
                d.error.clear();
            }
            NodeData::ImageFilter(d) => {
                d.connected_image.clear();
                d.error.clear();
            }
            NodeData::MaskEditor(d) => {
                d.connected_image.clear();
                d.error.clear();
            }
            NodeData::VideoGenerate(d) => {
                d.connected_prompt.clear();
                d.connected_first_frame.clear();
                d.connected_last_frame.clear();
                d.error.clear();
            }
            NodeData::TextInput(_) | NodeData::Group(_) | NodeData::Note(_) => {}
        }
        data
    }

    /// Copy transient (never-serialized) fields over from `other`.
    ///
    /// A serde round-trip drops `#[serde(skip)]` fields; a data merge
    /// built on such a round-trip must carry them across so untouched
    /// client-local state survives.
    pub fn carry_transient_from(&mut self, other: &NodeData) {
        if let (NodeData::ImageUpload(d), NodeData::ImageUpload(o)) = (self, other) {
            d.local_preview.clone_from(&o.local_preview);
        }
    }

    /// Whether a wire field name belongs to the connected/derived set.
    /// Used to filter user patches so connected fields stay owned by the
    /// propagation engine.
    pub fn is_connected_field(name: &str) -> bool {
        CONNECTED_FIELD_NAMES.contains(&name)
    }

    /// Whether this kind has a Run action
    pub fn is_runnable(&self) -> bool {
        matches!(
            self,
            NodeData::ImageGenerate(_)
                | NodeData::DescribeImage(_)
                | NodeData::ImageFilter(_)
                | NodeData::MaskEditor(_)
                | NodeData::VideoGenerate(_)
        )
    }

    /// Write execution results into this node's output fields, keyed by
    /// output handle id. Unknown keys are ignored. Returns whether any
    /// output changed; a successful apply also clears the error field.
    pub fn apply_outputs(&mut self, outputs: &std::collections::BTreeMap<String, String>) -> bool {
        let mut changed = false;
        for (handle, value) in outputs {
            let slot = match (&mut *self, handle.as_str()) {
                (NodeData::ImageGenerate(d), HANDLE_IMAGE) => Some(&mut d.image_output),
                (NodeData::DescribeImage(d), HANDLE_TEXT) => Some(&mut d.output),
                (NodeData::ImageFilter(d), HANDLE_IMAGE) => Some(&mut d.image_output),
                (NodeData::MaskEditor(d), HANDLE_IMAGE) => Some(&mut d.image_output),
                (NodeData::MaskEditor(d), HANDLE_MASK) => Some(&mut d.mask_output),
                (NodeData::VideoGenerate(d), HANDLE_VIDEO) => Some(&mut d.video_output),
                _ => None,
            };
            if let Some(slot) = slot {
                if slot != value {
                    *slot = value.clone();
                    changed = true;
                }
            }
        }
        if changed {
            self.set_error("");
        }
        changed
    }

    /// Set (or clear, with an empty message) the node's execution error
    pub fn set_error(&mut self, message: &str) -> bool {
        let slot = match self {
            NodeData::ImageGenerate(d) => &mut d.error,
            NodeData::DescribeImage(d) => &mut d.error,
            NodeData::ImageFilter(d) => &mut d.error,
            NodeData::MaskEditor(d) => &mut d.error,
            NodeData::VideoGenerate(d) => &mut d.error,
            _ => return false,
        };
        if slot == message {
            false
        } else {
            *slot = message.to_string();
            true
        }
    }

    /// The node's current execution error, if any
    pub fn error(&self) -> Option<&str> {
        let err = match self {
            NodeData::ImageGenerate(d) => &d.error,
            NodeData::DescribeImage(d) => &d.error,
            NodeData::ImageFilter(d) => &d.error,
            NodeData::MaskEditor(d) => &d.error,
            NodeData::VideoGenerate(d) => &d.error,
            _ => return None,
        };
        if err.is_empty() {
            None
        } else {
            Some(err)
        }
    }
}
