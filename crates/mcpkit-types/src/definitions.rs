//! Registered-entity definitions: Tool, Resource, Prompt, Root.
//!
//! These carry no handler — the handler closure is erased at the
//! `mcpkit-server` layer, which is the only place that knows about
//! sessions and async boxing. This crate only describes the shape a
//! definition has on the wire and as metadata.

use serde::{Deserialize, Serialize};

/// Annotations a tool or resource may carry to hint client UI behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolAnnotations {
    /// Human-facing display title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Hints the tool does not modify state.
    #[serde(rename = "readOnlyHint", skip_serializing_if = "Option::is_none")]
    pub read_only_hint: Option<bool>,
    /// Hints the tool may perform destructive operations.
    #[serde(rename = "destructiveHint", skip_serializing_if = "Option::is_none")]
    pub destructive_hint: Option<bool>,
    /// Hints repeated calls with the same arguments are safe.
    #[serde(rename = "idempotentHint", skip_serializing_if = "Option::is_none")]
    pub idempotent_hint: Option<bool>,
}

/// Wire-facing metadata for a registered tool (§3 Tool).
///
/// The handler closure itself is not part of this type; see
/// `mcpkit_server::registry::ToolEntry`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Unique name, the dispatch key for `tools/call`.
    pub name: String,
    /// Human-readable description shown to the model.
    pub description: String,
    /// JSON-Schema object describing accepted arguments.
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
    /// Optional UI/behavior annotations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<ToolAnnotations>,
}

/// Wire-facing metadata for a registered resource (§3 Resource).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// Unique URI, the dispatch key for `resources/read`.
    pub uri: String,
    /// Display name.
    pub name: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Default MIME type used when the handler doesn't set one on content.
    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// One named, typed argument a prompt accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptArgument {
    /// Argument name.
    pub name: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the argument must be supplied.
    pub required: bool,
}

/// Wire-facing metadata for a registered prompt (§3 Prompt).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    /// Unique name, the dispatch key for `prompts/get`.
    pub name: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ordered argument specs.
    #[serde(default)]
    pub arguments: Vec<PromptArgument>,
}

/// Wire-facing metadata for a registered root (§3 Root).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Root {
    /// Typically a filesystem scope URI.
    pub uri: String,
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}
