//! The MCP content model: the shapes a tool, resource, or prompt handler's
//! return value is normalized into on the wire.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single content item per the MCP content schema.
///
/// This is the sum type the Design Notes of the source specification call
/// out explicitly: `Content = Text | Image | Audio | Blob | Json`. `Json` is
/// represented on the wire as a `text` block whose `mimeType` is
/// `application/json` (per §4.9's "JSON-encoded and wrapped as text" rule),
/// so it is not a distinct serde variant — callers that need to detect it
/// check `mime_type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    /// Plain or structured-as-JSON text.
    #[serde(rename = "text")]
    Text {
        /// Rendered text.
        text: String,
        /// MIME type, defaulting to `text/plain` when constructed via
        /// [`ContentBlock::text`].
        #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
        /// Resource URI this content item is associated with, filled in by
        /// the dispatcher when a resource handler omits it.
        #[serde(skip_serializing_if = "Option::is_none")]
        uri: Option<String>,
    },
    /// Base64-encoded image payload.
    #[serde(rename = "image")]
    Image {
        /// Base64-encoded bytes.
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        uri: Option<String>,
    },
    /// Base64-encoded audio payload.
    #[serde(rename = "audio")]
    Audio {
        /// Base64-encoded bytes.
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        uri: Option<String>,
    },
    /// Opaque base64-encoded binary blob with no further structure implied.
    #[serde(rename = "blob")]
    Blob {
        /// Base64-encoded bytes.
        blob: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        uri: Option<String>,
    },
}

/// Compatibility alias matching the name used in prose throughout the spec.
pub type Content = ContentBlock;

impl ContentBlock {
    /// Build a text content item with an explicit MIME type.
    pub fn text(text: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            mime_type: Some(mime_type.into()),
            uri: None,
        }
    }

    /// Build a plain-text content item (`text/plain`).
    pub fn plain_text(text: impl Into<String>) -> Self {
        Self::text(text, "text/plain")
    }

    /// Build a JSON content item: a text block tagged `application/json`.
    pub fn json(value: &serde_json::Value) -> Self {
        Self::Text {
            text: serde_json::to_string(value).unwrap_or_default(),
            mime_type: Some("application/json".to_string()),
            uri: None,
        }
    }

    /// Build a blob content item, sniffing a MIME type from magic numbers
    /// when one isn't supplied.
    pub fn blob(raw: &[u8], mime_type: Option<String>) -> Self {
        let mime = mime_type.unwrap_or_else(|| sniff_mime_type(raw).to_string());
        Self::Blob {
            blob: base64_encode(raw),
            mime_type: mime,
            uri: None,
        }
    }

    /// The resource URI attached to this content item, if any.
    pub fn uri(&self) -> Option<&str> {
        match self {
            Self::Text { uri, .. } | Self::Image { uri, .. } | Self::Audio { uri, .. } | Self::Blob { uri, .. } => {
                uri.as_deref()
            }
        }
    }

    /// Return a copy of this content item with its URI filled in if it was
    /// previously absent. Used by `resources/read` to ensure every returned
    /// content item carries the resource's URI (§4.2.3).
    #[must_use]
    pub fn with_uri_default(self, default_uri: &str) -> Self {
        match self {
            Self::Text { text, mime_type, uri } => Self::Text {
                text,
                mime_type,
                uri: Some(uri.unwrap_or_else(|| default_uri.to_string())),
            },
            Self::Image { data, mime_type, uri } => Self::Image {
                data,
                mime_type,
                uri: Some(uri.unwrap_or_else(|| default_uri.to_string())),
            },
            Self::Audio { data, mime_type, uri } => Self::Audio {
                data,
                mime_type,
                uri: Some(uri.unwrap_or_else(|| default_uri.to_string())),
            },
            Self::Blob { blob, mime_type, uri } => Self::Blob {
                blob,
                mime_type,
                uri: Some(uri.unwrap_or_else(|| default_uri.to_string())),
            },
        }
    }
}

fn base64_encode(raw: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(raw)
}

/// Detect a MIME type from the first bytes of a blob (§4.9a magic numbers).
/// Falls back to `application/octet-stream`.
pub fn sniff_mime_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        "image/png"
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        "image/gif"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "application/octet-stream"
    }
}

/// A completed prompt message, as returned by `prompts/get`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    /// Either `"user"` or `"assistant"`.
    pub role: String,
    /// The message content.
    pub content: ContentBlock,
}

/// The result shape of a prompt handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptResult {
    /// Ordered messages making up the expanded prompt.
    pub messages: Vec<PromptMessage>,
    /// Optional human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Arbitrary extension metadata.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub meta: HashMap<String, serde_json::Value>,
}
