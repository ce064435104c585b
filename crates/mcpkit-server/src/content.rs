//! Content conversion utility (§4.9): turns an arbitrary handler return
//! value into the MCP content-item sequence.

use mcpkit_types::content::sniff_mime_type;
use mcpkit_types::ContentBlock;

/// What a tool/resource/prompt handler is allowed to return before
/// conversion. Handlers construct this directly rather than building
/// `ContentBlock`s themselves in the common cases.
#[derive(Debug, Clone)]
pub enum HandlerOutput {
    /// Plain text; becomes `{type:"text", mimeType: default_mime}`.
    Text(String),
    /// Raw bytes; becomes a base64 `blob`, sniffing an image MIME type from
    /// magic numbers when none is given.
    Bytes(Vec<u8>, Option<String>),
    /// Already-shaped content items, passed through unchanged modulo URI
    /// filling (§8 "left inverse on already-shaped content items").
    Content(Vec<ContentBlock>),
    /// Any other structured value, JSON-encoded and wrapped as text with
    /// `application/json`.
    Json(serde_json::Value),
}

impl From<String> for HandlerOutput {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for HandlerOutput {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<serde_json::Value> for HandlerOutput {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

impl From<Vec<ContentBlock>> for HandlerOutput {
    fn from(items: Vec<ContentBlock>) -> Self {
        Self::Content(items)
    }
}

/// Convert a handler's return value into the MCP content-item sequence,
/// filling in `uri` on every item that lacks one.
pub fn to_content_items(output: HandlerOutput, default_mime: &str, default_uri: Option<&str>) -> Vec<ContentBlock> {
    let items = match output {
        HandlerOutput::Text(text) => vec![ContentBlock::text(text, default_mime)],
        HandlerOutput::Bytes(bytes, mime) => {
            let mime = mime.unwrap_or_else(|| sniff_mime_type(&bytes).to_string());
            vec![ContentBlock::blob(&bytes, Some(mime))]
        }
        HandlerOutput::Content(items) => items,
        HandlerOutput::Json(value) => vec![ContentBlock::json(&value)],
    };

    match default_uri {
        Some(uri) => items.into_iter().map(|item| item.with_uri_default(uri)).collect(),
        None => items,
    }
}
