//! Protocol-version negotiation and the `initialize` capabilities payload.

use serde::{Deserialize, Serialize};

/// Capabilities advertised for the `sampling` facility (§4.2.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingCapabilities {
    #[serde(rename = "supportsStreaming")]
    pub supports_streaming: bool,
    #[serde(rename = "supportsToolCalls")]
    pub supports_tool_calls: bool,
    #[serde(rename = "supportsImages")]
    pub supports_images: bool,
    #[serde(rename = "maxTokensLimit", skip_serializing_if = "Option::is_none")]
    pub max_tokens_limit: Option<u32>,
    #[serde(rename = "defaultTimeoutSeconds")]
    pub default_timeout_seconds: u64,
}

/// Capabilities block describing `tools`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsCapabilities {
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

/// Capabilities block describing `resources`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourcesCapabilities {
    pub subscribe: bool,
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

/// Capabilities block describing `prompts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptsCapabilities {
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

/// Capabilities block describing `roots`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootsCapabilities {
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

/// The full `capabilities` object returned from `initialize` (§4.2.1).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapabilities>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourcesCapabilities>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts: Option<PromptsCapabilities>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roots: Option<RootsCapabilities>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling: Option<SamplingCapabilities>,
}

/// Client-declared information and capabilities from the `initialize` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

/// Server-declared information echoed back in `initialize`'s result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

/// Check a client-declared protocol version against the server's supported
/// set (§4.2.1). Returns the matched version, or both sides' values for an
/// `InvalidParams` detail payload on mismatch.
pub fn negotiate_version<'a>(
    supported: &'a [String],
    requested: &str,
) -> std::result::Result<&'a str, (String, Vec<String>)> {
    supported
        .iter()
        .find(|v| v.as_str() == requested)
        .map(String::as_str)
        .ok_or_else(|| (requested.to_string(), supported.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negotiate_rejects_unknown_version() {
        let supported = vec!["2025-03-26".to_string()];
        let err = negotiate_version(&supported, "2099-01-01").unwrap_err();
        assert_eq!(err.0, "2099-01-01");
        assert_eq!(err.1, supported);
    }

    #[test]
    fn negotiate_accepts_known_version() {
        let supported = vec!["2025-03-26".to_string()];
        assert_eq!(negotiate_version(&supported, "2025-03-26").unwrap(), "2025-03-26");
    }
}
