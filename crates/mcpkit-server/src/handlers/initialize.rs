//! `initialize` and `initialized` (§4.2.1).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use mcpkit_core::Session;
use mcpkit_protocol::capabilities::{negotiate_version, ClientInfo, SamplingCapabilities, ServerInfo};
use mcpkit_protocol::{McpError, Result};

use super::parse_params;
use crate::dispatcher::Server;

#[derive(Debug, Deserialize)]
struct InitializeParams {
    #[serde(rename = "protocolVersion")]
    protocol_version: String,
    #[serde(rename = "clientInfo")]
    client_info: ClientInfo,
}

#[derive(Debug, Serialize)]
struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    protocol_version: String,
    #[serde(rename = "serverInfo")]
    server_info: ServerInfo,
    capabilities: mcpkit_protocol::capabilities::ServerCapabilities,
}

pub async fn handle(server: Arc<Server>, session: Arc<Session>, params: Option<Value>) -> Result<Value> {
    let params: InitializeParams = parse_params(params)?;

    let negotiated = negotiate_version(&server.config().protocol_versions, &params.protocol_version)
        .map_err(|(requested, supported)| {
            McpError::invalid_params(
                "unsupported protocol version",
                serde_json::json!({"requested": requested, "supported": supported}),
            )
            .into_box()
        })?
        .to_string();

    session.mark_initialized(negotiated.clone(), params.client_info.name.clone());

    let sampling_config = &server.config().sampling;
    let sampling = sampling_config.enabled.then(|| SamplingCapabilities {
        supports_streaming: sampling_config.supports_streaming,
        supports_tool_calls: sampling_config.supports_tool_calls,
        supports_images: sampling_config.supports_images,
        max_tokens_limit: sampling_config.max_tokens_limit,
        default_timeout_seconds: sampling_config.timeout_seconds,
    });

    let result = InitializeResult {
        protocol_version: negotiated,
        server_info: ServerInfo { name: server.config().name.clone(), version: server.config().version.clone() },
        capabilities: server.registry.capabilities(sampling),
    };

    Ok(serde_json::to_value(result).expect("InitializeResult always serializes"))
}

/// The `initialized` notification. The handshake's `initialized` flag is
/// already set by `initialize` itself (§4.2.1); this confirms the client
/// received the result and is otherwise a no-op.
pub async fn initialized(_server: Arc<Server>, _session: Arc<Session>, _params: Option<Value>) -> Result<()> {
    Ok(())
}
