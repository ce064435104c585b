//! `resources/list` and `resources/read` (§4.2.3).

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use mcpkit_core::Session;
use mcpkit_protocol::{McpError, Result};
use mcpkit_security::{ActionKind, EntityClass};

use super::parse_params;
use crate::content::to_content_items;
use crate::dispatcher::Server;

pub async fn list(server: Arc<Server>, session: Arc<Session>, _params: Option<Value>) -> Result<Value> {
    let security = server
        .security
        .check(&session.context(), None, EntityClass::Resource, ActionKind::List, "*")?;
    session.set_security(security);

    Ok(serde_json::json!({"resources": server.registry.list_resources()}))
}

#[derive(Debug, Deserialize)]
struct ReadParams {
    uri: String,
}

pub async fn read(server: Arc<Server>, session: Arc<Session>, params: Option<Value>) -> Result<Value> {
    let params: ReadParams = parse_params(params)?;

    let (resource, handler) = server
        .registry
        .resource(&params.uri)
        .ok_or_else(|| McpError::not_found("resource", &params.uri).into_box())?;

    let security = server
        .security
        .check(&session.context(), None, EntityClass::Resource, ActionKind::Read, &params.uri)?;
    session.set_security(security);

    let output = (handler)(Arc::clone(&session)).await.map_err(|e| {
        McpError::internal("resource handler failed")
            .with_details(serde_json::json!({"details": e.message}))
            .into_box()
    })?;

    let default_mime = resource.mime_type.as_deref().unwrap_or("text/plain");
    let content = to_content_items(output, default_mime, Some(&resource.uri));
    Ok(serde_json::json!({"contents": content}))
}
