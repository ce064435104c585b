//! `tools/list` and `tools/call` (§4.2.2).

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use mcpkit_core::Session;
use mcpkit_protocol::{McpError, Result};
use mcpkit_security::{ActionKind, EntityClass};

use super::parse_params;
use crate::content::to_content_items;
use crate::dispatcher::Server;
use crate::validation::validate_tool_arguments;

pub async fn list(server: Arc<Server>, session: Arc<Session>, _params: Option<Value>) -> Result<Value> {
    let security = server
        .security
        .check(&session.context(), None, EntityClass::Tool, ActionKind::List, "*")?;
    session.set_security(security);

    Ok(serde_json::json!({"tools": server.registry.list_tools()}))
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

pub async fn call(server: Arc<Server>, session: Arc<Session>, params: Option<Value>) -> Result<Value> {
    let params: CallParams = parse_params(params)?;

    let entry = server
        .registry
        .tool(&params.name)
        .ok_or_else(|| McpError::not_found("tool", &params.name).into_box())?;

    let security = server
        .security
        .check(&session.context(), None, EntityClass::Tool, ActionKind::Call, &params.name)?;
    session.set_security(security);

    validate_tool_arguments(&entry.tool.input_schema, &params.arguments)?;

    let output = (entry.handler)(params.arguments, Arc::clone(&session)).await.map_err(|e| {
        McpError::internal("tool handler failed")
            .with_details(serde_json::json!({"details": e.message}))
            .into_box()
    })?;

    let content = to_content_items(output, "text/plain", None);
    Ok(serde_json::json!({"isError": false, "content": content}))
}
