//! `prompts/list`, `prompts/get`, `prompts/subscribe` (§4.2.4, §4.2.6).

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use mcpkit_core::Session;
use mcpkit_protocol::{McpError, Result};
use mcpkit_security::{ActionKind, EntityClass};

use super::parse_params;
use crate::dispatcher::Server;
use crate::validation::validate_prompt_arguments;

pub async fn list(server: Arc<Server>, session: Arc<Session>, _params: Option<Value>) -> Result<Value> {
    let security = server
        .security
        .check(&session.context(), None, EntityClass::Prompt, ActionKind::List, "*")?;
    session.set_security(security);

    Ok(serde_json::json!({"prompts": server.registry.list_prompts()}))
}

#[derive(Debug, Deserialize)]
struct GetParams {
    name: String,
    #[serde(default)]
    arguments: HashMap<String, Value>,
}

pub async fn get(server: Arc<Server>, session: Arc<Session>, params: Option<Value>) -> Result<Value> {
    let params: GetParams = parse_params(params)?;

    let entry = server
        .registry
        .prompt(&params.name)
        .ok_or_else(|| McpError::not_found("prompt", &params.name).into_box())?;

    let security = server
        .security
        .check(&session.context(), None, EntityClass::Prompt, ActionKind::Call, &params.name)?;
    session.set_security(security);

    validate_prompt_arguments(&entry.prompt.arguments, &params.arguments)?;

    let result = (entry.handler)(params.arguments, Arc::clone(&session)).await.map_err(|e| {
        McpError::internal("prompt handler failed")
            .with_details(serde_json::json!({"details": e.message}))
            .into_box()
    })?;

    // Structural response validation (§4.2.4): messages must be non-empty.
    if result.messages.is_empty() {
        return Err(McpError::internal("prompt handler returned no messages").into_box());
    }

    Ok(serde_json::to_value(result).expect("PromptResult always serializes"))
}

pub async fn subscribe(server: Arc<Server>, session: Arc<Session>, _params: Option<Value>) -> Result<Value> {
    server.prompt_subscribers.insert(session.id().clone(), ());
    Ok(serde_json::json!({}))
}
