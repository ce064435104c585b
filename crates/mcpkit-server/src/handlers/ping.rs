//! `ping` (§4.2): the one method besides `initialize` allowed before the
//! handshake completes.

use std::sync::Arc;

use serde_json::Value;

use mcpkit_core::Session;
use mcpkit_protocol::Result;

use crate::dispatcher::Server;

pub async fn handle(_server: Arc<Server>, _session: Arc<Session>, _params: Option<Value>) -> Result<Value> {
    Ok(serde_json::json!({}))
}
