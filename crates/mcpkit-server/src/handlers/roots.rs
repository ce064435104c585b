//! `roots/list` (§4.2).

use std::sync::Arc;

use serde_json::Value;

use mcpkit_core::Session;
use mcpkit_protocol::Result;
use mcpkit_security::{ActionKind, EntityClass};

use crate::dispatcher::Server;

pub async fn list(server: Arc<Server>, session: Arc<Session>, _params: Option<Value>) -> Result<Value> {
    let security = server
        .security
        .check(&session.context(), None, EntityClass::Root, ActionKind::List, "*")?;
    session.set_security(security);

    Ok(serde_json::json!({"roots": server.registry.list_roots()}))
}
