//! Cancel notifications: `$/cancelRequest`, `$/cancel`,
//! `notifications/cancelled` (§4.2a, §5).

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use mcpkit_core::Session;
use mcpkit_protocol::Result;
use mcpkit_types::RequestId;

use crate::dispatcher::Server;

#[derive(Debug, Deserialize)]
struct CancelParams {
    #[serde(rename = "requestId")]
    request_id: RequestId,
}

/// Best-effort removal of the referenced in-flight entry. In-progress
/// handler work is not forcibly stopped (§5: cooperative cancel only).
pub async fn handle(server: Arc<Server>, _session: Arc<Session>, params: Option<Value>) -> Result<()> {
    if let Some(params) = params {
        if let Ok(params) = serde_json::from_value::<CancelParams>(params) {
            server.inflight.cancel(&params.request_id);
            server.correlator.cancel_request(&params.request_id);
        }
    }
    Ok(())
}
