//! Built-in method handlers (§4.8): pure functions over
//! `(server, session, params)`. Shape-level validation is each handler's own
//! responsibility; routing and error-wrapping live in [`crate::dispatcher`].

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

use mcpkit_core::Session;
use mcpkit_protocol::Result;

use crate::dispatcher::Server;

pub mod cancel;
pub mod initialize;
pub mod ping;
pub mod prompts;
pub mod resources;
pub mod roots;
pub mod tools;

/// A request handler stored in the dispatcher's method table. Returns the
/// `result` value for a successful response.
pub type RequestHandler =
    Arc<dyn Fn(Arc<Server>, Arc<Session>, Option<Value>) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// A notification handler. Never produces a response; failures are logged
/// and swallowed by the dispatcher (§7).
pub type NotificationHandler =
    Arc<dyn Fn(Arc<Server>, Arc<Session>, Option<Value>) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Adapt a plain async function into a [`RequestHandler`].
pub fn request_handler<F, Fut>(f: F) -> RequestHandler
where
    F: Fn(Arc<Server>, Arc<Session>, Option<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    Arc::new(move |server, session, params| Box::pin(f(server, session, params)))
}

/// Adapt a plain async function into a [`NotificationHandler`].
pub fn notification_handler<F, Fut>(f: F) -> NotificationHandler
where
    F: Fn(Arc<Server>, Arc<Session>, Option<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(move |server, session, params| Box::pin(f(server, session, params)))
}

/// Parse a handler's `params`, defaulting to `{}` when absent, and report
/// malformed shapes as `InvalidParams`.
pub(crate) fn parse_params<T: serde::de::DeserializeOwned>(params: Option<Value>) -> Result<T> {
    let value = params.unwrap_or_else(|| serde_json::json!({}));
    serde_json::from_value(value.clone())
        .map_err(|e| mcpkit_protocol::McpError::invalid_params(e.to_string(), value).into_box())
}
