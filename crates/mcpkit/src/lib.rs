//! # mcpkit
//!
//! A Model Context Protocol server framework: a registry for tools,
//! resources and prompts; a dispatcher that validates and routes JSON-RPC
//! requests to them; and two transports (stdio and Streamable HTTP) that
//! feed it.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use futures::FutureExt;
//! use serde_json::json;
//!
//! use mcpkit::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let server = Server::new(ServerConfig::default());
//!     server.register_tool(
//!         Tool {
//!             name: "echo".into(),
//!             description: "echoes the given text".into(),
//!             input_schema: json!({
//!                 "type": "object",
//!                 "properties": {"text": {"type": "string"}},
//!                 "required": ["text"],
//!             }),
//!             annotations: None,
//!         },
//!         Arc::new(|args: serde_json::Value, _session| {
//!             async move { Ok(HandlerOutput::from(args["text"].as_str().unwrap_or("").to_string())) }.boxed()
//!         }),
//!     )?;
//!
//!     StdioTransport::new(server).run(tokio::sync::oneshot::channel().1).await?;
//!     Ok(())
//! }
//! ```
//!
//! Running over HTTP instead is the same registration code, followed by
//! `mcpkit_transport_http::serve(server).await?`.

pub use mcpkit_core as core;
pub use mcpkit_protocol as protocol;
pub use mcpkit_security as security;
pub use mcpkit_server as server;
pub use mcpkit_transport_http as transport_http;
pub use mcpkit_transport_stdio as transport_stdio;
pub use mcpkit_types as types;

/// Everything needed to register handlers and stand up a transport, in one
/// `use`.
pub mod prelude {
    pub use mcpkit_core::context::{RequestContext, TransportKind};
    pub use mcpkit_core::session::{NullSink, OutboundFrame, Session, SessionId, SessionSink};
    pub use mcpkit_protocol::{ErrorKind, McpError, Result};
    pub use mcpkit_security::SecurityMiddleware;
    pub use mcpkit_server::{
        HandlerOutput, Outcome, PromptHandler, ResourceHandler, Server, ServerConfig, ToolHandler,
    };
    pub use mcpkit_transport_http as transport_http;
    pub use mcpkit_transport_stdio::StdioTransport;
    pub use mcpkit_types::{Content, ContentBlock, Prompt, PromptArgument, Resource, Root, Tool};
}
