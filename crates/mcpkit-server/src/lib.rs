//! The MCP dispatcher: registry, built-in handlers, sampling, and
//! configuration (§4.2, §4.7–§4.9).
//!
//! Transports (`mcpkit-transport-stdio`, `mcpkit-transport-http`) own the
//! byte-level framing and call [`Server::handle_message`] for every inbound
//! frame; this crate has no knowledge of sockets or stdio.

pub mod config;
pub mod content;
pub mod dispatcher;
pub mod handlers;
pub mod registry;
pub mod sampling;
pub mod validation;

pub use config::ServerConfig;
pub use content::HandlerOutput;
pub use dispatcher::{Outcome, Server};
pub use registry::{PromptHandler, ResourceHandler, ToolHandler};
pub use sampling::{sample, IncludeContext, SamplingContent, SamplingMessage, SamplingParams, SamplingRole};
