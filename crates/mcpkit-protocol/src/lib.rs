//! JSON-RPC envelope, MCP error taxonomy, and capability negotiation.
//!
//! This crate has no notion of sessions, transports, or handlers — those
//! live in `mcpkit-core` and `mcpkit-server`. It is the wire-format layer
//! both sides of the dispatcher speak.

pub mod capabilities;
pub mod error;
pub mod jsonrpc;

pub use error::{ErrorKind, McpError, Result};
pub use jsonrpc::{
    JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, JsonRpcResponsePayload,
    JsonRpcVersion, RawFrame, ResponseId, JSONRPC_VERSION,
};
