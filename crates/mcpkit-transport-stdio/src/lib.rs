//! Line-oriented JSON-RPC transport over process stdio (§4.4).
//!
//! Owns byte-level framing only; every parsed frame is handed to
//! [`mcpkit_server::Server::handle_message`], which has no knowledge of
//! stdio, sockets, or any other transport concern.

pub mod framing;
pub mod transport;

pub use framing::{salvage_id, FrameScanner, ScanEvent};
pub use transport::StdioTransport;
