//! Streamable HTTP transport: a single endpoint accepting POST, GET, and
//! DELETE, with per-session SSE push and replay (§4.5, §4.6).
//!
//! As with the stdio transport, this crate owns only the HTTP-specific
//! session bookkeeping and wire shaping; every parsed frame still goes
//! through [`mcpkit_server::Server::handle_message`].

pub mod event_ring;
pub mod http;
pub mod session_manager;

pub use event_ring::{EventRing, RingEvent};
pub use http::{router, serve};
pub use session_manager::{HttpSession, SessionManager};
