//! Per-session state: request context, handshake status, security context,
//! and the in-flight request table.
//!
//! This crate sits between `mcpkit-protocol` (wire types) and
//! `mcpkit-server` (dispatch logic): it knows about sessions and transports
//! only through the `SessionSink` trait, never about concrete transports.

pub mod context;
pub mod inflight;
pub mod security;
pub mod session;

pub use context::{RequestContext, RequestContextBuilder, TransportKind};
pub use inflight::{InFlightEntry, InFlightGuard, InFlightTable};
pub use security::{Identity, SecurityContext, ANONYMOUS};
pub use session::{NullSink, OutboundFrame, Session, SessionId, SessionSink};
