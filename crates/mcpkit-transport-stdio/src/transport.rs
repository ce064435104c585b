//! `StdioTransport`: the run loop wiring the frame scanner to
//! [`mcpkit_server::Server`] (§4.4, §5).
//!
//! Single-threaded cooperative: one reader, one writer, handlers run inline
//! between reads. A long-running handler blocks new input, which is
//! acceptable for the stdio use case (§5).

use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, error, warn};

use mcpkit_core::context::RequestContext;
use mcpkit_core::session::{OutboundFrame, Session, SessionSink};
use mcpkit_protocol::jsonrpc::{JsonRpcError, JsonRpcResponse, RawFrame};
use mcpkit_protocol::{McpError, Result};
use mcpkit_server::{Outcome, Server};

use crate::framing::{salvage_id, FrameScanner, ScanEvent};

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Writes outbound frames to stdout, one JSON object per line, flushed
/// immediately. The writer is the sole producer (§4.4), so a plain
/// `std::sync::Mutex` around a blocking write is enough; it is only ever
/// held for the duration of a single `write_all` + `flush`.
#[derive(Debug)]
struct StdoutSink {
    out: StdMutex<std::io::Stdout>,
}

impl StdoutSink {
    fn new() -> Self {
        Self { out: StdMutex::new(std::io::stdout()) }
    }

    fn write_line(&self, line: &str) -> Result<()> {
        use std::io::Write;
        let mut out = self.out.lock().expect("stdout mutex poisoned");
        out.write_all(line.as_bytes())
            .and_then(|()| out.write_all(b"\n"))
            .and_then(|()| out.flush())
            .map_err(|e| McpError::internal(format!("stdout write failed: {e}")).into_box())
    }
}

impl SessionSink for StdoutSink {
    fn push(&self, frame: OutboundFrame) -> Result<()> {
        let line = match frame {
            OutboundFrame::Response(resp) => serde_json::to_string(&resp),
            OutboundFrame::Notification(n) => serde_json::to_string(&n),
            OutboundFrame::Request(r) => serde_json::to_string(&r),
        }
        .map_err(|e| McpError::internal(format!("failed to serialize outbound frame: {e}")).into_box())?;
        self.write_line(&line)
    }
}

/// The stdio transport: reads newline/brace-delimited JSON-RPC frames from
/// stdin and writes responses to stdout.
#[derive(Debug)]
pub struct StdioTransport {
    server: Arc<Server>,
    session: Arc<Session>,
    max_frame_bytes: usize,
}

impl StdioTransport {
    /// Create a transport bound to one freshly-tracked [`Session`] (§4.4:
    /// "creates one Session bound to this transport with a minimal
    /// RequestContext").
    pub fn new(server: Arc<Server>) -> Self {
        let max_frame_bytes = server.config().buffer.max_frame_bytes;
        let session = Arc::new(Session::new(RequestContext::minimal_stdio(), Arc::new(StdoutSink::new())));
        server.track_session(Arc::clone(&session));
        Self { server, session, max_frame_bytes }
    }

    /// Drive the transport to completion: reads stdin until EOF (clean
    /// shutdown) or until `shutdown` resolves (drain-and-exit on interrupt).
    pub async fn run(self, mut shutdown: tokio::sync::oneshot::Receiver<()>) -> Result<()> {
        let mut stdin = tokio::io::stdin();
        let mut scanner = FrameScanner::new(self.max_frame_bytes);
        let mut buf = vec![0u8; READ_CHUNK_SIZE];

        loop {
            let read = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    debug!("stdio transport received shutdown signal, draining and exiting");
                    break;
                }
                read = stdin.read(&mut buf) => read,
            };

            let n = match read {
                Ok(0) => {
                    debug!("stdio transport saw EOF, shutting down cleanly");
                    break;
                }
                Ok(n) => n,
                Err(e) => {
                    error!("stdio transport read error: {e}");
                    break;
                }
            };

            for event in scanner.feed(&buf[..n]) {
                match event {
                    ScanEvent::Frame(bytes) => self.handle_frame_bytes(&bytes).await,
                    ScanEvent::Oversized => self.handle_oversized(),
                }
            }
        }

        self.server.untrack_session(self.session.id());
        Ok(())
    }

    async fn handle_frame_bytes(&self, bytes: &[u8]) {
        let frame: RawFrame = match serde_json::from_slice(bytes) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("stdio transport failed to parse frame: {e}");
                let id = salvage_id(bytes);
                let error = JsonRpcError::from(McpError::parse(format!("invalid JSON: {e}")));
                let response = match id {
                    Some(id) => JsonRpcResponse::error_for(error, id),
                    None => JsonRpcResponse::error_without_id(error),
                };
                self.write_response(response);
                return;
            }
        };

        match self.server.handle_message(frame, &self.session).await {
            Ok(Outcome::Response(response)) => self.write_response(response),
            Ok(Outcome::NoReply) => {}
            Err(e) => {
                warn!("stdio transport: unhandled dispatcher error: {e}");
                self.write_response(JsonRpcResponse::error_without_id(JsonRpcError::from(&*e)));
            }
        }
    }

    fn handle_oversized(&self) {
        warn!("stdio transport: frame exceeded max_frame_bytes, buffer reset");
        let error = JsonRpcError::from(McpError::parse("frame exceeded maximum buffer size"));
        self.write_response(JsonRpcResponse::error_without_id(error));
    }

    fn write_response(&self, response: JsonRpcResponse) {
        if let Err(e) = self.session.push(OutboundFrame::Response(response)) {
            error!("stdio transport: failed to write response: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct RecordingSink {
        lines: StdMutex<Vec<String>>,
    }

    impl SessionSink for RecordingSink {
        fn push(&self, frame: OutboundFrame) -> Result<()> {
            let line = match frame {
                OutboundFrame::Response(r) => serde_json::to_string(&r).unwrap(),
                OutboundFrame::Notification(n) => serde_json::to_string(&n).unwrap(),
                OutboundFrame::Request(r) => serde_json::to_string(&r).unwrap(),
            };
            self.lines.lock().unwrap().push(line);
            Ok(())
        }
    }

    #[tokio::test]
    async fn parse_error_response_carries_salvaged_id() {
        let server = Server::new(mcpkit_server::ServerConfig::default());
        let sink = Arc::new(RecordingSink::default());
        let session = Arc::new(Session::new(RequestContext::minimal_stdio(), sink.clone()));
        server.track_session(Arc::clone(&session));

        let transport = StdioTransport {
            server: Arc::clone(&server),
            session,
            max_frame_bytes: 1024,
        };

        transport
            .handle_frame_bytes(br#"{"jsonrpc":"2.0","id":7,"method":"ping","params":"#)
            .await;

        let lines = sink.lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("\"id\":7"));
        assert!(lines[0].contains("-32700"));
    }

    #[tokio::test]
    async fn bad_jsonrpc_version_gets_an_error_response_instead_of_silence() {
        let server = Server::new(mcpkit_server::ServerConfig::default());
        let sink = Arc::new(RecordingSink::default());
        let session = Arc::new(Session::new(RequestContext::minimal_stdio(), sink.clone()));
        server.track_session(Arc::clone(&session));

        let transport = StdioTransport {
            server: Arc::clone(&server),
            session,
            max_frame_bytes: 1024,
        };

        transport
            .handle_frame_bytes(br#"{"jsonrpc":"1.0","id":1,"method":"ping"}"#)
            .await;

        let lines = sink.lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("-32600"));
    }

    #[tokio::test]
    async fn ping_before_initialize_round_trips_through_the_transport() {
        let server = Server::new(mcpkit_server::ServerConfig::default());
        let sink = Arc::new(RecordingSink::default());
        let session = Arc::new(Session::new(RequestContext::minimal_stdio(), sink.clone()));
        server.track_session(Arc::clone(&session));

        let transport = StdioTransport {
            server: Arc::clone(&server),
            session,
            max_frame_bytes: 1024,
        };

        transport
            .handle_frame_bytes(br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#)
            .await;

        let lines = sink.lines.lock().unwrap();
        assert_eq!(lines.len(), 1);

        use pretty_assertions::assert_eq;
        let parsed: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(parsed, serde_json::json!({"jsonrpc": "2.0", "id": 1, "result": {}}));
    }
}
