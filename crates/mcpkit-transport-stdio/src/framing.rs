//! Frame scanner for the stdio transport (§4.4).
//!
//! Tracks JSON object brace depth while respecting quoted strings and
//! escapes. A complete top-level object terminates a frame; a newline seen
//! outside any object also terminates a frame (so bare, non-object lines and
//! blank lines are handled without waiting for a brace to close). Frames
//! that exceed the configured maximum size are rejected and the buffer is
//! reset so a single oversized message cannot wedge the scanner forever.

/// Result of feeding bytes into the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// A complete frame, not yet JSON-parsed.
    Frame(Vec<u8>),
    /// The in-progress frame exceeded the configured maximum size; the
    /// scanner has already reset its buffer.
    Oversized,
}

/// Incremental brace-depth scanner over an arbitrary byte stream.
#[derive(Debug)]
pub struct FrameScanner {
    buffer: Vec<u8>,
    depth: u32,
    in_string: bool,
    escaped: bool,
    started: bool,
    max_frame_bytes: usize,
}

impl FrameScanner {
    pub fn new(max_frame_bytes: usize) -> Self {
        Self {
            buffer: Vec::new(),
            depth: 0,
            in_string: false,
            escaped: false,
            started: false,
            max_frame_bytes,
        }
    }

    /// Feed a chunk of bytes, returning zero or more scan events in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<ScanEvent> {
        let mut events = Vec::new();
        for &byte in chunk {
            self.buffer.push(byte);

            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if byte == b'\\' {
                    self.escaped = true;
                } else if byte == b'"' {
                    self.in_string = false;
                }
            } else {
                match byte {
                    b'"' => {
                        self.in_string = true;
                        self.started = true;
                    }
                    b'{' => {
                        self.depth += 1;
                        self.started = true;
                    }
                    b'}' => {
                        if self.depth > 0 {
                            self.depth -= 1;
                        }
                        if self.depth == 0 && self.started {
                            events.push(ScanEvent::Frame(self.take_buffer()));
                        }
                    }
                    b'\n' if self.depth == 0 => {
                        let frame = self.take_buffer();
                        let content = &frame[..frame.len().saturating_sub(1)];
                        if !content.iter().all(u8::is_ascii_whitespace) {
                            events.push(ScanEvent::Frame(content.to_vec()));
                        }
                    }
                    _ => {}
                }
            }

            if self.buffer.len() > self.max_frame_bytes {
                self.reset();
                events.push(ScanEvent::Oversized);
            }
        }
        events
    }

    fn take_buffer(&mut self) -> Vec<u8> {
        self.started = false;
        std::mem::take(&mut self.buffer)
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.depth = 0;
        self.in_string = false;
        self.escaped = false;
        self.started = false;
    }
}

/// Lenient best-effort scan for a top-level `"id"` so a Parse error response
/// can still correlate to the client's request even though the frame never
/// fully parsed as JSON (§4.4, §7).
pub fn salvage_id(bytes: &[u8]) -> Option<mcpkit_types::RequestId> {
    let text = std::str::from_utf8(bytes).ok()?;
    let key_pos = text.find("\"id\"")?;
    let after_key = &text[key_pos + 4..];
    let colon_pos = after_key.find(':')?;
    let value_start = after_key[colon_pos + 1..].trim_start();
    if let Some(rest) = value_start.strip_prefix('"') {
        let end = rest.find('"')?;
        return Some(mcpkit_types::RequestId::String(rest[..end].to_string()));
    }
    let end = value_start
        .find(|c: char| c == ',' || c == '}' || c.is_ascii_whitespace())
        .unwrap_or(value_start.len());
    let number_text = &value_start[..end];
    number_text.parse::<i64>().ok().map(mcpkit_types::RequestId::Number)
}
