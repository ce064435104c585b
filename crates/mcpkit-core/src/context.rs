//! `RequestContext`: immutable transport-level metadata attached to every
//! inbound message before it reaches the dispatcher (§3 RequestContext).

use std::collections::HashMap;

/// Which transport an inbound message arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Stdio,
    Http,
}

impl TransportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Http => "http",
        }
    }
}

/// Immutable per-message transport metadata.
///
/// Created by the transport before handing a frame to `Server::handle_message`
/// and never mutated afterward — every field is set at construction time via
/// `RequestContextBuilder`.
#[derive(Debug, Clone)]
pub struct RequestContext {
    headers: HashMap<String, String>,
    params: HashMap<String, String>,
    method: String,
    path: String,
    transport_kind: TransportKind,
    metadata: HashMap<String, String>,
}

impl RequestContext {
    /// Start building a context for the given transport kind.
    pub fn builder(transport_kind: TransportKind) -> RequestContextBuilder {
        RequestContextBuilder::new(transport_kind)
    }

    /// A minimal context for the stdio transport, which has no headers or
    /// query parameters (§4.4).
    pub fn minimal_stdio() -> Self {
        Self::builder(TransportKind::Stdio).build()
    }

    /// Case-normalized header lookup (headers are stored lower-cased).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// All headers, case-normalized keys.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// A query/body form parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// All query/body form parameters.
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// The JSON-RPC method name this context was built for.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The transport-level path (e.g. `/mcp`, or `stdio` for the stream
    /// transport).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Which transport this message arrived on.
    pub fn transport_kind(&self) -> TransportKind {
        self.transport_kind
    }

    /// Arbitrary transport metadata (e.g. remote addr, TLS info).
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

/// Builder for `RequestContext`. The context itself exposes no public
/// mutators — this is the only way to construct one.
#[derive(Debug, Clone)]
pub struct RequestContextBuilder {
    headers: HashMap<String, String>,
    params: HashMap<String, String>,
    method: String,
    path: String,
    transport_kind: TransportKind,
    metadata: HashMap<String, String>,
}

impl RequestContextBuilder {
    pub fn new(transport_kind: TransportKind) -> Self {
        Self {
            headers: HashMap::new(),
            params: HashMap::new(),
            method: String::new(),
            path: String::new(),
            transport_kind,
            metadata: HashMap::new(),
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    #[must_use]
    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        for (k, v) in headers {
            self.headers.insert(k.to_ascii_lowercase(), v);
        }
        self
    }

    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> RequestContext {
        RequestContext {
            headers: self.headers,
            params: self.params,
            method: self.method,
            path: self.path,
            transport_kind: self.transport_kind,
            metadata: self.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let ctx = RequestContext::builder(TransportKind::Http)
            .header("X-API-Key", "secret")
            .build();
        assert_eq!(ctx.header("x-api-key"), Some("secret"));
        assert_eq!(ctx.header("X-Api-Key"), Some("secret"));
    }

    #[test]
    fn minimal_stdio_has_no_headers_or_params() {
        let ctx = RequestContext::minimal_stdio();
        assert!(ctx.headers().is_empty());
        assert!(ctx.params().is_empty());
        assert_eq!(ctx.transport_kind().as_str(), "stdio");
    }
}
