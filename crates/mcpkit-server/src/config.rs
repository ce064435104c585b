//! Server configuration (SPEC_FULL §3/§6): the full option table, with a
//! builder for programmatic construction and a `config`-crate loader for
//! environment/file layering, mirroring `turbomcp-server::config`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Sampling-facility configuration (§6 `sampling.*`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub enabled: bool,
    pub timeout_seconds: u64,
    pub max_tokens_limit: Option<u32>,
    pub supports_streaming: bool,
    pub supports_tool_calls: bool,
    pub supports_images: bool,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_seconds: 30,
            max_tokens_limit: None,
            supports_streaming: false,
            supports_tool_calls: false,
            supports_images: false,
        }
    }
}

impl SamplingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// HTTP streaming transport configuration (§6 `http.*`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub path: String,
    pub host: String,
    pub port: u16,
    pub event_ring_capacity: usize,
    pub keepalive_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            path: "/mcp".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8080,
            event_ring_capacity: 64,
            keepalive_seconds: 15,
        }
    }
}

/// Per-session lifecycle configuration (§6 `session.*`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub idle_timeout_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { idle_timeout_seconds: 300 }
    }
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_seconds)
    }
}

/// Inbound frame size limits (§6 `buffer.*`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    pub max_frame_bytes: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self { max_frame_bytes: 10 * 1024 * 1024 }
    }
}

/// The full server configuration surface (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
    pub protocol_versions: Vec<String>,
    pub sampling: SamplingConfig,
    pub http: HttpConfig,
    pub session: SessionConfig,
    pub buffer: BufferConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "mcpkit-server".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            protocol_versions: vec!["2025-03-26".to_string()],
            sampling: SamplingConfig::default(),
            http: HttpConfig::default(),
            session: SessionConfig::default(),
            buffer: BufferConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Load configuration layering a base file, an optional environment
    /// override file, and `MCPKIT_`-prefixed environment variables, the way
    /// the teacher's server config loader layers its sources.
    pub fn load(base_path: Option<&str>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder().add_source(config::Config::try_from(&Self::default())?);
        if let Some(path) = base_path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        builder = builder.add_source(config::Environment::with_prefix("MCPKIT").separator("__"));
        let loaded: Self = builder.build()?.try_deserialize()?;
        Ok(loaded)
    }
}

/// Builder for [`ServerConfig`], chainable the way `ServerConfigBuilder`
/// works in the teacher's server crate.
#[derive(Debug, Clone, Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.config.version = version.into();
        self
    }

    #[must_use]
    pub fn protocol_versions(mut self, versions: Vec<String>) -> Self {
        self.config.protocol_versions = versions;
        self
    }

    #[must_use]
    pub fn sampling(mut self, sampling: SamplingConfig) -> Self {
        self.config.sampling = sampling;
        self
    }

    #[must_use]
    pub fn http(mut self, http: HttpConfig) -> Self {
        self.config.http = http;
        self
    }

    #[must_use]
    pub fn session(mut self, session: SessionConfig) -> Self {
        self.config.session = session;
        self
    }

    #[must_use]
    pub fn buffer(mut self, buffer: BufferConfig) -> Self {
        self.config.buffer = buffer;
        self
    }

    pub fn build(self) -> ServerConfig {
        self.config
    }
}
