use std::path::Path;
use std::time::Duration;

use groundlink_frame::{BufferPolicy, DeviceSerial, DEFAULT_MAX_PAYLOAD, MAX_PAYLOAD_LIMIT};
use groundlink_transport::Endpoint;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LinkError, Result};

/// Where the vehicle's link endpoint lives.
///
/// Loaded from a JSON document of the form
/// `{"server": "10.0.0.2", "port": 12345}`. `valid` is derived, never read
/// from the file: it holds when the address is non-empty and the port is
/// non-zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerConfig {
    #[serde(rename = "server")]
    pub address: String,
    pub port: u16,
    #[serde(skip)]
    pub valid: bool,
}

#[derive(Deserialize)]
struct ServerConfigFile {
    server: String,
    port: u16,
}

impl ServerConfig {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        let address = address.into();
        let valid = !address.is_empty() && port != 0;
        Self {
            address,
            port,
            valid,
        }
    }

    /// Parse a server config from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let file: ServerConfigFile = serde_json::from_str(text)?;
        Ok(Self::new(file.server, file.port))
    }

    /// Read and parse a server config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| LinkError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        debug!(path = %path.display(), address = %config.address, port = config.port, valid = config.valid, "loaded server config");
        Ok(config)
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.address.clone(), self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(String::new(), 0)
    }
}

/// Runtime settings for a [`Link`](crate::Link).
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Vehicle endpoint.
    pub server: ServerConfig,
    /// Serial stamped into control frames built by the link.
    pub serial: DeviceSerial,
    /// Reassembly policy for inbound bytes.
    pub policy: BufferPolicy,
    /// Pause between failed initial connection attempts.
    pub connect_backoff: Duration,
    /// Pause before each reconnect attempt after the peer closes.
    pub reconnect_backoff: Duration,
    /// Pause after a transient receive error.
    pub receive_error_backoff: Duration,
    /// Size of the receive scratch buffer.
    pub receive_buffer_size: usize,
    /// Cap on a decoded reply payload.
    pub max_payload: usize,
    /// Send a heartbeat this often; `None` disables the heartbeat worker.
    pub heartbeat_interval: Option<Duration>,
    /// Give up the initial connect after this many attempts; `None` retries
    /// forever.
    pub max_connect_attempts: Option<u32>,
}

impl LinkConfig {
    pub fn new(server: ServerConfig) -> Self {
        Self {
            server,
            ..Self::default()
        }
    }

    /// Check the settings a link cannot run without.
    pub fn validate(&self) -> Result<()> {
        if !self.server.valid {
            return Err(LinkError::InvalidConfig(format!(
                "server endpoint '{}:{}' needs a non-empty address and non-zero port",
                self.server.address, self.server.port
            )));
        }
        if self.receive_buffer_size == 0 {
            return Err(LinkError::InvalidConfig(
                "receive buffer size must be non-zero".to_string(),
            ));
        }
        if self.max_payload == 0 || self.max_payload > MAX_PAYLOAD_LIMIT {
            return Err(LinkError::InvalidConfig(format!(
                "max payload must be between 1 and {MAX_PAYLOAD_LIMIT} bytes"
            )));
        }
        if self.heartbeat_interval == Some(Duration::ZERO) {
            return Err(LinkError::InvalidConfig(
                "heartbeat interval must be non-zero".to_string(),
            ));
        }
        if self.max_connect_attempts == Some(0) {
            return Err(LinkError::InvalidConfig(
                "max connect attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            serial: DeviceSerial::default(),
            policy: BufferPolicy::Normal,
            connect_backoff: Duration::from_secs(3),
            reconnect_backoff: Duration::from_secs(1),
            receive_error_backoff: Duration::from_millis(50),
            receive_buffer_size: 1024,
            max_payload: DEFAULT_MAX_PAYLOAD,
            heartbeat_interval: None,
            max_connect_attempts: None,
        }
    }
}
