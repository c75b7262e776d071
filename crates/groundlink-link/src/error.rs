use std::path::PathBuf;

use groundlink_transport::Endpoint;

/// Errors that can occur while configuring or running a link.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// The server configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for a server config.
    #[error("malformed config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] groundlink_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] groundlink_frame::FrameError),

    /// A worker thread could not be spawned.
    #[error("failed to spawn {name} worker: {source}")]
    Spawn {
        name: &'static str,
        source: std::io::Error,
    },

    /// Initial connection gave up after the configured attempt budget.
    #[error("gave up connecting to {endpoint} after {attempts} attempts")]
    ConnectAttemptsExhausted { endpoint: Endpoint, attempts: u32 },

    /// `start` was called on a running link.
    #[error("link already running")]
    AlreadyRunning,

    /// The link was stopped and cannot be restarted.
    #[error("link stopped")]
    Stopped,
}

pub type Result<T> = std::result::Result<T, LinkError>;
