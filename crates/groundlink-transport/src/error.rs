use crate::traits::Endpoint;

/// Errors that can occur in link transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The endpoint address did not resolve to any socket address.
    #[error("failed to resolve {endpoint}: {source}")]
    Resolve {
        endpoint: Endpoint,
        source: std::io::Error,
    },

    /// Failed to connect to the specified endpoint.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: Endpoint,
        source: std::io::Error,
    },

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No stream is currently connected.
    #[error("transport not connected")]
    NotConnected,

    /// The transport has been shut down.
    #[error("transport shut down")]
    Shutdown,
}

impl TransportError {
    /// True when the error means the transport was closed locally and will
    /// not come back.
    pub fn is_shutdown(&self) -> bool {
        matches!(self, TransportError::Shutdown)
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
