use std::fmt;

use crate::error::Result;

/// A `host:port` pair the link connects to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub address: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// A stream transport shared by the send and receive workers.
///
/// Every method takes `&self`: one thread may sit in [`receive`] while
/// another calls [`send`] or [`close`]. Implementations must never hold an
/// internal lock across the blocking socket call.
///
/// [`receive`]: LinkTransport::receive
/// [`send`]: LinkTransport::send
/// [`close`]: LinkTransport::close
pub trait LinkTransport: Send + Sync + 'static {
    /// Connect (or reconnect) to `endpoint`, replacing any current stream.
    fn connect(&self, endpoint: &Endpoint) -> Result<()>;

    /// Write all of `bytes`, returning the number written.
    fn send(&self, bytes: &[u8]) -> Result<usize>;

    /// Read into `buf`.
    ///
    /// `Ok(0)` means the peer closed the stream in an orderly way.
    /// `Err(TransportError::Shutdown)` means [`close`](LinkTransport::close)
    /// was called; any other error is transient.
    fn receive(&self, buf: &mut [u8]) -> Result<usize>;

    /// Shut the transport down and wake a blocked `receive`.
    ///
    /// Safe to call more than once and from any thread.
    fn close(&self);

    /// Whether a stream is currently held.
    fn is_connected(&self) -> bool;
}
