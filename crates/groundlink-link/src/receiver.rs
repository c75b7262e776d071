use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use groundlink_transport::{Endpoint, LinkTransport, TransportError};
use tracing::{debug, info, trace, warn};

use crate::queue::FrameQueue;
use crate::worker::{RunFlag, Waker, Worker};

/// Item on the raw queue between the receive and assemble workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Bytes read from the current connection.
    Chunk(Bytes),
    /// A new connection replaced the old one; bytes buffered from the old
    /// stream can no longer complete a frame.
    Reconnected,
}

/// Reads raw chunks off the transport into the raw queue.
///
/// An orderly close by the peer triggers a reconnect loop against the
/// configured endpoint, followed by an [`Inbound::Reconnected`] marker.
/// Transient read errors back off briefly and retry.
#[derive(Debug)]
pub struct ReceiveWorker<T> {
    transport: Arc<T>,
    raw: Arc<FrameQueue<Inbound>>,
    endpoint: Endpoint,
    buffer_size: usize,
    reconnect_backoff: Duration,
    error_backoff: Duration,
}

impl<T: LinkTransport> ReceiveWorker<T> {
    pub fn new(transport: Arc<T>, raw: Arc<FrameQueue<Inbound>>, endpoint: Endpoint) -> Self {
        Self {
            transport,
            raw,
            endpoint,
            buffer_size: 1024,
            reconnect_backoff: Duration::from_secs(1),
            error_backoff: Duration::from_millis(50),
        }
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    pub fn with_backoff(mut self, reconnect: Duration, error: Duration) -> Self {
        self.reconnect_backoff = reconnect;
        self.error_backoff = error;
        self
    }

    /// Keep reconnecting until it works or the worker is stopped.
    fn reconnect(&self, running: &RunFlag) -> bool {
        let mut attempt = 0u32;
        while running.sleep(self.reconnect_backoff) {
            attempt += 1;
            info!(endpoint = %self.endpoint, attempt, "reconnecting");
            match self.transport.connect(&self.endpoint) {
                Ok(()) => return true,
                Err(err) if err.is_shutdown() => return false,
                Err(err) => warn!(endpoint = %self.endpoint, attempt, %err, "reconnect failed"),
            }
        }
        false
    }
}

impl<T: LinkTransport> Worker for ReceiveWorker<T> {
    const NAME: &'static str = "receive";

    fn waker(&self) -> Waker {
        let transport = Arc::clone(&self.transport);
        Box::new(move || transport.close())
    }

    fn run(self, running: RunFlag) {
        let mut scratch = vec![0u8; self.buffer_size];
        while running.is_running() {
            match self.transport.receive(&mut scratch) {
                Ok(0) | Err(TransportError::NotConnected) => {
                    warn!(endpoint = %self.endpoint, "connection lost");
                    if !self.reconnect(&running) || !self.raw.push(Inbound::Reconnected) {
                        break;
                    }
                }
                Ok(n) => {
                    trace!(len = n, "received chunk");
                    if !self.raw.push(Inbound::Chunk(Bytes::copy_from_slice(&scratch[..n]))) {
                        break;
                    }
                }
                Err(err) if err.is_shutdown() => break,
                Err(err) => {
                    debug!(%err, "receive error");
                    if !running.sleep(self.error_backoff) {
                        break;
                    }
                }
            }
        }
    }
}
