use std::sync::Arc;

use groundlink_transport::LinkTransport;
use tracing::{debug, trace, warn};

use crate::queue::FrameQueue;
use crate::worker::{RunFlag, Waker, Worker};

/// Drains the outbound queue onto the transport, one frame per send.
///
/// A frame whose send fails is logged and dropped; there is no retry.
#[derive(Debug)]
pub struct SendWorker<T> {
    transport: Arc<T>,
    outbound: Arc<FrameQueue>,
}

impl<T: LinkTransport> SendWorker<T> {
    pub fn new(transport: Arc<T>, outbound: Arc<FrameQueue>) -> Self {
        Self {
            transport,
            outbound,
        }
    }
}

impl<T: LinkTransport> Worker for SendWorker<T> {
    const NAME: &'static str = "send";

    fn waker(&self) -> Waker {
        let outbound = Arc::clone(&self.outbound);
        Box::new(move || outbound.close())
    }

    fn run(self, running: RunFlag) {
        while running.is_running() {
            let Some(frame) = self.outbound.pop() else {
                break;
            };
            match self.transport.send(&frame) {
                Ok(n) => trace!(len = n, "frame sent"),
                Err(err) if err.is_shutdown() => {
                    debug!(len = frame.len(), "transport closed, dropping frame")
                }
                Err(err) => warn!(%err, len = frame.len(), "send failed, dropping frame"),
            }
        }
    }
}
