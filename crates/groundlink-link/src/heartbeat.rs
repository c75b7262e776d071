use std::sync::Arc;
use std::time::Duration;

use groundlink_frame::build_heartbeat;
use tracing::trace;

use crate::queue::FrameQueue;
use crate::worker::{RunFlag, Waker, Worker};

/// Queues a heartbeat frame every `interval`.
#[derive(Debug)]
pub struct HeartbeatWorker {
    outbound: Arc<FrameQueue>,
    interval: Duration,
}

impl HeartbeatWorker {
    pub fn new(outbound: Arc<FrameQueue>, interval: Duration) -> Self {
        Self { outbound, interval }
    }
}

impl Worker for HeartbeatWorker {
    const NAME: &'static str = "heartbeat";

    fn waker(&self) -> Waker {
        // The interval wait is a RunFlag sleep.
        Box::new(|| {})
    }

    fn run(self, running: RunFlag) {
        while running.sleep(self.interval) {
            if !self.outbound.push(build_heartbeat()) {
                break;
            }
            trace!("heartbeat queued");
        }
    }
}
