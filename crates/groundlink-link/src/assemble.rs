use std::sync::Arc;

use groundlink_frame::{BufferPolicy, FrameAssembler};
use tracing::debug;

use crate::queue::FrameQueue;
use crate::receiver::Inbound;
use crate::worker::{RunFlag, Waker, Worker};

/// Turns raw chunks into complete inbound frames.
///
/// A reconnect marker discards whatever partial frame the previous
/// connection left buffered.
#[derive(Debug)]
pub struct AssembleWorker {
    raw: Arc<FrameQueue<Inbound>>,
    complete: Arc<FrameQueue>,
    assembler: FrameAssembler,
}

impl AssembleWorker {
    pub fn new(
        raw: Arc<FrameQueue<Inbound>>,
        complete: Arc<FrameQueue>,
        policy: BufferPolicy,
    ) -> Self {
        Self {
            raw,
            complete,
            assembler: FrameAssembler::new(policy),
        }
    }
}

impl Worker for AssembleWorker {
    const NAME: &'static str = "assemble";

    fn waker(&self) -> Waker {
        let raw = Arc::clone(&self.raw);
        Box::new(move || raw.close())
    }

    fn run(mut self, running: RunFlag) {
        while running.is_running() {
            match self.raw.pop() {
                Some(Inbound::Chunk(chunk)) => {
                    let complete = &self.complete;
                    self.assembler.push_with(&chunk, |frame| {
                        complete.push(frame);
                    });
                }
                Some(Inbound::Reconnected) => {
                    let stale = self.assembler.buffered();
                    if stale > 0 {
                        debug!(stale, "dropping partial frame from previous connection");
                    }
                    self.assembler.clear();
                }
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::{Duration, Instant};

    use bytes::Bytes;
    use groundlink_frame::encode_inbound;

    use super::*;
    use crate::worker::WorkerHandle;

    fn pop(queue: &FrameQueue) -> Bytes {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(frame) = queue.try_pop() {
                return frame;
            }
            assert!(Instant::now() < deadline, "no frame in time");
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn frames_split_across_chunks_are_reassembled() {
        let raw = Arc::new(FrameQueue::new("raw"));
        let complete = Arc::new(FrameQueue::new("complete"));
        let mut handle = WorkerHandle::spawn(AssembleWorker::new(
            Arc::clone(&raw),
            Arc::clone(&complete),
            BufferPolicy::Normal,
        ))
        .unwrap();

        let first = encode_inbound(0xA9, b"telemetry");
        let second = encode_inbound(0xA8, b"state");
        let mut wire = first.to_vec();
        wire.extend_from_slice(&second);
        for piece in wire.chunks(3) {
            raw.push(Inbound::Chunk(Bytes::copy_from_slice(piece)));
        }

        assert_eq!(pop(&complete), first);
        assert_eq!(pop(&complete), second);
        handle.request_stop();
        handle.join();
        assert!(raw.is_closed());
    }

    #[test]
    fn reconnect_marker_discards_partial_frame() {
        let raw = Arc::new(FrameQueue::new("raw"));
        let complete = Arc::new(FrameQueue::new("complete"));
        let mut handle = WorkerHandle::spawn(AssembleWorker::new(
            Arc::clone(&raw),
            Arc::clone(&complete),
            BufferPolicy::Normal,
        ))
        .unwrap();

        // Header promises 0x14 bytes but the connection drops after two.
        raw.push(Inbound::Chunk(Bytes::from_static(&[0x6A, 0x77, 0x00, 0x14, 0xA9, 0x01, 0x02])));
        raw.push(Inbound::Reconnected);
        let fresh = encode_inbound(0x55, b"fresh");
        raw.push(Inbound::Chunk(fresh.clone()));

        assert_eq!(pop(&complete), fresh);
        handle.request_stop();
        handle.join();
    }
}
