use std::sync::Arc;

use groundlink_frame::{Reply, ReplyDecoder};

use crate::queue::FrameQueue;
use crate::worker::{RunFlag, Waker, Worker};

/// Boxed reply callback run on the decode thread.
pub type ReplyHandler = Box<dyn FnMut(Reply<'_>) + Send>;

/// Runs each complete frame through the reply decoder.
///
/// The callback executes on this worker's thread; a slow handler backs up
/// the complete-frame queue, not the socket.
#[derive(Debug)]
pub struct DecodeWorker<F> {
    complete: Arc<FrameQueue>,
    decoder: ReplyDecoder<F>,
}

impl<F> DecodeWorker<F>
where
    F: FnMut(Reply<'_>) + Send + 'static,
{
    pub fn new(complete: Arc<FrameQueue>, max_payload: usize, on_reply: F) -> Self {
        Self {
            complete,
            decoder: ReplyDecoder::with_max_payload(max_payload, on_reply),
        }
    }
}

impl<F> Worker for DecodeWorker<F>
where
    F: FnMut(Reply<'_>) + Send + 'static,
{
    const NAME: &'static str = "decode";

    fn waker(&self) -> Waker {
        let complete = Arc::clone(&self.complete);
        Box::new(move || complete.close())
    }

    fn run(mut self, running: RunFlag) {
        while running.is_running() {
            let Some(frame) = self.complete.pop() else {
                break;
            };
            self.decoder.decode_frame(&frame);
        }
    }
}
