use bytes::{Buf, Bytes, BytesMut};
use tracing::{debug, trace};

use crate::codec::{INBOUND_MAGIC, PREFIX_SIZE};

const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024;

/// What to do with bytes that cannot form a frame yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BufferPolicy {
    /// Keep partial frames until the rest arrives; extract every complete
    /// frame from each push.
    #[default]
    Normal,
    /// Favor freshness: drop a partial frame shorter than half its declared
    /// size, and drop everything left over after one frame is produced.
    Discard,
}

/// Reassembles inbound frames from arbitrary stream chunks.
///
/// Frames may straddle chunks, several may arrive in one chunk, and leading
/// garbage is skipped one byte at a time until the inbound magic lines up.
/// Emitted frames are complete wire frames, magic and length included.
#[derive(Debug)]
pub struct FrameAssembler {
    buf: BytesMut,
    policy: BufferPolicy,
}

impl FrameAssembler {
    pub fn new(policy: BufferPolicy) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            policy,
        }
    }

    /// Append a chunk and collect every frame it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Bytes> {
        let mut frames = Vec::new();
        self.push_with(chunk, |frame| frames.push(frame));
        frames
    }

    /// Append a chunk and hand each completed frame to `emit`, in order.
    pub fn push_with<F: FnMut(Bytes)>(&mut self, chunk: &[u8], mut emit: F) {
        self.buf.extend_from_slice(chunk);
        self.drain(&mut emit);
    }

    /// Bytes currently held back waiting for more data.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn policy(&self) -> BufferPolicy {
        self.policy
    }

    /// Drop everything buffered.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    fn drain<F: FnMut(Bytes)>(&mut self, emit: &mut F) {
        let discard = self.policy == BufferPolicy::Discard;
        let mut skipped = 0usize;

        loop {
            if self.buf.len() < PREFIX_SIZE {
                if discard && self.buf.len() < PREFIX_SIZE - 1 {
                    self.buf.clear();
                }
                break;
            }

            if self.buf[..2] != INBOUND_MAGIC {
                self.buf.advance(1);
                skipped += 1;
                continue;
            }

            let length = u16::from_be_bytes([self.buf[2], self.buf[3]]) as usize;
            let total = PREFIX_SIZE + length;

            if self.buf.len() < total {
                // Strictly under half the declared frame counts as stale.
                if discard && self.buf.len() * 2 < total {
                    debug!(
                        buffered = self.buf.len(),
                        expected = total,
                        "dropping stale partial frame"
                    );
                    self.buf.clear();
                }
                break;
            }

            let frame = self.buf.split_to(total).freeze();
            trace!(len = frame.len(), "assembled frame");
            emit(frame);

            if discard {
                if !self.buf.is_empty() {
                    debug!(dropped = self.buf.len(), "discarding bytes after frame");
                }
                self.buf.clear();
                break;
            }
        }

        if skipped > 0 {
            debug!(skipped, "resynchronized on inbound magic");
        }
    }
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new(BufferPolicy::Normal)
    }
}
