//! Byte-at-a-time reply decoder.
//!
//! Re-parses each assembled inbound frame through a four-state machine and
//! reports `(command id, payload)` to a registered callback:
//!
//! ```text
//!  SeekHeader ──(prev=6A, cur=77)──▶ Length ──(2 bytes)──▶ Command ──(1 byte)──▶ Payload
//!      ▲                                                                           │
//!      └────────────────────────── payloadLength bytes collected ─────────────────┘
//! ```
//!
//! The machine does not trust the assembler's framing: it finds the header
//! on its own, so it is also the single place payload boundaries are
//! computed.

use tracing::trace;

use crate::codec::INBOUND_MAGIC;

/// Default cap on a decoded payload, in bytes.
pub const DEFAULT_MAX_PAYLOAD: usize = 512;

/// Largest payload a 2-byte length field can describe (the command id
/// takes one byte of it).
pub const MAX_PAYLOAD_LIMIT: usize = u16::MAX as usize - 1;

/// One decoded reply, valid for the duration of the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply<'a> {
    pub command_id: u8,
    pub payload: &'a [u8],
}

impl Reply<'_> {
    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    SeekHeader,
    Length,
    Command,
    Payload,
}

/// Four-state reply decoder driving a callback.
pub struct ReplyDecoder<F> {
    state: State,
    prev: Option<u8>,
    length_bytes: [u8; 2],
    length_read: usize,
    command_id: u8,
    payload_len: usize,
    payload: Vec<u8>,
    max_payload: usize,
    on_reply: F,
}

impl<F> ReplyDecoder<F>
where
    F: FnMut(Reply<'_>),
{
    pub fn new(on_reply: F) -> Self {
        Self::with_max_payload(DEFAULT_MAX_PAYLOAD, on_reply)
    }

    /// Create a decoder that clamps payloads to `max_payload` bytes.
    ///
    /// Caps above [`MAX_PAYLOAD_LIMIT`] are lowered to it.
    pub fn with_max_payload(max_payload: usize, on_reply: F) -> Self {
        let max_payload = max_payload.min(MAX_PAYLOAD_LIMIT);
        Self {
            state: State::SeekHeader,
            prev: None,
            length_bytes: [0; 2],
            length_read: 0,
            command_id: 0,
            payload_len: 0,
            payload: Vec::with_capacity(max_payload.min(DEFAULT_MAX_PAYLOAD)),
            max_payload,
            on_reply,
        }
    }

    /// Decode one assembled frame from a clean state.
    ///
    /// Returns the number of replies delivered to the callback.
    pub fn decode_frame(&mut self, frame: &[u8]) -> usize {
        self.reset();
        frame.iter().map(|&byte| usize::from(self.feed(byte))).sum()
    }

    /// Advance the machine by one byte. Returns true when the byte
    /// completed a reply.
    pub fn feed(&mut self, byte: u8) -> bool {
        let completed = match self.state {
            State::SeekHeader => {
                if self.prev == Some(INBOUND_MAGIC[0]) && byte == INBOUND_MAGIC[1] {
                    self.length_read = 0;
                    self.state = State::Length;
                }
                false
            }
            State::Length => {
                self.length_bytes[self.length_read] = byte;
                self.length_read += 1;
                if self.length_read == self.length_bytes.len() {
                    let declared = u16::from_be_bytes(self.length_bytes) as usize;
                    // The command id byte is counted in the length field.
                    self.payload_len = declared.saturating_sub(1).min(self.max_payload);
                    self.state = State::Command;
                }
                false
            }
            State::Command => {
                self.command_id = byte;
                self.payload.clear();
                if self.payload_len == 0 {
                    self.complete();
                    true
                } else {
                    self.state = State::Payload;
                    false
                }
            }
            State::Payload => {
                self.payload.push(byte);
                if self.payload.len() == self.payload_len {
                    self.complete();
                    true
                } else {
                    false
                }
            }
        };
        self.prev = Some(byte);
        completed
    }

    /// Return to `SeekHeader` and forget any partial reply.
    pub fn reset(&mut self) {
        self.state = State::SeekHeader;
        self.prev = None;
        self.length_bytes = [0; 2];
        self.length_read = 0;
        self.payload_len = 0;
        self.payload.clear();
    }

    pub fn max_payload(&self) -> usize {
        self.max_payload
    }

    fn complete(&mut self) {
        trace!(
            command_id = self.command_id,
            len = self.payload.len(),
            "decoded reply"
        );
        (self.on_reply)(Reply {
            command_id: self.command_id,
            payload: &self.payload,
        });
        self.state = State::SeekHeader;
    }
}

impl<F> std::fmt::Debug for ReplyDecoder<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyDecoder")
            .field("state", &self.state)
            .field("command_id", &self.command_id)
            .field("payload_len", &self.payload_len)
            .field("max_payload", &self.max_payload)
            .finish()
    }
}
