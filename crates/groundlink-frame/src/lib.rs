//! Wire framing for the vehicle link protocol.
//!
//! Two independent framings, one per direction:
//! - Outbound (ground → vehicle): magic `0x74 0x79`, a 2-byte big-endian
//!   length, then a command-specific body (heartbeat, registration, control).
//! - Inbound (vehicle → ground): magic `0x6A 0x77`, a 2-byte big-endian
//!   length, a command id, then the payload.
//!
//! Everything in this crate is synchronous and owns its buffers; the
//! threaded pipeline that drives it lives in `groundlink-link`.

pub mod action;
pub mod assembler;
pub mod codec;
pub mod decoder;
pub mod error;

pub use action::Action;
pub use assembler::{BufferPolicy, FrameAssembler};
pub use codec::{
    build_control, build_control_with, build_heartbeat, build_heartbeat_at, build_registration,
    encode_inbound, frame_length, DeviceSerial, CMD_CONTROL, CMD_HEARTBEAT, CMD_REGISTER,
    CMD_TELEMETRY, CMD_VEHICLE_STATE, INBOUND_MAGIC, OUTBOUND_MAGIC, PREFIX_SIZE, SERIAL_LEN,
};
pub use decoder::{Reply, ReplyDecoder, DEFAULT_MAX_PAYLOAD, MAX_PAYLOAD_LIMIT};
pub use error::{FrameError, Result};
