use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Outbound (ground → vehicle) magic bytes.
pub const OUTBOUND_MAGIC: [u8; 2] = [0x74, 0x79];

/// Inbound (vehicle → ground) magic bytes.
pub const INBOUND_MAGIC: [u8; 2] = [0x6A, 0x77];

/// Magic (2) + length (2).
pub const PREFIX_SIZE: usize = 4;

/// Device serial width on the wire.
pub const SERIAL_LEN: usize = 15;

/// Registration frame command id.
pub const CMD_REGISTER: u8 = 0x01;
/// Heartbeat frame command id.
pub const CMD_HEARTBEAT: u8 = 0x02;
/// Control frame command id (also used by the vehicle for control acks).
pub const CMD_CONTROL: u8 = 0xD1;
/// Inbound telemetry blob.
pub const CMD_TELEMETRY: u8 = 0xA9;
/// Inbound vehicle state blob.
pub const CMD_VEHICLE_STATE: u8 = 0xA8;

/// Encryption flag value for plaintext control frames.
pub const ENCRYPTION_NONE: u8 = 0x00;

/// Heartbeat length field: command id (1) + timestamp (8).
const HEARTBEAT_LENGTH: u16 = 9;

const DEFAULT_SERIAL: [u8; SERIAL_LEN] = *b"DBM250974065008";

/// Fixed-width ASCII identifier of the airborne device.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceSerial([u8; SERIAL_LEN]);

impl DeviceSerial {
    /// Validate and wrap a serial string.
    pub fn new(serial: &str) -> Result<Self> {
        let bytes = serial.as_bytes();
        if bytes.len() != SERIAL_LEN || !serial.is_ascii() {
            return Err(FrameError::InvalidSerial {
                serial: serial.to_string(),
                len: bytes.len(),
            });
        }
        let mut out = [0u8; SERIAL_LEN];
        out.copy_from_slice(bytes);
        Ok(Self(out))
    }

    pub fn as_bytes(&self) -> &[u8; SERIAL_LEN] {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        // Construction guarantees ASCII.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl Default for DeviceSerial {
    fn default() -> Self {
        Self(DEFAULT_SERIAL)
    }
}

impl FromStr for DeviceSerial {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl fmt::Display for DeviceSerial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for DeviceSerial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DeviceSerial").field(&self.as_str()).finish()
    }
}

/// Build a heartbeat stamped with the current epoch seconds.
pub fn build_heartbeat() -> Bytes {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    build_heartbeat_at(now)
}

/// Build a heartbeat for an explicit timestamp.
///
/// ```text
/// ┌──────────┬─────────┬──────┬──────────────────────┐
/// │ 74 79    │ 00 09   │ 02   │ timestamp (8B BE)     │
/// └──────────┴─────────┴──────┴──────────────────────┘
/// ```
pub fn build_heartbeat_at(unix_seconds: u64) -> Bytes {
    let mut dst = BytesMut::with_capacity(PREFIX_SIZE + HEARTBEAT_LENGTH as usize);
    dst.put_slice(&OUTBOUND_MAGIC);
    dst.put_u16(HEARTBEAT_LENGTH);
    dst.put_u8(CMD_HEARTBEAT);
    dst.put_u64(unix_seconds);
    dst.freeze()
}

/// Build a registration frame.
///
/// ```text
/// ┌──────────┬─────────┬──────┬──────────────┬──────────────────┐
/// │ 74 79    │ len(2)  │ 01   │ company (4B) │ access token (N) │
/// └──────────┴─────────┴──────┴──────────────┴──────────────────┘
/// ```
pub fn build_registration(company_id: u32, access_token: impl AsRef<[u8]>) -> Bytes {
    let token = access_token.as_ref();
    let mut dst = BytesMut::with_capacity(PREFIX_SIZE + 5 + token.len());
    start_frame(&mut dst);
    dst.put_u8(CMD_REGISTER);
    dst.put_u32(company_id);
    dst.put_slice(token);
    patch_length(&mut dst);
    dst.freeze()
}

/// Build a control frame with the default device serial.
pub fn build_control(action_id: u8, action_params: &[u8]) -> Bytes {
    build_control_with(&DeviceSerial::default(), action_id, action_params)
}

/// Build a control frame for a specific device.
///
/// ```text
/// ┌───────┬────────┬─────────────┬──────┬─────────┬────────┬────────────┐
/// │ 74 79 │ len(2) │ serial(15B) │ D1   │ enc(1)  │ act(1) │ params (N) │
/// └───────┴────────┴─────────────┴──────┴─────────┴────────┴────────────┘
/// ```
///
/// The length field is back-patched after every field is written. Params
/// that push the body past `u16::MAX` yield a wrapped length rather than an
/// error.
pub fn build_control_with(serial: &DeviceSerial, action_id: u8, action_params: &[u8]) -> Bytes {
    let mut dst = BytesMut::with_capacity(PREFIX_SIZE + SERIAL_LEN + 3 + action_params.len());
    start_frame(&mut dst);
    dst.put_slice(serial.as_bytes());
    dst.put_u8(CMD_CONTROL);
    dst.put_u8(ENCRYPTION_NONE);
    dst.put_u8(action_id);
    dst.put_slice(action_params);
    patch_length(&mut dst);
    dst.freeze()
}

/// Build an inbound (vehicle → ground) frame.
///
/// The ground station never sends these; vehicle simulators and tests do.
pub fn encode_inbound(command_id: u8, payload: &[u8]) -> Bytes {
    let mut dst = BytesMut::with_capacity(PREFIX_SIZE + 1 + payload.len());
    dst.put_slice(&INBOUND_MAGIC);
    dst.put_u16(0);
    dst.put_u8(command_id);
    dst.put_slice(payload);
    patch_length(&mut dst);
    dst.freeze()
}

/// Read the big-endian length field of a frame in either direction.
pub fn frame_length(frame: &[u8]) -> Option<u16> {
    if frame.len() < PREFIX_SIZE {
        return None;
    }
    Some(u16::from_be_bytes([frame[2], frame[3]]))
}

fn start_frame(dst: &mut BytesMut) {
    dst.put_slice(&OUTBOUND_MAGIC);
    dst.put_u16(0);
}

fn patch_length(dst: &mut BytesMut) {
    let length = (dst.len() - PREFIX_SIZE) as u16;
    dst[2..PREFIX_SIZE].copy_from_slice(&length.to_be_bytes());
}
