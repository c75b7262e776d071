//! Typed routing of decoded replies.
//!
//! The vehicle answers a control frame with a `0xD1` ack, and pushes
//! telemetry (`0xA9`) and vehicle state (`0xA8`) blobs on its own schedule.
//! Everything else is reported as [`LinkEvent::Unknown`].

use bytes::Bytes;
use groundlink_frame::action::action_name;
use groundlink_frame::{Reply, CMD_CONTROL, CMD_TELEMETRY, CMD_VEHICLE_STATE, SERIAL_LEN};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Minimum `0xD1` ack payload: enc, action, result, error code (4), serial.
pub const CONTROL_ACK_LEN: usize = 3 + 4 + SERIAL_LEN;

/// Vehicle acknowledgement of a control frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlAck {
    pub encryption_flag: u8,
    pub action_id: u8,
    pub exec_result: u8,
    pub error_code: u32,
    pub device_serial: String,
}

impl ControlAck {
    /// Parse an ack payload; `None` if it is too short.
    pub fn parse(payload: &[u8]) -> Option<Self> {
        if payload.len() < CONTROL_ACK_LEN {
            return None;
        }
        let error_code = u32::from_be_bytes([payload[3], payload[4], payload[5], payload[6]]);
        let serial = &payload[7..CONTROL_ACK_LEN];
        Some(Self {
            encryption_flag: payload[0],
            action_id: payload[1],
            exec_result: payload[2],
            error_code,
            device_serial: String::from_utf8_lossy(serial).into_owned(),
        })
    }

    /// Name of the acknowledged action.
    pub fn action_name(&self) -> &'static str {
        action_name(self.action_id)
    }
}

/// A decoded reply, classified by command id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    ControlAck(ControlAck),
    Telemetry(Bytes),
    VehicleState(Bytes),
    /// A known command whose payload could not be parsed.
    Malformed {
        command_id: u8,
        payload: Bytes,
    },
    Unknown {
        command_id: u8,
        payload: Bytes,
    },
}

impl LinkEvent {
    pub fn from_reply(reply: Reply<'_>) -> Self {
        let payload = || Bytes::copy_from_slice(reply.payload);
        match reply.command_id {
            CMD_CONTROL => match ControlAck::parse(reply.payload) {
                Some(ack) => LinkEvent::ControlAck(ack),
                None => LinkEvent::Malformed {
                    command_id: reply.command_id,
                    payload: payload(),
                },
            },
            CMD_TELEMETRY => LinkEvent::Telemetry(payload()),
            CMD_VEHICLE_STATE => LinkEvent::VehicleState(payload()),
            command_id => LinkEvent::Unknown {
                command_id,
                payload: payload(),
            },
        }
    }

    pub fn command_id(&self) -> u8 {
        match self {
            LinkEvent::ControlAck(_) => CMD_CONTROL,
            LinkEvent::Telemetry(_) => CMD_TELEMETRY,
            LinkEvent::VehicleState(_) => CMD_VEHICLE_STATE,
            LinkEvent::Malformed { command_id, .. } | LinkEvent::Unknown { command_id, .. } => {
                *command_id
            }
        }
    }

    /// Short label for display and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            LinkEvent::ControlAck(_) => "control-ack",
            LinkEvent::Telemetry(_) => "telemetry",
            LinkEvent::VehicleState(_) => "vehicle-state",
            LinkEvent::Malformed { .. } => "malformed",
            LinkEvent::Unknown { .. } => "unknown",
        }
    }

    /// Raw payload bytes; a control ack has none left after parsing.
    pub fn payload(&self) -> Option<&Bytes> {
        match self {
            LinkEvent::ControlAck(_) => None,
            LinkEvent::Telemetry(p) | LinkEvent::VehicleState(p) => Some(p),
            LinkEvent::Malformed { payload, .. } | LinkEvent::Unknown { payload, .. } => {
                Some(payload)
            }
        }
    }
}

/// Adapt an event handler into a reply callback for the decode worker.
///
/// Each event is logged before it reaches `handler`.
pub fn dispatcher<H>(mut handler: H) -> impl FnMut(Reply<'_>) + Send + 'static
where
    H: FnMut(LinkEvent) + Send + 'static,
{
    move |reply: Reply<'_>| {
        let event = LinkEvent::from_reply(reply);
        match &event {
            LinkEvent::ControlAck(ack) => debug!(
                action = ack.action_name(),
                exec_result = ack.exec_result,
                error_code = ack.error_code,
                "control ack"
            ),
            LinkEvent::Telemetry(p) => debug!(len = p.len(), "telemetry"),
            LinkEvent::VehicleState(p) => debug!(len = p.len(), "vehicle state"),
            LinkEvent::Malformed {
                command_id,
                payload,
            } => warn!(
                command_id = format_args!("{command_id:#04x}"),
                len = payload.len(),
                "malformed reply"
            ),
            LinkEvent::Unknown {
                command_id,
                payload,
            } => info!(
                command_id = format_args!("{command_id:#04x}"),
                len = payload.len(),
                "unknown command id"
            ),
        }
        handler(event);
    }
}
