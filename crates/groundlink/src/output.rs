use std::io::{self, IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use groundlink_link::LinkEvent;
use serde::Serialize;
use tracing::debug;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct EventOutput<'a> {
    event: &'a str,
    command_id: u8,
    #[serde(flatten)]
    ack: Option<AckOutput<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<String>,
    timestamp: String,
}

#[derive(Serialize)]
struct AckOutput<'a> {
    action: &'a str,
    action_id: u8,
    exec_result: u8,
    error_code: u32,
    device_serial: &'a str,
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    command: &'a str,
    length: usize,
    frame: String,
}

/// Print one decoded event from the vehicle.
///
/// Runs on the decode thread, so a closed stdout is logged rather than
/// allowed to panic.
pub fn print_event(event: &LinkEvent, format: OutputFormat) {
    let stdout = std::io::stdout();
    if let Err(err) = write_event(&mut stdout.lock(), event, format) {
        debug!(%err, "stdout write failed, event dropped");
    }
}

fn write_event<W: Write>(out: &mut W, event: &LinkEvent, format: OutputFormat) -> io::Result<()> {
    let ack = match event {
        LinkEvent::ControlAck(ack) => Some(AckOutput {
            action: ack.action_name(),
            action_id: ack.action_id,
            exec_result: ack.exec_result,
            error_code: ack.error_code,
            device_serial: &ack.device_serial,
        }),
        _ => None,
    };
    let payload = event.payload();

    match format {
        OutputFormat::Json => {
            let out_event = EventOutput {
                event: event.kind(),
                command_id: event.command_id(),
                ack,
                payload_size: payload.map(|p| p.len()),
                payload: payload.map(|p| hex(p)),
                timestamp: now_unix_seconds(),
            };
            writeln!(
                out,
                "{}",
                serde_json::to_string(&out_event).unwrap_or_else(|_| "{}".to_string())
            )?;
        }
        OutputFormat::Table => {
            let detail = match (&ack, payload) {
                (Some(ack), _) => format!(
                    "{} result={} error={:#010x} sn={}",
                    ack.action, ack.exec_result, ack.error_code, ack.device_serial
                ),
                (None, Some(p)) => preview(p),
                (None, None) => String::new(),
            };
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["EVENT", "CMD", "SIZE", "DETAIL"])
                .add_row(vec![
                    event.kind().to_string(),
                    format!("{:#04x}", event.command_id()),
                    payload.map_or_else(|| "-".to_string(), |p| p.len().to_string()),
                    detail,
                ]);
            writeln!(out, "{table}")?;
        }
        OutputFormat::Pretty => match (&ack, payload) {
            (Some(ack), _) => writeln!(
                out,
                "{} action={} ({:#04x}) result={} error_code={} sn={}",
                event.kind(),
                ack.action,
                ack.action_id,
                ack.exec_result,
                ack.error_code,
                ack.device_serial
            )?,
            (None, payload) => writeln!(
                out,
                "{} cmd={:#04x} size={} payload={}",
                event.kind(),
                event.command_id(),
                payload.map_or(0, |p| p.len()),
                payload.map(|p| preview(p)).unwrap_or_default()
            )?,
        },
        OutputFormat::Raw => {
            if let Some(p) = payload {
                out.write_all(p)?;
            }
        }
    }
    out.flush()
}

/// Print an encoded outbound frame.
pub fn print_frame(command: &str, frame: &[u8], format: OutputFormat) {
    let stdout = std::io::stdout();
    if let Err(err) = write_frame(&mut stdout.lock(), command, frame, format) {
        debug!(%err, "stdout write failed");
    }
}

fn write_frame<W: Write>(
    out: &mut W,
    command: &str,
    frame: &[u8],
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let out_frame = FrameOutput {
                command,
                length: frame.len(),
                frame: hex(frame),
            };
            writeln!(
                out,
                "{}",
                serde_json::to_string(&out_frame).unwrap_or_else(|_| "{}".to_string())
            )?;
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["COMMAND", "SIZE", "FRAME"])
                .add_row(vec![command.to_string(), frame.len().to_string(), hex(frame)]);
            writeln!(out, "{table}")?;
        }
        OutputFormat::Pretty => {
            writeln!(out, "{command} size={} frame={}", frame.len(), hex(frame))?;
        }
        OutputFormat::Raw => out.write_all(frame)?,
    }
    out.flush()
}

/// Space-separated upper-case hex, e.g. `74 79 00 09`.
pub fn hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn preview(payload: &[u8]) -> String {
    const MAX: usize = 32;
    if payload.len() <= MAX {
        hex(payload)
    } else {
        format!("{} ... (+{} bytes)", hex(&payload[..MAX]), payload.len() - MAX)
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    #[test]
    fn hex_is_spaced_upper_case() {
        assert_eq!(hex(&[0x74, 0x79, 0x00, 0x0a]), "74 79 00 0A");
        assert_eq!(hex(&[]), "");
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::ErrorKind::BrokenPipe.into())
        }
    }

    #[test]
    fn closed_stdout_is_an_error_not_a_panic() {
        let event = LinkEvent::Telemetry(Bytes::from_static(b"abc"));
        for format in [
            OutputFormat::Json,
            OutputFormat::Table,
            OutputFormat::Pretty,
            OutputFormat::Raw,
        ] {
            let err = write_event(&mut ClosedPipe, &event, format).unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        }
        assert!(write_frame(&mut ClosedPipe, "land", &[0x74, 0x79], OutputFormat::Json).is_err());
    }

    #[test]
    fn event_json_line() {
        let mut out = Vec::new();
        let event = LinkEvent::Unknown {
            command_id: 0x55,
            payload: Bytes::from_static(&[0x01, 0xAB]),
        };
        write_event(&mut out, &event, OutputFormat::Json).unwrap();

        let line = String::from_utf8(out).unwrap();
        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["event"], "unknown");
        assert_eq!(value["command_id"], 0x55);
        assert_eq!(value["payload"], "01 AB");
        assert_eq!(value["payload_size"], 2);
    }

    #[test]
    fn raw_frame_is_written_verbatim() {
        let mut out = Vec::new();
        write_frame(&mut out, "land", &[0x74, 0x79, 0x00], OutputFormat::Raw).unwrap();
        assert_eq!(out, vec![0x74, 0x79, 0x00]);
    }

    #[test]
    fn long_payload_preview_is_truncated() {
        let text = preview(&[0xAB; 40]);
        assert!(text.ends_with("... (+8 bytes)"));
        assert_eq!(preview(&[1, 2]), "01 02");
    }
}
