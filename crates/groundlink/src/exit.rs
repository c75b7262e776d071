use std::fmt;
use std::io;

use groundlink_frame::FrameError;
use groundlink_link::LinkError;
use groundlink_transport::TransportError;

use crate::command::CommandError;

pub const SUCCESS: i32 = 0;
#[allow(dead_code)]
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => DATA_INVALID,
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::TimedOut => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Io(source) => io_error(context, source),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::InvalidSerial { .. } => CliError::new(USAGE, format!("{context}: {err}")),
    }
}

pub fn link_error(context: &str, err: LinkError) -> CliError {
    match err {
        LinkError::Transport(err) => transport_error(context, err),
        LinkError::Frame(err) => frame_error(context, err),
        LinkError::InvalidConfig(_) => CliError::new(USAGE, format!("{context}: {err}")),
        LinkError::ConfigRead { .. } | LinkError::ConfigParse(_) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        LinkError::ConnectAttemptsExhausted { .. } => {
            CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
        }
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn command_error(err: CommandError) -> CliError {
    match err {
        CommandError::RoutePlan { source, .. } => io_error("route plan", source),
        other => CliError::new(USAGE, other.to_string()),
    }
}
