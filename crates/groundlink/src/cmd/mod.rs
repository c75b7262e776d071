use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod encode;
pub mod run;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect to the vehicle and send commands read from stdin.
    Run(RunArgs),
    /// Print the frame a command would send, without connecting.
    Encode(EncodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Run(args) => run::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Server config file (`{"server": "<host>", "port": <port>}`).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Vehicle address; overrides the config file.
    #[arg(long, env = "GROUNDLINK_SERVER")]
    pub server: Option<String>,
    /// Vehicle port; overrides the config file.
    #[arg(long, env = "GROUNDLINK_PORT")]
    pub port: Option<u16>,
    /// 15-character device serial stamped into control frames.
    #[arg(long)]
    pub serial: Option<String>,
    /// Drop stale partial frames instead of waiting for them.
    #[arg(long)]
    pub discard: bool,
    /// Send a heartbeat every SECS seconds.
    #[arg(long, value_name = "SECS")]
    pub heartbeat: Option<u64>,
    /// Give up after N failed connection attempts (default: retry forever).
    #[arg(long, value_name = "N")]
    pub connect_attempts: Option<u32>,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// 15-character device serial stamped into control frames.
    #[arg(long)]
    pub serial: Option<String>,
    /// Command words, e.g. `takeoff 10` or `camera zoom in`.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
