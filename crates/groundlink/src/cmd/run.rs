use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use groundlink_frame::{BufferPolicy, DeviceSerial};
use groundlink_link::{dispatcher, Link, LinkConfig, ServerConfig};
use tracing::{debug, info};

use crate::cmd::RunArgs;
use crate::command::{self, Input};
use crate::exit::{frame_error, link_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_event, OutputFormat};

/// How often the command loop rechecks the Ctrl-C flag.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub fn run(args: RunArgs, format: OutputFormat) -> CliResult<i32> {
    let config = link_config(&args)?;
    let serial = config.serial;

    let mut link = Link::connect(
        config,
        dispatcher(move |event| print_event(&event, format)),
    )
    .map_err(|err| link_error("connect failed", err))?;
    link.start()
        .map_err(|err| link_error("start failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;
    let lines = spawn_stdin_reader()?;

    command_loop(&link, &serial, &lines, &running);

    link.stop();
    Ok(SUCCESS)
}

fn command_loop(link: &Link, serial: &DeviceSerial, lines: &Receiver<String>, running: &AtomicBool) {
    while running.load(Ordering::SeqCst) {
        let line = match lines.recv_timeout(POLL_INTERVAL) {
            Ok(line) => line,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                debug!("stdin closed");
                break;
            }
        };

        let input = match command::parse(&line) {
            Ok(Input::Exit) => break,
            Ok(input) => input,
            Err(err) => {
                eprintln!("error: {err}");
                continue;
            }
        };
        if let Some(frame) = input.to_frame(serial) {
            debug!(command = %input.label(), len = frame.len(), "queueing frame");
            if !link.push_outbound(frame) {
                break;
            }
        }
    }
    info!("leaving command loop");
}

/// Merge the config file (if any) with command-line overrides.
fn link_config(args: &RunArgs) -> CliResult<LinkConfig> {
    let file = match &args.config {
        Some(path) => ServerConfig::load(path).map_err(|err| link_error("config", err))?,
        None => ServerConfig::default(),
    };
    let address = args.server.clone().unwrap_or(file.address);
    let port = args.port.unwrap_or(file.port);

    let mut config = LinkConfig::new(ServerConfig::new(address, port));
    if let Some(serial) = &args.serial {
        config.serial = serial
            .parse()
            .map_err(|err| frame_error("invalid --serial", err))?;
    }
    if args.discard {
        config.policy = BufferPolicy::Discard;
    }
    config.heartbeat_interval = args.heartbeat.map(Duration::from_secs);
    config.max_connect_attempts = args.connect_attempts;
    Ok(config)
}

fn spawn_stdin_reader() -> CliResult<Receiver<String>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("groundlink-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })
        .map_err(|err| CliError::new(INTERNAL, format!("stdin reader failed to start: {err}")))?;
    Ok(rx)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
