use groundlink_frame::DeviceSerial;

use crate::cmd::EncodeArgs;
use crate::command::{self, Input};
use crate::exit::{command_error, frame_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let serial = match &args.serial {
        Some(serial) => serial
            .parse::<DeviceSerial>()
            .map_err(|err| frame_error("invalid --serial", err))?,
        None => DeviceSerial::default(),
    };

    let line = args.command.join(" ");
    let input = command::parse(&line).map_err(command_error)?;
    let frame = match &input {
        Input::Empty | Input::Exit => None,
        other => other.to_frame(&serial),
    }
    .ok_or_else(|| CliError::new(USAGE, format!("'{line}' does not produce a frame")))?;

    print_frame(&input.label(), &frame, format);
    Ok(SUCCESS)
}
