//! Operator text commands.
//!
//! One line of whitespace-separated words becomes one outbound frame, e.g.
//! `takeoff 10`, `camera zoom in`, `gimbal move abs 0 0 90`.

use std::path::PathBuf;
use std::str::FromStr;

use bytes::Bytes;
use groundlink_frame::action::ObstacleSensor;
use groundlink_frame::{build_heartbeat, build_registration, Action, DeviceSerial};

/// A parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Blank line.
    Empty,
    /// Leave the command loop.
    Exit,
    Heartbeat,
    Register { company_id: u32, token: String },
    Action(Action),
}

impl Input {
    /// The frame this input sends, if any.
    pub fn to_frame(&self, serial: &DeviceSerial) -> Option<Bytes> {
        match self {
            Input::Empty | Input::Exit => None,
            Input::Heartbeat => Some(build_heartbeat()),
            Input::Register { company_id, token } => {
                Some(build_registration(*company_id, token.as_bytes()))
            }
            Input::Action(action) => Some(action.to_frame(serial)),
        }
    }

    /// Short label for display.
    pub fn label(&self) -> String {
        match self {
            Input::Empty => "empty".to_string(),
            Input::Exit => "exit".to_string(),
            Input::Heartbeat => "heartbeat".to_string(),
            Input::Register { .. } => "register".to_string(),
            Input::Action(action) => groundlink_frame::action::action_name(action.id()).to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid {expected} '{token}'")]
    InvalidNumber {
        token: String,
        expected: &'static str,
    },

    #[error("{0} is not supported from the command line")]
    Unsupported(&'static str),

    #[error("failed to read route plan {path}: {source}")]
    RoutePlan {
        path: PathBuf,
        source: std::io::Error,
    },
}

type Result<T> = std::result::Result<T, CommandError>;

/// Parse one command line.
pub fn parse(line: &str) -> Result<Input> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, rest)) = words.split_first() else {
        return Ok(Input::Empty);
    };
    let args = Args { words: rest };

    let action = match head {
        "exit" | "quit" => return Ok(Input::Exit),
        "heartbeat" => return Ok(Input::Heartbeat),
        "register" => {
            const USAGE: &str = "register <company_id> <access_token>";
            return Ok(Input::Register {
                company_id: args.number(0, USAGE, "company id")?,
                token: args.word(1, USAGE)?.to_string(),
            });
        }
        "takeoff" => Action::Takeoff {
            height: args.number(0, "takeoff <height>", "height")?,
        },
        "land" => match args.get(0) {
            None => Action::Land,
            Some("cancel") => Action::CancelLand,
            Some("force") => Action::ForceLand,
            Some(_) => return Err(CommandError::Usage("land [cancel|force]")),
        },
        "rth" => match args.get(0) {
            None => Action::ReturnHome,
            Some("cancel") => Action::CancelReturn,
            Some(_) => return Err(CommandError::Usage("rth [cancel]")),
        },
        "control" => parse_control(&args)?,
        "goto" => parse_goto(&args)?,
        "brake" => Action::Brake(args.number(0, "brake <0|1>", "brake type")?),
        "route" => parse_route(&args)?,
        "camera" => parse_camera(&args)?,
        "gimbal" => parse_gimbal(&args)?,
        "obstacle" => parse_obstacle(&args)?,
        "home" => parse_home(&args)?,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Input::Action(action))
}

struct Args<'a> {
    words: &'a [&'a str],
}

impl<'a> Args<'a> {
    fn get(&self, idx: usize) -> Option<&'a str> {
        self.words.get(idx).copied()
    }

    fn word(&self, idx: usize, usage: &'static str) -> Result<&'a str> {
        self.get(idx).ok_or(CommandError::Usage(usage))
    }

    fn number<T: FromStr>(&self, idx: usize, usage: &'static str, expected: &'static str) -> Result<T> {
        let token = self.word(idx, usage)?;
        token.parse().map_err(|_| CommandError::InvalidNumber {
            token: token.to_string(),
            expected,
        })
    }

    /// Arguments after the first `skip` words.
    fn tail(&self, skip: usize) -> Args<'a> {
        Args {
            words: self.words.get(skip..).unwrap_or_default(),
        }
    }
}

fn parse_control(args: &Args<'_>) -> Result<Action> {
    if args.get(0) == Some("authority") {
        return Ok(Action::ControlAuthority(args.number(
            1,
            "control authority <0|1>",
            "authority",
        )?));
    }
    const USAGE: &str = "control <forward> <right> <up> <yaw> <duration_ms>";
    Ok(Action::Stick {
        forward: args.number(0, USAGE, "speed")?,
        right: args.number(1, USAGE, "speed")?,
        up: args.number(2, USAGE, "speed")?,
        yaw: args.number(3, USAGE, "yaw")?,
        duration_ms: args.number(4, USAGE, "duration")?,
    })
}

fn parse_goto(args: &Args<'_>) -> Result<Action> {
    if args.get(0) == Some("stop") {
        return Ok(Action::GotoStop);
    }
    const USAGE: &str = "goto <lon> <lat> <alt> <speed> <mode> | goto stop";
    Ok(Action::Goto {
        longitude: args.number(0, USAGE, "longitude")?,
        latitude: args.number(1, USAGE, "latitude")?,
        altitude: args.number(2, USAGE, "altitude")?,
        speed: args.number(3, USAGE, "speed")?,
        mode: args.number(4, USAGE, "mode")?,
    })
}

fn parse_route(args: &Args<'_>) -> Result<Action> {
    const USAGE: &str = "route <plan <file>|start|pause|resume|stop>";
    Ok(match args.word(0, USAGE)? {
        "plan" => {
            let path = PathBuf::from(args.word(1, "route plan <file>")?);
            let plan = std::fs::read(&path)
                .map_err(|source| CommandError::RoutePlan { path, source })?;
            Action::RoutePlan(Bytes::from(plan))
        }
        "start" => Action::RouteStart,
        "pause" => Action::RoutePause,
        "resume" => Action::RouteResume,
        "stop" => Action::RouteStop,
        _ => return Err(CommandError::Usage(USAGE)),
    })
}

fn parse_camera(args: &Args<'_>) -> Result<Action> {
    const USAGE: &str =
        "camera <shot|video|zoom|focus|laser|measure|switch|source|mode|format|photortp> ...";
    let sub = args.tail(1);
    Ok(match args.word(0, USAGE)? {
        "shot" => match (sub.get(0), sub.get(1)) {
            (None, _) => Action::Shoot,
            (Some("auto"), Some("start")) => match sub.get(2) {
                None => Action::IntervalShoot(3),
                Some(_) => Action::IntervalShoot(sub.number(
                    2,
                    "camera shot auto start [seconds]",
                    "interval",
                )?),
            },
            (Some("auto"), Some("stop")) => Action::IntervalShoot(0),
            _ => return Err(CommandError::Usage("camera shot [auto start [seconds]|auto stop]")),
        },
        "video" => match sub.get(0) {
            Some("start") => Action::VideoStart,
            Some("stop") => Action::VideoStop,
            _ => return Err(CommandError::Usage("camera video <start|stop>")),
        },
        "zoom" => match sub.word(0, "camera zoom <in|out|reset|stop|level>")? {
            "in" => Action::ZoomIn,
            "out" => Action::ZoomOut,
            "reset" => Action::ZoomReset,
            "stop" => Action::ZoomStop,
            _ => Action::ZoomLevel(sub.number(0, "camera zoom <level>", "zoom level")?),
        },
        "focus" => Action::Focus {
            x: sub.number(0, "camera focus <x> <y>", "coordinate")?,
            y: sub.number(1, "camera focus <x> <y>", "coordinate")?,
        },
        "measure" => Action::Measure {
            x: sub.number(0, "camera measure <x> <y>", "coordinate")?,
            y: sub.number(1, "camera measure <x> <y>", "coordinate")?,
        },
        "laser" => Action::Laser(sub.number(0, "camera laser <0|1>", "laser state")?),
        "switch" => Action::CameraSwitch(sub.number(0, "camera switch <0|1>", "camera")?),
        "source" => Action::VideoSource(sub.number(0, "camera source <0|1|2>", "source")?),
        "mode" => Action::CameraMode(sub.number(0, "camera mode <1|2>", "mode")?),
        "format" => Action::FormatStorage,
        "photortp" => Action::PhotoStream(sub.number(0, "camera photortp <0|1>", "state")?),
        _ => return Err(CommandError::Usage(USAGE)),
    })
}

fn parse_gimbal(args: &Args<'_>) -> Result<Action> {
    const USAGE: &str = "gimbal <move|follow|set> ...";
    let sub = args.tail(1);
    Ok(match args.word(0, USAGE)? {
        "move" => {
            const ABS: &str = "gimbal move abs <pitch> <roll> <yaw>";
            const SPEED: &str = "gimbal move speed <pitch> <roll> <yaw> <duration_ms>";
            let params = sub.tail(1);
            match sub.word(0, "gimbal move <abs|speed> ...")? {
                "abs" => Action::GimbalAbsolute {
                    pitch: params.number(0, ABS, "angle")?,
                    roll: params.number(1, ABS, "angle")?,
                    yaw: params.number(2, ABS, "angle")?,
                },
                "speed" => Action::GimbalSpeed {
                    pitch: params.number(0, SPEED, "speed")?,
                    roll: params.number(1, SPEED, "speed")?,
                    yaw: params.number(2, SPEED, "speed")?,
                    duration_ms: params.number(3, SPEED, "duration")?,
                },
                "joystick" => return Err(CommandError::Unsupported("gimbal joystick mode")),
                _ => return Err(CommandError::Usage("gimbal move <abs|speed> ...")),
            }
        }
        "follow" => Action::GimbalFollow(sub.number(0, "gimbal follow <1|2|3>", "mode")?),
        "set" => Action::GimbalAttitude(sub.number(0, "gimbal set <0|1|2|3>", "attitude")?),
        _ => return Err(CommandError::Usage(USAGE)),
    })
}

fn parse_obstacle(args: &Args<'_>) -> Result<Action> {
    const USAGE: &str = "obstacle <horizontal|up|down> <0|1>";
    let sensor = match args.word(0, USAGE)? {
        "horizontal" => ObstacleSensor::Horizontal,
        "up" => ObstacleSensor::Up,
        "down" => ObstacleSensor::Down,
        _ => return Err(CommandError::Usage(USAGE)),
    };
    let enabled = match args.word(1, USAGE)? {
        "1" | "on" => true,
        "0" | "off" => false,
        _ => return Err(CommandError::Usage(USAGE)),
    };
    Ok(Action::Obstacle { sensor, enabled })
}

fn parse_home(args: &Args<'_>) -> Result<Action> {
    const USAGE: &str = "home <set <lon> <lat>|height <meters>>";
    let sub = args.tail(1);
    Ok(match args.word(0, USAGE)? {
        "set" => Action::HomePosition {
            longitude: sub.number(0, "home set <lon> <lat>", "longitude")?,
            latitude: sub.number(1, "home set <lon> <lat>", "latitude")?,
        },
        "height" => Action::ReturnHeight(sub.number(0, "home height <meters>", "height")?),
        _ => return Err(CommandError::Usage(USAGE)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(line: &str) -> Action {
        match parse(line).unwrap() {
            Input::Action(action) => action,
            other => panic!("expected action for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn blank_and_exit() {
        assert_eq!(parse("   ").unwrap(), Input::Empty);
        assert_eq!(parse("exit").unwrap(), Input::Exit);
        assert!(Input::Exit.to_frame(&DeviceSerial::default()).is_none());
    }

    #[test]
    fn flight_commands() {
        assert_eq!(action("takeoff 10"), Action::Takeoff { height: 10.0 });
        assert_eq!(action("land"), Action::Land);
        assert_eq!(action("land cancel"), Action::CancelLand);
        assert_eq!(action("land force"), Action::ForceLand);
        assert_eq!(action("rth"), Action::ReturnHome);
        assert_eq!(action("rth cancel"), Action::CancelReturn);
        assert_eq!(action("control authority 1"), Action::ControlAuthority(1));
        assert_eq!(
            action("control 1 0 -1.5 90 500"),
            Action::Stick {
                forward: 1.0,
                right: 0.0,
                up: -1.5,
                yaw: 90.0,
                duration_ms: 500,
            }
        );
        assert_eq!(action("goto stop"), Action::GotoStop);
        assert_eq!(
            action("goto 113.5 22.25 50 5 1"),
            Action::Goto {
                longitude: 113.5,
                latitude: 22.25,
                altitude: 50.0,
                speed: 5.0,
                mode: 1,
            }
        );
        assert_eq!(action("brake 1"), Action::Brake(1));
    }

    #[test]
    fn camera_commands() {
        assert_eq!(action("camera shot"), Action::Shoot);
        assert_eq!(action("camera shot auto start"), Action::IntervalShoot(3));
        assert_eq!(action("camera shot auto start 5"), Action::IntervalShoot(5));
        assert_eq!(action("camera shot auto stop"), Action::IntervalShoot(0));
        assert_eq!(action("camera video start"), Action::VideoStart);
        assert_eq!(action("camera zoom in"), Action::ZoomIn);
        assert_eq!(action("camera zoom stop"), Action::ZoomStop);
        assert_eq!(action("camera zoom 4"), Action::ZoomLevel(4));
        assert_eq!(action("camera focus 0.5 0.5"), Action::Focus { x: 0.5, y: 0.5 });
        assert_eq!(action("camera measure 1 2"), Action::Measure { x: 1.0, y: 2.0 });
        assert_eq!(action("camera format"), Action::FormatStorage);
        assert_eq!(action("camera photortp 1"), Action::PhotoStream(1));
    }

    #[test]
    fn gimbal_and_settings() {
        assert_eq!(
            action("gimbal move abs 0 0 90"),
            Action::GimbalAbsolute {
                pitch: 0.0,
                roll: 0.0,
                yaw: 90.0,
            }
        );
        assert_eq!(action("gimbal follow 2"), Action::GimbalFollow(2));
        assert_eq!(action("gimbal set 3"), Action::GimbalAttitude(3));
        assert_eq!(
            action("obstacle up 1"),
            Action::Obstacle {
                sensor: ObstacleSensor::Up,
                enabled: true,
            }
        );
        assert_eq!(action("home height 120"), Action::ReturnHeight(120));
        assert_eq!(
            action("home set 113.5 22.25"),
            Action::HomePosition {
                longitude: 113.5,
                latitude: 22.25,
            }
        );
    }

    #[test]
    fn register_and_heartbeat_frames() {
        let input = parse("register 209938 abc").unwrap();
        let frame = input.to_frame(&DeviceSerial::default()).unwrap();
        assert_eq!(
            frame.as_ref(),
            &[0x74, 0x79, 0x00, 0x08, 0x01, 0x00, 0x03, 0x34, 0x12, 0x61, 0x62, 0x63]
        );

        let heartbeat = parse("heartbeat").unwrap().to_frame(&DeviceSerial::default()).unwrap();
        assert_eq!(&heartbeat[..5], &[0x74, 0x79, 0x00, 0x09, 0x02]);
    }

    #[test]
    fn route_plan_reads_file() {
        let path = std::env::temp_dir().join(format!("groundlink-plan-{}.bin", std::process::id()));
        std::fs::write(&path, b"\x08\x01plan").unwrap();
        let parsed = action(&format!("route plan {}", path.display()));
        std::fs::remove_file(&path).unwrap();
        assert_eq!(parsed, Action::RoutePlan(Bytes::from_static(b"\x08\x01plan")));

        assert!(matches!(
            parse("route plan /nonexistent/groundlink/plan.bin"),
            Err(CommandError::RoutePlan { .. })
        ));
    }

    #[test]
    fn errors() {
        assert!(matches!(parse("fly away"), Err(CommandError::Unknown(cmd)) if cmd == "fly"));
        assert!(matches!(parse("takeoff"), Err(CommandError::Usage(_))));
        assert!(matches!(
            parse("takeoff high"),
            Err(CommandError::InvalidNumber { expected: "height", .. })
        ));
        assert!(matches!(parse("brake 300"), Err(CommandError::InvalidNumber { .. })));
        assert!(matches!(parse("land sideways"), Err(CommandError::Usage(_))));
        assert!(matches!(
            parse("gimbal move joystick"),
            Err(CommandError::Unsupported(_))
        ));
    }

    #[test]
    fn labels() {
        assert_eq!(parse("camera zoom in").unwrap().label(), "zoom-in");
        assert_eq!(parse("heartbeat").unwrap().label(), "heartbeat");
    }
}
