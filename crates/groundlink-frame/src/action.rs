//! Vehicle actions carried in control frames.
//!
//! Each action has a one-byte id and a fixed parameter layout. Multi-byte
//! parameters are big-endian; floats are sent as their IEEE-754 bit
//! pattern, most significant byte first.

use bytes::{BufMut, Bytes, BytesMut};

use crate::codec::{build_control_with, DeviceSerial};

pub const ZOOM_IN: u8 = 0x0A;
pub const ZOOM_OUT: u8 = 0x0B;
pub const ZOOM_LEVEL: u8 = 0x0D;
pub const ZOOM_RESET: u8 = 0x0F;
pub const ZOOM_STOP: u8 = 0xFF;
pub const GIMBAL_ABSOLUTE: u8 = 0x09;
pub const GIMBAL_SPEED: u8 = 0xF4;
pub const GIMBAL_FOLLOW: u8 = 0x1C;
pub const GIMBAL_ATTITUDE: u8 = 0x1D;
pub const ROUTE_PLAN: u8 = 0x10;
pub const TAKEOFF: u8 = 0x11;
pub const RETURN_HOME: u8 = 0x12;
pub const CANCEL_RETURN: u8 = 0x13;
pub const LAND: u8 = 0x14;
pub const CANCEL_LAND: u8 = 0x15;
pub const ROUTE_START: u8 = 0x17;
pub const ROUTE_PAUSE: u8 = 0x18;
pub const ROUTE_RESUME: u8 = 0x19;
pub const LASER: u8 = 0x1A;
pub const FOCUS: u8 = 0x1B;
pub const ROUTE_STOP: u8 = 0x20;
pub const RETURN_HEIGHT: u8 = 0x21;
pub const CAMERA_MODE: u8 = 0x22;
pub const SHOOT: u8 = 0x23;
pub const VIDEO_START: u8 = 0x24;
pub const VIDEO_STOP: u8 = 0x25;
pub const VIDEO_SOURCE: u8 = 0x26;
pub const CAMERA_SWITCH: u8 = 0x27;
pub const STICK: u8 = 0x28;
pub const FORCE_LAND: u8 = 0x29;
pub const CONTROL_AUTHORITY: u8 = 0x30;
pub const HOME_POSITION: u8 = 0x31;
pub const BRAKE: u8 = 0x32;
pub const OBSTACLE_HORIZONTAL: u8 = 0x35;
pub const OBSTACLE_UP: u8 = 0x36;
pub const OBSTACLE_DOWN: u8 = 0x37;
pub const INTERVAL_SHOOT: u8 = 0x38;
pub const GOTO: u8 = 0x39;
pub const GOTO_STOP: u8 = 0x3A;
pub const FORMAT_STORAGE: u8 = 0x40;
pub const PHOTO_STREAM: u8 = 0x43;
pub const MEASURE: u8 = 0xFB;

/// Direction an obstacle-avoidance toggle applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleSensor {
    Horizontal,
    Up,
    Down,
}

/// A vehicle command, ready to be framed.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Takeoff { height: f32 },
    ReturnHome,
    CancelReturn,
    Land,
    CancelLand,
    ForceLand,
    Stick {
        forward: f32,
        right: f32,
        up: f32,
        yaw: f32,
        duration_ms: u16,
    },
    ControlAuthority(u8),
    Goto {
        longitude: f64,
        latitude: f64,
        altitude: f32,
        speed: f32,
        mode: u8,
    },
    GotoStop,
    Brake(u8),

    /// Opaque, already-serialized route plan.
    RoutePlan(Bytes),
    RouteStart,
    RoutePause,
    RouteResume,
    RouteStop,

    Shoot,
    /// Interval in seconds; 0 stops interval shooting.
    IntervalShoot(u8),
    VideoStart,
    VideoStop,
    ZoomIn,
    ZoomOut,
    ZoomReset,
    ZoomStop,
    ZoomLevel(u8),
    Focus { x: f32, y: f32 },
    Laser(u8),
    Measure { x: f32, y: f32 },
    CameraSwitch(u8),
    VideoSource(u8),
    CameraMode(u8),
    FormatStorage,
    PhotoStream(u8),

    GimbalAbsolute { pitch: f32, roll: f32, yaw: f32 },
    GimbalSpeed {
        pitch: f32,
        roll: f32,
        yaw: f32,
        duration_ms: u16,
    },
    GimbalFollow(u8),
    GimbalAttitude(u8),

    Obstacle { sensor: ObstacleSensor, enabled: bool },
    HomePosition { longitude: f64, latitude: f64 },
    ReturnHeight(u16),
}

impl Action {
    /// The one-byte action id.
    pub fn id(&self) -> u8 {
        match self {
            Action::Takeoff { .. } => TAKEOFF,
            Action::ReturnHome => RETURN_HOME,
            Action::CancelReturn => CANCEL_RETURN,
            Action::Land => LAND,
            Action::CancelLand => CANCEL_LAND,
            Action::ForceLand => FORCE_LAND,
            Action::Stick { .. } => STICK,
            Action::ControlAuthority(_) => CONTROL_AUTHORITY,
            Action::Goto { .. } => GOTO,
            Action::GotoStop => GOTO_STOP,
            Action::Brake(_) => BRAKE,
            Action::RoutePlan(_) => ROUTE_PLAN,
            Action::RouteStart => ROUTE_START,
            Action::RoutePause => ROUTE_PAUSE,
            Action::RouteResume => ROUTE_RESUME,
            Action::RouteStop => ROUTE_STOP,
            Action::Shoot => SHOOT,
            Action::IntervalShoot(_) => INTERVAL_SHOOT,
            Action::VideoStart => VIDEO_START,
            Action::VideoStop => VIDEO_STOP,
            Action::ZoomIn => ZOOM_IN,
            Action::ZoomOut => ZOOM_OUT,
            Action::ZoomReset => ZOOM_RESET,
            Action::ZoomStop => ZOOM_STOP,
            Action::ZoomLevel(_) => ZOOM_LEVEL,
            Action::Focus { .. } => FOCUS,
            Action::Laser(_) => LASER,
            Action::Measure { .. } => MEASURE,
            Action::CameraSwitch(_) => CAMERA_SWITCH,
            Action::VideoSource(_) => VIDEO_SOURCE,
            Action::CameraMode(_) => CAMERA_MODE,
            Action::FormatStorage => FORMAT_STORAGE,
            Action::PhotoStream(_) => PHOTO_STREAM,
            Action::GimbalAbsolute { .. } => GIMBAL_ABSOLUTE,
            Action::GimbalSpeed { .. } => GIMBAL_SPEED,
            Action::GimbalFollow(_) => GIMBAL_FOLLOW,
            Action::GimbalAttitude(_) => GIMBAL_ATTITUDE,
            Action::Obstacle { sensor, .. } => match sensor {
                ObstacleSensor::Horizontal => OBSTACLE_HORIZONTAL,
                ObstacleSensor::Up => OBSTACLE_UP,
                ObstacleSensor::Down => OBSTACLE_DOWN,
            },
            Action::HomePosition { .. } => HOME_POSITION,
            Action::ReturnHeight(_) => RETURN_HEIGHT,
        }
    }

    /// Encode the action parameters.
    pub fn params(&self) -> Bytes {
        let mut dst = BytesMut::new();
        match self {
            Action::Takeoff { height } => dst.put_f32(*height),
            Action::Stick {
                forward,
                right,
                up,
                yaw,
                duration_ms,
            } => {
                dst.put_f32(*forward);
                dst.put_f32(*right);
                dst.put_f32(*up);
                dst.put_f32(*yaw);
                dst.put_u16(*duration_ms);
            }
            Action::Goto {
                longitude,
                latitude,
                altitude,
                speed,
                mode,
            } => {
                dst.put_f64(*longitude);
                dst.put_f64(*latitude);
                dst.put_f32(*altitude);
                dst.put_f32(*speed);
                dst.put_u8(*mode);
            }
            Action::RoutePlan(plan) => return plan.clone(),
            Action::Focus { x, y } | Action::Measure { x, y } => {
                dst.put_f32(*x);
                dst.put_f32(*y);
            }
            Action::GimbalAbsolute { pitch, roll, yaw } => {
                dst.put_f32(*pitch);
                dst.put_f32(*roll);
                dst.put_f32(*yaw);
            }
            Action::GimbalSpeed {
                pitch,
                roll,
                yaw,
                duration_ms,
            } => {
                dst.put_f32(*pitch);
                dst.put_f32(*roll);
                dst.put_f32(*yaw);
                dst.put_u16(*duration_ms);
            }
            Action::HomePosition {
                longitude,
                latitude,
            } => {
                dst.put_f64(*longitude);
                dst.put_f64(*latitude);
            }
            Action::ReturnHeight(height) => dst.put_u16(*height),
            Action::Obstacle { enabled, .. } => dst.put_u8(u8::from(*enabled)),
            Action::ControlAuthority(v)
            | Action::Brake(v)
            | Action::IntervalShoot(v)
            | Action::ZoomLevel(v)
            | Action::Laser(v)
            | Action::CameraSwitch(v)
            | Action::VideoSource(v)
            | Action::CameraMode(v)
            | Action::PhotoStream(v)
            | Action::GimbalFollow(v)
            | Action::GimbalAttitude(v) => dst.put_u8(*v),
            Action::ReturnHome
            | Action::CancelReturn
            | Action::Land
            | Action::CancelLand
            | Action::ForceLand
            | Action::GotoStop
            | Action::RouteStart
            | Action::RoutePause
            | Action::RouteResume
            | Action::RouteStop
            | Action::Shoot
            | Action::VideoStart
            | Action::VideoStop
            | Action::ZoomIn
            | Action::ZoomOut
            | Action::ZoomReset
            | Action::ZoomStop
            | Action::FormatStorage => {}
        }
        dst.freeze()
    }

    /// Build the control frame for this action.
    pub fn to_frame(&self, serial: &DeviceSerial) -> Bytes {
        build_control_with(serial, self.id(), &self.params())
    }
}

/// Human-readable name for an action id.
pub fn action_name(id: u8) -> &'static str {
    match id {
        TAKEOFF => "takeoff",
        RETURN_HOME => "return-home",
        CANCEL_RETURN => "cancel-return",
        LAND => "land",
        CANCEL_LAND => "cancel-land",
        FORCE_LAND => "force-land",
        STICK => "stick",
        CONTROL_AUTHORITY => "control-authority",
        GOTO => "goto",
        GOTO_STOP => "goto-stop",
        BRAKE => "brake",
        ROUTE_PLAN => "route-plan",
        ROUTE_START => "route-start",
        ROUTE_PAUSE => "route-pause",
        ROUTE_RESUME => "route-resume",
        ROUTE_STOP => "route-stop",
        SHOOT => "shoot",
        INTERVAL_SHOOT => "interval-shoot",
        VIDEO_START => "video-start",
        VIDEO_STOP => "video-stop",
        ZOOM_IN => "zoom-in",
        ZOOM_OUT => "zoom-out",
        ZOOM_RESET => "zoom-reset",
        ZOOM_STOP => "zoom-stop",
        ZOOM_LEVEL => "zoom-level",
        FOCUS => "focus",
        LASER => "laser",
        MEASURE => "measure",
        CAMERA_SWITCH => "camera-switch",
        VIDEO_SOURCE => "video-source",
        CAMERA_MODE => "camera-mode",
        FORMAT_STORAGE => "format-storage",
        PHOTO_STREAM => "photo-stream",
        GIMBAL_ABSOLUTE => "gimbal-absolute",
        GIMBAL_SPEED => "gimbal-speed",
        GIMBAL_FOLLOW => "gimbal-follow",
        GIMBAL_ATTITUDE => "gimbal-attitude",
        OBSTACLE_HORIZONTAL => "obstacle-horizontal",
        OBSTACLE_UP => "obstacle-up",
        OBSTACLE_DOWN => "obstacle-down",
        HOME_POSITION => "home-position",
        RETURN_HEIGHT => "return-height",
        _ => "unknown",
    }
}
