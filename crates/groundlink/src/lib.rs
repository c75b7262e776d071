//! Ground-station link to a remote vehicle.
//!
//! groundlink turns operator intents into the vehicle's binary control
//! protocol, carries them over TCP with automatic reconnection, and turns
//! inbound bytes back into typed events.
//!
//! # Crate Structure
//!
//! - [`transport`]: stream transport abstraction and the TCP client
//! - [`frame`]: outbound frame encoding, typed actions, inbound reassembly
//!   and the reply decoder
//! - [`link`]: the threaded send/receive/assemble/decode pipeline (behind
//!   the `link` feature)

/// Re-export transport types.
pub mod transport {
    pub use groundlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use groundlink_frame::*;
}

/// Re-export link types (requires `link` feature).
#[cfg(feature = "link")]
pub mod link {
    pub use groundlink_link::*;
}
