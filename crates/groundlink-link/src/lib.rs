//! Threaded link to one vehicle.
//!
//! [`Link`] owns a connected transport and runs the send, receive,
//! assemble and decode stages on dedicated threads joined by blocking
//! queues. Decoded replies reach a caller-supplied callback; use
//! [`dispatcher`] to receive them as typed [`LinkEvent`]s instead.

pub mod assemble;
pub mod config;
pub mod decode;
pub mod dispatch;
pub mod error;
pub mod heartbeat;
pub mod link;
pub mod queue;
pub mod receiver;
pub mod sender;
pub mod worker;

#[cfg(test)]
mod testing;

pub use config::{LinkConfig, ServerConfig};
pub use decode::ReplyHandler;
pub use dispatch::{dispatcher, ControlAck, LinkEvent, CONTROL_ACK_LEN};
pub use error::{LinkError, Result};
pub use link::{Link, OutboundSender};
pub use queue::FrameQueue;
pub use receiver::Inbound;
pub use worker::{RunFlag, Worker, WorkerHandle};
