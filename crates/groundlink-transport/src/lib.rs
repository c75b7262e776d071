//! Stream transport for the vehicle link.
//!
//! Owns the socket and nothing else: blocking send/receive of raw byte
//! ranges, (re)connect to an [`Endpoint`], and a `close` that unblocks a
//! pending receive from another thread. Framing lives one layer up in
//! `groundlink-frame`.

pub mod error;
pub mod tcp;
pub mod traits;

pub use error::{Result, TransportError};
pub use tcp::TcpTransport;
pub use traits::{Endpoint, LinkTransport};
