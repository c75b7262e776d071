/// Errors that can occur while building frames.
///
/// Encoding itself never fails; only typed inputs validate.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A device serial must be exactly 15 ASCII bytes.
    #[error("invalid device serial {serial:?}: expected 15 ASCII bytes, got {len}")]
    InvalidSerial { serial: String, len: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
