//! Error types for motif-core.

use crate::device::DeviceError;
use thiserror::Error;

/// Error type for motif-core operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown scale root: {0:?}")]
    UnknownScale(String),

    #[error("Invalid schedule time for event {event_index}: start={start}, stop={stop}")]
    InvalidScheduleTime {
        event_index: usize,
        start: f64,
        stop: f64,
    },

    #[error("No signal device attached")]
    NoDevice,

    #[error("A capture is already in progress")]
    CaptureAlreadyActive,

    #[error("Capture was cancelled before its window elapsed")]
    CaptureCancelled,

    #[error("Effects chain already built for this session")]
    ChainAlreadyBuilt,

    #[error("Invalid parameter '{name}': {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("Invalid note offset: {0}. Must be finite and non-negative")]
    InvalidOffset(f64),

    #[error("Device: {0}")]
    Device(#[from] DeviceError),
}

impl Error {
    /// Whether this error only affects a single voice of a pass.
    pub fn is_voice_local(&self) -> bool {
        matches!(self, Error::InvalidScheduleTime { .. } | Error::Device(_))
    }
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
