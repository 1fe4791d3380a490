//! Error types for motif-export

use std::io;
use thiserror::Error;

/// Export error type
#[derive(Error, Debug)]
pub enum ExportError {
    /// Failure reported by the engine core (capture slot, device, pattern)
    #[error(transparent)]
    Core(#[from] motif_core::Error),

    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Audio encoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// MIDI file encoding or parsing error
    #[error("MIDI file error: {0}")]
    Midi(String),

    /// Tempo that cannot be expressed in a note file
    #[error("Invalid tempo: {0} bpm")]
    InvalidTempo(f64),

    /// Capture window that is not a finite positive length
    #[error("Invalid capture window: {0} ms")]
    InvalidWindow(f64),

    /// Invalid audio data
    #[error("Invalid audio data: {0}")]
    InvalidData(String),
}

impl ExportError {
    /// The core error inside, if any.
    pub fn as_core(&self) -> Option<&motif_core::Error> {
        match self {
            ExportError::Core(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type for export operations
pub type Result<T> = std::result::Result<T, ExportError>;

impl From<motif_core::DeviceError> for ExportError {
    fn from(e: motif_core::DeviceError) -> Self {
        ExportError::Core(e.into())
    }
}

#[cfg(feature = "wav")]
impl From<hound::Error> for ExportError {
    fn from(e: hound::Error) -> Self {
        match e {
            hound::Error::IoError(io) => ExportError::Io(io),
            other => ExportError::Encoding(other.to_string()),
        }
    }
}

#[cfg(feature = "midi")]
impl From<midly::Error> for ExportError {
    fn from(e: midly::Error) -> Self {
        ExportError::Midi(e.to_string())
    }
}
