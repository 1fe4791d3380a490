//! Centralized error type for the motif umbrella crate.
//!
//! Wraps subsystem errors so `?` propagates naturally across crate
//! boundaries. Core failures raised inside the export crate are lifted back
//! to [`Error::Core`], so a caller matches `NoDevice` or
//! `CaptureAlreadyActive` the same way wherever it came from.

use motif_export::ExportError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] motif_core::Error),

    #[error("Export: {0}")]
    Export(ExportError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn as_core(&self) -> Option<&motif_core::Error> {
        match self {
            Error::Core(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ExportError> for Error {
    fn from(e: ExportError) -> Self {
        match e {
            ExportError::Core(core) => Error::Core(core),
            ExportError::Io(io) => Error::Io(io),
            other => Error::Export(other),
        }
    }
}

impl From<motif_core::DeviceError> for Error {
    fn from(e: motif_core::DeviceError) -> Self {
        Error::Core(e.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_lifted_out_of_export() {
        let lifted: Error = ExportError::Core(motif_core::Error::CaptureAlreadyActive).into();
        assert!(matches!(
            lifted.as_core(),
            Some(motif_core::Error::CaptureAlreadyActive)
        ));

        let export: Error = ExportError::InvalidTempo(0.0).into();
        assert!(matches!(export, Error::Export(ExportError::InvalidTempo(_))));
        assert!(export.as_core().is_none());
    }
}
