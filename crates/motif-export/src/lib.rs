//! # Motif Export
//!
//! Turns a pattern into files:
//! - **Rendered audio**: [`AudioCapture`] records one playback through the
//!   device and encodes it as `sequence.wav`
//! - **Symbolic notes**: [`export_notes`] writes `sequence.mid` straight from
//!   the pattern, no device needed
//!
//! Both produce an [`Artifact`] that can be handed to the caller or written
//! with [`Artifact::write_to_dir`].
//!
//! ```ignore
//! use motif_export::*;
//!
//! let mut capture = AudioCapture::new();
//! let mut handle = capture.start(&pattern, &chain, &mut scheduler, &mut device, 4, 120.0)?;
//! // ... drive the device clock ...
//! capture.poll(&mut device);
//! if let Some(Ok(wav)) = handle.take_result() {
//!     wav.write_to_dir(".")?;
//! }
//!
//! let midi = export_notes(&pattern, 120.0, &ScaleWalk::default())?;
//! ```
//!
//! ## Feature Flags
//!
//! - `wav` (default): capture encoding via hound (pure Rust)
//! - `midi` (default): note file writing via midly

pub mod error;
pub use error::{ExportError, Result};

pub mod artifact;
pub use artifact::{Artifact, MIDI_FILE_NAME, MIDI_MIME_TYPE, WAV_FILE_NAME, WAV_MIME_TYPE};

pub mod format;

pub mod pitch;
pub use pitch::{FixedPitch, PitchMapper, ScaleWalk};

#[cfg(feature = "wav")]
pub mod capture;
#[cfg(feature = "wav")]
pub use capture::{AudioCapture, CaptureHandle};
#[cfg(feature = "wav")]
pub use format::wav::BitDepth;

#[cfg(feature = "midi")]
pub use format::midi::{export_notes, NoteTrack, SymbolicNote};
