//! # Motif - Generative Step Sequencer
//!
//! Random melodic patterns on a half-beat grid, played through a fixed
//! effects chain and exported as audio or notes.
//!
//! ## Architecture
//!
//! Motif is an umbrella crate that coordinates:
//! - **motif-core** - Pattern generation, effects chain, device contract, voice scheduling
//! - **motif-export** - Rendered-audio capture (WAV) and symbolic export (MIDI)
//! - **motif-offline** - Deterministic software device for rendering without hardware
//!
//! ## Quick Start
//!
//! ```ignore
//! use motif::prelude::*;
//!
//! let mut session = SequencerSession::builder()
//!     .bpm(120)
//!     .scale("C")
//!     .duration_bars(4)
//!     .device(OfflineDevice::default())
//!     .build()?;
//!
//! let pattern = session.generate()?;
//! session.play(&pattern)?;
//! session.set_filter_cutoff(2_000.0)?;
//!
//! let notes = session.export_symbolic(&pattern)?;
//! notes.write_to_dir(".")?;
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - Everything enabled (`full`)
//! - `wav` - Rendered-audio capture
//! - `midi` - Symbolic note files
//! - `offline` - The offline reference device

/// Re-export of motif-core for direct access
pub use motif_core as core;

pub use motif_core::{
    timing, CapturedAudio, ChainLevels, DeviceError, EffectsChain, NodeId, NoteEvent, PassId,
    Pattern, PatternGenerator, PlaybackScheduler, ProcessingUnit, RejectedVoice, Scale,
    ScaleTable, ScheduleReport, SequencerConfig, SignalDevice, UnitParam, VoiceHandle, Waveform,
};

/// Export subsystem
pub use motif_export as export;

pub use motif_export::{Artifact, ExportError, FixedPitch, PitchMapper, ScaleWalk};

#[cfg(feature = "wav")]
pub use motif_export::{BitDepth, CaptureHandle};

#[cfg(feature = "midi")]
pub use motif_export::{NoteTrack, SymbolicNote};

// Offline device
#[cfg(feature = "offline")]
pub use motif_offline as offline;

#[cfg(feature = "offline")]
pub use motif_offline::OfflineDevice;

mod error;
pub use error::{Error, Result};

mod builder;
mod session;

pub use builder::SessionBuilder;
pub use session::{PumpReport, SequencerSession};

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{Error, Result, SequencerSession, SessionBuilder};

    pub use crate::core::{Pattern, SequencerConfig, SignalDevice, Waveform};

    pub use crate::export::{Artifact, FixedPitch, PitchMapper, ScaleWalk};

    #[cfg(feature = "offline")]
    pub use crate::OfflineDevice;
}
