//! Pattern generation and clock-accurate scheduling for the Motif sequencer.
//!
//! # Primary API
//!
//! - [`PatternGenerator`]: turns a [`SequencerConfig`] into a [`Pattern`]
//! - [`EffectsChain`]: the fixed processing chain voices play through
//! - [`PlaybackScheduler`]: issues pattern voices against a [`SignalDevice`]
//! - [`timing`]: tempo arithmetic shared with the exporters
//!
//! The crate renders nothing itself. Everything audible happens in a
//! [`SignalDevice`] implementation supplied by the caller.
//!
//! # Example
//!
//! ```ignore
//! use motif_core::*;
//!
//! let config = SequencerConfig::new(120, "G", 4);
//! let pattern = PatternGenerator::seeded(7).generate(&config)?;
//!
//! let chain = EffectsChain::build(&mut device)?;
//! let mut scheduler = PlaybackScheduler::new();
//! let report = scheduler.schedule(&pattern, &chain, &mut device, config.bpm as f64);
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod config;
pub use config::SequencerConfig;

pub mod device;
pub use device::{
    CapturedAudio, DeviceError, DeviceResult, NodeId, ProcessingUnit, SignalDevice, UnitParam,
};

pub mod effects;
pub use effects::{ChainLevels, EffectsChain, EQ_BANDS, EQ_CENTER_FREQUENCIES, MAX_DELAY_SECONDS};

mod generator;
pub use generator::PatternGenerator;

mod note;
pub use note::{NoteEvent, Pattern, Waveform};

pub mod scale;
pub use scale::{Scale, ScaleTable};

mod scheduler;
pub use scheduler::{PlaybackScheduler, RejectedVoice, ScheduleReport};

pub mod timing;

mod voice;
pub use voice::{PassId, ScheduledVoice, VoiceArena, VoiceHandle};

#[cfg(test)]
pub(crate) mod testing;
