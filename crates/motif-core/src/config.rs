//! Sequencer configuration pushed in by the parameter surface.

use crate::error::{Error, Result};
use crate::scale::ScaleTable;
use crate::timing;
use serde::{Deserialize, Serialize};

/// Tempo, scale and length for pattern generation.
///
/// Fields are signed and unvalidated on purpose: the parameter surface may
/// hand over anything, and out-of-range tempos are contained where they
/// would turn into clock times (see [`crate::timing::voice_timing`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Tempo in beats per minute.
    pub bpm: i32,
    /// Key into the [`ScaleTable`].
    pub scale_root: String,
    /// Pattern length in bars.
    pub duration_bars: i32,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            bpm: 120,
            scale_root: "C".to_string(),
            duration_bars: 4,
        }
    }
}

impl SequencerConfig {
    pub fn new(bpm: i32, scale_root: impl Into<String>, duration_bars: i32) -> Self {
        Self {
            bpm,
            scale_root: scale_root.into(),
            duration_bars,
        }
    }

    pub fn with_bpm(mut self, bpm: i32) -> Self {
        self.bpm = bpm;
        self
    }

    pub fn with_scale(mut self, scale_root: impl Into<String>) -> Self {
        self.scale_root = scale_root.into();
        self
    }

    pub fn with_duration_bars(mut self, bars: i32) -> Self {
        self.duration_bars = bars;
        self
    }

    /// Note length at this tempo, in seconds.
    pub fn note_duration(&self) -> f64 {
        timing::note_duration(self.bpm as f64)
    }

    /// Number of notes a generated pattern will hold.
    pub fn total_notes(&self) -> usize {
        timing::total_notes(self.duration_bars, self.bpm)
    }

    /// Nominal capture window in milliseconds.
    pub fn recording_window_ms(&self) -> f64 {
        timing::recording_window_ms(self.duration_bars, self.bpm as f64)
    }

    /// Check the documented ranges: `bpm > 0`, `duration_bars > 0`, known root.
    ///
    /// Nothing in the engine requires this to pass; it is offered to callers
    /// that want to reject input early.
    pub fn validate(&self) -> Result<()> {
        ScaleTable::lookup(&self.scale_root)?;
        if self.bpm <= 0 {
            return Err(Error::InvalidParameter {
                name: "bpm",
                value: self.bpm as f64,
            });
        }
        if self.duration_bars <= 0 {
            return Err(Error::InvalidParameter {
                name: "duration_bars",
                value: self.duration_bars as f64,
            });
        }
        Ok(())
    }
}
