//! Pitch assignment for symbolic export.
//!
//! Patterns carry timbre and timing but no pitch. A [`PitchMapper`] decides
//! which MIDI key each event is written as.

use motif_core::{NoteEvent, Pattern, ScaleTable};

/// Chooses the MIDI key for an event of a pattern.
pub trait PitchMapper: Send + Sync {
    fn pitch(&self, index: usize, event: &NoteEvent, pattern: &Pattern) -> u8;
}

/// Every event on the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPitch(pub u8);

impl FixedPitch {
    pub const MIDDLE_C: FixedPitch = FixedPitch(60);
}

impl Default for FixedPitch {
    fn default() -> Self {
        Self::MIDDLE_C
    }
}

impl PitchMapper for FixedPitch {
    fn pitch(&self, _index: usize, _event: &NoteEvent, _pattern: &Pattern) -> u8 {
        self.0.min(127)
    }
}

/// Walks up the pattern's scale, one degree per event, wrapping every
/// seven events.
///
/// Patterns whose root is not in the scale table fall back to middle C.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleWalk {
    octave: i8,
}

impl ScaleWalk {
    pub const MIN_OCTAVE: i8 = -1;
    /// Highest octave in which every degree of every scale fits in 0..=127.
    pub const MAX_OCTAVE: i8 = 7;

    /// `octave` places the scale root (C4 = 60) and is clamped to
    /// `MIN_OCTAVE..=MAX_OCTAVE`.
    pub fn new(octave: i8) -> Self {
        Self {
            octave: octave.clamp(Self::MIN_OCTAVE, Self::MAX_OCTAVE),
        }
    }

    pub fn octave(&self) -> i8 {
        self.octave
    }
}

impl Default for ScaleWalk {
    fn default() -> Self {
        Self::new(4)
    }
}

impl PitchMapper for ScaleWalk {
    fn pitch(&self, index: usize, _event: &NoteEvent, pattern: &Pattern) -> u8 {
        ScaleTable::get(pattern.scale_root())
            .and_then(|scale| scale.midi_note(index, self.octave))
            .unwrap_or(FixedPitch::MIDDLE_C.0)
    }
}
