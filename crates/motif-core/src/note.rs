//! Note events and patterns.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Oscillator shape a note event is voiced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    /// All waveforms, in the order the generator draws from.
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Sawtooth,
        Waveform::Triangle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Triangle => "triangle",
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Waveform {
    type Err = String;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        Waveform::ALL
            .into_iter()
            .find(|w| w.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown waveform: {s}"))
    }
}

/// One sound onset, relative to the start of its pattern.
///
/// Deserialization goes through [`NoteEvent::new`], so a stored event is
/// held to the same offset rules as a constructed one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NoteEventFields")]
pub struct NoteEvent {
    offset_seconds: f64,
    waveform: Waveform,
}

#[derive(Deserialize)]
struct NoteEventFields {
    offset_seconds: f64,
    waveform: Waveform,
}

impl TryFrom<NoteEventFields> for NoteEvent {
    type Error = Error;

    fn try_from(fields: NoteEventFields) -> Result<Self> {
        NoteEvent::new(fields.offset_seconds, fields.waveform)
    }
}

impl NoteEvent {
    /// Create a note event. The offset must be finite and non-negative.
    pub fn new(offset_seconds: f64, waveform: Waveform) -> Result<Self> {
        if !offset_seconds.is_finite() || offset_seconds < 0.0 {
            return Err(Error::InvalidOffset(offset_seconds));
        }
        Ok(Self {
            offset_seconds,
            waveform,
        })
    }

    #[inline]
    pub fn offset_seconds(&self) -> f64 {
        self.offset_seconds
    }

    #[inline]
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }
}

/// An immutable, cheaply clonable sequence of note events.
///
/// Insertion order is temporal order. Clones share the same event storage,
/// so a pattern handed to playback or export stays valid after the session
/// generates a replacement.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    events: Arc<[NoteEvent]>,
    scale_root: Arc<str>,
    bpm: i32,
}

impl Pattern {
    /// Build a pattern from events in the given order.
    ///
    /// `scale_root` and `bpm` describe what the events were written against;
    /// they are informational and never re-time the events.
    pub fn from_events(
        scale_root: impl Into<Arc<str>>,
        bpm: i32,
        events: impl Into<Arc<[NoteEvent]>>,
    ) -> Self {
        Self {
            events: events.into(),
            scale_root: scale_root.into(),
            bpm,
        }
    }

    pub fn empty(scale_root: impl Into<Arc<str>>, bpm: i32) -> Self {
        Self::from_events(scale_root, bpm, Vec::<NoteEvent>::new())
    }

    pub fn events(&self) -> &[NoteEvent] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NoteEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn scale_root(&self) -> &str {
        &self.scale_root
    }

    /// Tempo the pattern was generated under.
    pub fn bpm(&self) -> i32 {
        self.bpm
    }

    /// Offset of the last onset, or 0 for an empty pattern.
    pub fn last_offset(&self) -> f64 {
        self.events
            .iter()
            .map(NoteEvent::offset_seconds)
            .fold(0.0, f64::max)
    }

    /// Whether offsets never decrease in insertion order.
    pub fn is_time_ordered(&self) -> bool {
        self.events
            .windows(2)
            .all(|w| w[0].offset_seconds <= w[1].offset_seconds)
    }

    /// Whether two patterns share the same event storage.
    pub fn shares_events_with(&self, other: &Pattern) -> bool {
        Arc::ptr_eq(&self.events, &other.events)
    }
}

impl<'a> IntoIterator for &'a Pattern {
    type Item = &'a NoteEvent;
    type IntoIter = std::slice::Iter<'a, NoteEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
