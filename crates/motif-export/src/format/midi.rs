//! Standard MIDI File encoding and decoding using midly
//!
//! Patterns are written as a single-track (format 0) file at
//! [`TICKS_PER_BEAT`] with one tempo event, so note times in seconds map to
//! ticks through the written tempo alone. Tempos too slow or too fast for a
//! 24-bit tempo event are clamped; note times stay exact in seconds.

use crate::artifact::Artifact;
use crate::error::{ExportError, Result};
use crate::pitch::PitchMapper;
use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use motif_core::{timing, Pattern};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Resolution of exported files.
pub const TICKS_PER_BEAT: u16 = 480;

/// Velocity every exported note is written with.
pub const DEFAULT_VELOCITY: u8 = 127;

/// Name written into the track.
pub const TRACK_NAME: &str = "sequence";

const MAX_DELTA: u64 = (1 << 28) - 1;
const MAX_TEMPO_MICROS: u32 = (1 << 24) - 1;

/// A note with times in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymbolicNote {
    /// MIDI key (0-127)
    pub pitch: u8,
    /// Onset, seconds from the start of the track
    pub time: f64,
    /// Length in seconds
    pub duration: f64,
    /// Velocity (1-127)
    pub velocity: u8,
}

/// One track of notes at a single tempo.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteTrack {
    pub name: String,
    pub bpm: f64,
    pub notes: Vec<SymbolicNote>,
}

impl NoteTrack {
    /// One note per event: `time` is the event offset, `duration` is the
    /// note length at `bpm`, pitch comes from `mapper`.
    pub fn from_pattern(pattern: &Pattern, bpm: f64, mapper: &dyn PitchMapper) -> Result<Self> {
        tempo_micros(bpm)?;
        let duration = timing::note_duration(bpm);

        let notes = pattern
            .iter()
            .enumerate()
            .map(|(i, event)| SymbolicNote {
                pitch: mapper.pitch(i, event, pattern).min(127),
                time: event.offset_seconds(),
                duration,
                velocity: DEFAULT_VELOCITY,
            })
            .collect();

        Ok(Self {
            name: TRACK_NAME.to_string(),
            bpm,
            notes,
        })
    }

    /// Encode as a format 0 Standard MIDI File.
    ///
    /// Output depends only on the track, so equal tracks give identical
    /// bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let micros = tempo_micros(self.bpm)?;

        // (tick, note-off first, sequence, message)
        let mut timeline: Vec<(u64, u8, usize, MidiMessage)> =
            Vec::with_capacity(self.notes.len() * 2);
        for (seq, note) in self.notes.iter().enumerate() {
            let key = u7::new(note.pitch.min(127));
            let vel = u7::new(note.velocity.clamp(1, 127));
            let on = seconds_to_ticks(note.time, micros);
            let off = seconds_to_ticks(note.time + note.duration.max(0.0), micros).max(on);
            timeline.push((on, 1, seq, MidiMessage::NoteOn { key, vel }));
            timeline.push((off, 0, seq, MidiMessage::NoteOff { key, vel: u7::new(0) }));
        }
        timeline.sort_by_key(|(tick, order, seq, _)| (*tick, *order, *seq));

        let mut track = Vec::with_capacity(timeline.len() + 3);
        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::TrackName(self.name.as_bytes())),
        });
        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(micros))),
        });

        let mut last_tick = 0u64;
        for (tick, _, _, message) in timeline {
            let delta = tick - last_tick;
            if delta > MAX_DELTA {
                return Err(ExportError::Midi(format!(
                    "gap of {delta} ticks does not fit a delta time"
                )));
            }
            track.push(TrackEvent {
                delta: u28::new(delta as u32),
                kind: TrackEventKind::Midi {
                    channel: u4::new(0),
                    message,
                },
            });
            last_tick = tick;
        }

        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        });

        let mut smf = Smf::new(Header::new(
            Format::SingleTrack,
            Timing::Metrical(u15::new(TICKS_PER_BEAT)),
        ));
        smf.tracks.push(track);

        let mut bytes = Vec::new();
        smf.write_std(&mut bytes)?;
        Ok(bytes)
    }

    /// Decode a Standard MIDI File.
    ///
    /// Notes are paired first-in first-out per key across all tracks and
    /// returned in onset order. Tempo comes from the first tempo event
    /// (120 bpm if there is none); later tempo changes are ignored.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let smf = Smf::parse(bytes)?;
        let ticks_per_beat = match smf.header.timing {
            Timing::Metrical(tpb) => tpb.as_int(),
            Timing::Timecode(_, _) => {
                return Err(ExportError::Midi("timecode timing is not supported".into()));
            }
        };

        let mut name = String::new();
        let mut micros: Option<u32> = None;
        // (on tick, off tick, key, velocity)
        let mut spans: Vec<(u64, u64, u8, u8)> = Vec::new();

        for track in &smf.tracks {
            let mut tick = 0u64;
            let mut open: HashMap<u8, VecDeque<(u64, u8)>> = HashMap::new();

            for event in track {
                tick += event.delta.as_int() as u64;
                match event.kind {
                    TrackEventKind::Meta(MetaMessage::TrackName(raw)) if name.is_empty() => {
                        name = String::from_utf8_lossy(raw).into_owned();
                    }
                    TrackEventKind::Meta(MetaMessage::Tempo(t)) if micros.is_none() => {
                        micros = Some(t.as_int());
                    }
                    TrackEventKind::Midi { message, .. } => match message {
                        MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                            open.entry(key.as_int())
                                .or_default()
                                .push_back((tick, vel.as_int()));
                        }
                        MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                            let started = open.get_mut(&key.as_int()).and_then(VecDeque::pop_front);
                            if let Some((on, velocity)) = started {
                                spans.push((on, tick, key.as_int(), velocity));
                            }
                        }
                        _ => {}
                    },
                    _ => {}
                }
            }
        }

        let bpm = match micros {
            Some(m) if m > 0 => 60_000_000.0 / m as f64,
            _ => 120.0,
        };
        spans.sort_by_key(|(on, _, _, _)| *on);

        let seconds_per_tick = 60.0 / bpm / ticks_per_beat as f64;
        let notes: Vec<SymbolicNote> = spans
            .into_iter()
            .map(|(on, off, pitch, velocity)| SymbolicNote {
                pitch,
                time: on as f64 * seconds_per_tick,
                duration: (off - on) as f64 * seconds_per_tick,
                velocity,
            })
            .collect();

        debug!(notes = notes.len(), bpm, "parsed note track");
        Ok(Self { name, bpm, notes })
    }
}

/// Ticks at a tempo of `micros` per quarter note:
/// `round(seconds * 1e6 / micros * TICKS_PER_BEAT)`
pub fn seconds_to_ticks(seconds: f64, micros: u32) -> u64 {
    let beats = seconds * 1_000_000.0 / micros.max(1) as f64;
    (beats * TICKS_PER_BEAT as f64).round() as u64
}

/// Microseconds per quarter note written for `bpm`.
///
/// Clamped into what a tempo event holds (1..=2^24-1), so every positive
/// bpm has a tempo. Below about 3.58 bpm the file tempo is faster than
/// `bpm`, which only changes the tick grid.
pub fn tempo_micros(bpm: f64) -> Result<u32> {
    let duration = timing::note_duration(bpm);
    if !bpm.is_finite() || !duration.is_finite() || duration <= 0.0 {
        return Err(ExportError::InvalidTempo(bpm));
    }
    let micros = (60_000_000.0 / bpm)
        .round()
        .clamp(1.0, MAX_TEMPO_MICROS as f64);
    Ok(micros as u32)
}

/// Export a pattern as `sequence.mid`.
///
/// Notes take their duration from `bpm` (the tempo at export time), which
/// need not match the tempo the pattern was generated at. No device or
/// clock is involved.
pub fn export_notes(pattern: &Pattern, bpm: f64, mapper: &dyn PitchMapper) -> Result<Artifact> {
    let track = NoteTrack::from_pattern(pattern, bpm, mapper)?;
    let bytes = track.encode()?;
    tracing::info!(
        notes = track.notes.len(),
        bpm,
        bytes = bytes.len(),
        "symbolic export complete"
    );
    Ok(Artifact::midi(bytes))
}
