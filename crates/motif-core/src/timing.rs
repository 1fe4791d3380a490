//! Tempo arithmetic shared by the generator, the scheduler and both exporters.
//!
//! Every path that places a note in time goes through these functions, so
//! what is exported is exactly what is played.

use crate::error::{Error, Result};

/// Seconds per minute divided by the half-beat subdivision.
///
/// One beat is `60 / bpm` seconds; notes sit on a half-beat grid, so a note
/// lasts `30 / bpm` seconds and a bar of four beats holds eight of them.
pub const HALF_BEAT_NUMERATOR: f64 = 30.0;

/// Length of one note on the half-beat grid.
///
/// Not validated: `bpm <= 0` yields an infinite or negative duration, which
/// [`voice_timing`] rejects at the scheduling boundary.
#[inline]
pub fn note_duration(bpm: f64) -> f64 {
    HALF_BEAT_NUMERATOR / bpm
}

/// `floor(duration_bars * bpm / 30)`.
///
/// Zero unless both factors are positive; two negative factors would give a
/// positive count of notes at negative offsets.
pub fn total_notes(duration_bars: i32, bpm: i32) -> usize {
    if duration_bars <= 0 || bpm <= 0 {
        return 0;
    }
    let product = duration_bars as i64 * bpm as i64;
    (product / HALF_BEAT_NUMERATOR as i64) as usize
}

/// Nominal capture length: `duration_bars * 60000 / bpm` milliseconds.
///
/// This is the configured duration, not `total_notes * note_duration`; the
/// two differ by a fraction of a note when `duration_bars * bpm` is not a
/// multiple of 30.
#[inline]
pub fn recording_window_ms(duration_bars: i32, bpm: f64) -> f64 {
    duration_bars as f64 * 60_000.0 / bpm
}

/// Absolute start/stop of one voice on the device clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceTiming {
    start: f64,
    duration: f64,
}

impl VoiceTiming {
    #[inline]
    pub fn start(&self) -> f64 {
        self.start
    }

    #[inline]
    pub fn stop(&self) -> f64 {
        self.start + self.duration
    }

    /// Exactly the note duration the timing was computed with.
    #[inline]
    pub fn duration(&self) -> f64 {
        self.duration
    }
}

/// Place an event on the device clock.
///
/// `start = clock_now + offset`, `stop = start + note_duration`. Both must be
/// finite, `start` non-negative and `stop >= start`; otherwise the voice is
/// rejected with [`Error::InvalidScheduleTime`].
pub fn voice_timing(
    event_index: usize,
    clock_now: f64,
    offset_seconds: f64,
    note_duration: f64,
) -> Result<VoiceTiming> {
    let start = clock_now + offset_seconds;
    let stop = start + note_duration;

    let valid = start.is_finite() && stop.is_finite() && start >= 0.0 && stop >= start;
    if !valid {
        return Err(Error::InvalidScheduleTime {
            event_index,
            start,
            stop,
        });
    }

    Ok(VoiceTiming {
        start,
        duration: note_duration,
    })
}
