//! Pattern generation.

use crate::config::SequencerConfig;
use crate::error::Result;
use crate::note::{NoteEvent, Pattern, Waveform};
use crate::scale::ScaleTable;
use crate::timing;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces a fresh [`Pattern`] on the half-beat grid for each call.
///
/// Only the waveform of each note is random. Offsets are fully determined
/// by the config, so two patterns from the same config differ in timbre but
/// never in timing.
#[derive(Debug, Clone)]
pub struct PatternGenerator<R: Rng = StdRng> {
    rng: R,
}

impl PatternGenerator<StdRng> {
    /// Generator seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible generator.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for PatternGenerator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> PatternGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Generate a pattern for `config`.
    ///
    /// Fails only on an unknown scale root. A config that yields no notes
    /// (`duration_bars * bpm < 30`, or a non-positive factor) produces an
    /// empty pattern.
    pub fn generate(&mut self, config: &SequencerConfig) -> Result<Pattern> {
        let scale = ScaleTable::lookup(&config.scale_root)?;

        let total = config.total_notes();
        if total == 0 {
            tracing::warn!(
                bpm = config.bpm,
                duration_bars = config.duration_bars,
                "configuration yields no notes"
            );
            return Ok(Pattern::empty(scale.root(), config.bpm));
        }

        let note_duration = timing::note_duration(config.bpm as f64);
        let mut events = Vec::with_capacity(total);
        for i in 0..total {
            let waveform = Waveform::ALL[self.rng.gen_range(0..Waveform::ALL.len())];
            events.push(NoteEvent::new(i as f64 * note_duration, waveform)?);
        }

        tracing::debug!(
            notes = events.len(),
            scale = scale.root(),
            bpm = config.bpm,
            "pattern generated"
        );
        Ok(Pattern::from_events(scale.root(), config.bpm, events))
    }
}
