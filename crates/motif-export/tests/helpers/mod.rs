//! Fixtures shared by the export integration tests.

#![allow(dead_code)]

use motif_core::{
    EffectsChain, NoteEvent, Pattern, PatternGenerator, PlaybackScheduler, SequencerConfig,
    Waveform,
};
use motif_offline::OfflineDevice;

pub const TEST_SAMPLE_RATE: u32 = 48_000;

/// An offline device with the effects chain already built.
pub struct Rig {
    pub device: OfflineDevice,
    pub chain: EffectsChain,
    pub scheduler: PlaybackScheduler,
}

pub fn rig() -> Rig {
    let mut device = OfflineDevice::new(TEST_SAMPLE_RATE);
    let chain = EffectsChain::build(&mut device).expect("chain builds on a fresh device");
    Rig {
        device,
        chain,
        scheduler: PlaybackScheduler::new(),
    }
}

/// A reproducible pattern for `config`.
pub fn generated(config: &SequencerConfig, seed: u64) -> Pattern {
    PatternGenerator::seeded(seed)
        .generate(config)
        .expect("generation succeeds for a known scale")
}

/// `count` square notes on the half-beat grid at 120 bpm.
pub fn square_run(count: usize) -> Pattern {
    let events: Vec<NoteEvent> = (0..count)
        .map(|i| NoteEvent::new(i as f64 * 0.25, Waveform::Square).expect("finite offset"))
        .collect();
    Pattern::from_events("C", 120, events)
}

pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
}
