//! Test helpers and fixtures for Motif integration tests
//!
//! Sessions run on the offline device, so every test drives the clock by
//! hand and renders the same samples on every run.
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): Exact operations (passthrough, unity gain)
//! - `SILENCE_THRESHOLD` (0.0001): Silence detection (-80dB)
//! - `INT16_EPSILON`: One step of a 16-bit capture

#![allow(dead_code)]

pub mod tolerances;

use motif::prelude::*;

/// Sample rate of every test device
pub const TEST_SAMPLE_RATE: u32 = 48_000;

/// Clock step used when pumping a session
pub const PUMP_STEP_SECONDS: f64 = 0.05;

/// A seeded session with the default configuration and an offline device.
pub fn test_session() -> SequencerSession<OfflineDevice> {
    test_session_with(SequencerConfig::default())
}

pub fn test_session_with(config: SequencerConfig) -> SequencerSession<OfflineDevice> {
    SequencerSession::builder()
        .config(config)
        .seed(0x5EED)
        .device(OfflineDevice::new(TEST_SAMPLE_RATE))
        .build()
        .expect("Failed to create test session")
}

/// Advance the device clock by `seconds`, pumping after every step.
///
/// Returns how many pumps reported a finished capture.
pub fn run_for(session: &mut SequencerSession<OfflineDevice>, seconds: f64) -> usize {
    let steps = (seconds / PUMP_STEP_SECONDS).round() as usize;
    let mut finished = 0;
    for _ in 0..steps {
        session
            .device_mut()
            .expect("session has a device")
            .advance(PUMP_STEP_SECONDS);
        if session.pump().capture_finished {
            finished += 1;
        }
    }
    finished
}

/// Everything the destination received so far.
pub fn take_output(session: &mut SequencerSession<OfflineDevice>) -> Vec<f32> {
    session
        .device_mut()
        .expect("session has a device")
        .take_output()
}

/// Calculate RMS of a signal.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Calculate peak amplitude of a signal.
pub fn peak(samples: &[f32]) -> f32 {
    samples
        .iter()
        .map(|s| s.abs())
        .fold(0.0_f32, |a, b| a.max(b))
}

/// Assert that a signal is approximately silent (all values near zero).
pub fn assert_silence(samples: &[f32], tolerance: f32) {
    let max = peak(samples);
    assert!(
        max <= tolerance,
        "Expected silence, but peak amplitude was {}",
        max
    );
}

/// Assert that a signal has content (not silent).
pub fn assert_has_audio(samples: &[f32], min_rms: f32) {
    let r = rms(samples);
    assert!(
        r >= min_rms,
        "Expected audio content with RMS >= {}, but RMS was {}",
        min_rms,
        r
    );
}

/// Decode a WAV artifact with hound into normalized samples.
pub fn decode_wav(bytes: &[u8]) -> (hound::WavSpec, Vec<f32>) {
    let reader = hound::WavReader::new(std::io::Cursor::new(bytes)).expect("valid WAV");
    let spec = reader.spec();
    let samples = reader
        .into_samples::<i16>()
        .map(|s| s.expect("readable sample") as f32 / 32767.0)
        .collect();
    (spec, samples)
}
