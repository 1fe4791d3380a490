//! Band-limited fundsp oscillators for the four waveforms.

use fundsp::hacker::{saw_hz, sine_hz, square_hz, triangle_hz, AudioUnit};
use motif_core::Waveform;
use std::fmt;

/// Pitch every source plays at.
pub const SOURCE_FREQUENCY_HZ: f32 = 440.0;

pub struct Oscillator {
    waveform: Waveform,
    unit: Box<dyn AudioUnit>,
}

impl fmt::Debug for Oscillator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Oscillator")
            .field("waveform", &self.waveform)
            .finish()
    }
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency: f32, sample_rate: u32) -> Self {
        let mut unit: Box<dyn AudioUnit> = match waveform {
            Waveform::Sine => Box::new(sine_hz(frequency)),
            Waveform::Square => Box::new(square_hz(frequency)),
            Waveform::Sawtooth => Box::new(saw_hz(frequency)),
            Waveform::Triangle => Box::new(triangle_hz(frequency)),
        };
        unit.set_sample_rate(sample_rate as f64);
        unit.reset();
        Self { waveform, unit }
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn next_sample(&mut self) -> f64 {
        self.unit.get_mono() as f64
    }
}
