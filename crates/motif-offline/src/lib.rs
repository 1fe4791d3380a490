//! # Motif Offline
//!
//! A software [`SignalDevice`](motif_core::SignalDevice) that renders the
//! node graph sample by sample on a clock it advances itself. Used for
//! tests, for the demo, and anywhere a pattern has to be rendered faster
//! than real time.
//!
//! - Sources are band-limited 440 Hz fundsp oscillators of the requested waveform
//! - Units are small fundsp graphs: a state-variable low-pass, bell EQ bands,
//!   and a feed-forward tap delay with no feedback
//! - The reverb stage passes signal through unchanged
//! - Recording sinks capture mono `f32`

mod device;
mod oscillator;
pub mod units;

pub use device::{OfflineDevice, DEFAULT_SAMPLE_RATE};
pub use oscillator::{Oscillator, SOURCE_FREQUENCY_HZ};
