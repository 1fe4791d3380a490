//! Signal device contract.
//!
//! The engine never renders audio itself. It drives a [`SignalDevice`]:
//! something that can create oscillator sources and processing units, wire
//! them into a directed graph, start and stop sources at absolute times on
//! its own monotonic clock, and tap the graph into recording sinks.

use crate::note::Waveform;
use std::fmt;
use thiserror::Error;

/// Handle to a node owned by a [`SignalDevice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Processing unit kinds and their initial settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProcessingUnit {
    /// Linear amplitude scaling.
    Gain { level: f64 },
    /// Pure delay line, no feedback.
    Delay { seconds: f64, max_seconds: f64 },
    /// Low-pass filter.
    Filter { cutoff_hz: f64 },
    /// Convolution reverb. Passes signal through until an impulse response
    /// is loaded by the device's own means.
    Reverb,
    /// Peaking equalizer band.
    Peaking {
        center_hz: f64,
        q: f64,
        gain_db: f64,
    },
}

impl ProcessingUnit {
    pub fn name(&self) -> &'static str {
        match self {
            ProcessingUnit::Gain { .. } => "gain",
            ProcessingUnit::Delay { .. } => "delay",
            ProcessingUnit::Filter { .. } => "filter",
            ProcessingUnit::Reverb => "reverb",
            ProcessingUnit::Peaking { .. } => "peaking",
        }
    }
}

/// Scalar parameters the engine writes after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitParam {
    /// Gain level on a [`ProcessingUnit::Gain`].
    Level,
    /// Delay time in seconds on a [`ProcessingUnit::Delay`].
    DelayTime,
    /// Cutoff in Hz on a [`ProcessingUnit::Filter`].
    Cutoff,
}

impl UnitParam {
    pub fn name(&self) -> &'static str {
        match self {
            UnitParam::Level => "gain",
            UnitParam::DelayTime => "delay_time",
            UnitParam::Cutoff => "filter_cutoff",
        }
    }
}

/// Audio collected by a recording sink.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedAudio {
    pub sample_rate: u32,
    pub channels: u16,
    /// Interleaved samples, nominally in -1.0..=1.0.
    pub samples: Vec<f32>,
}

impl CapturedAudio {
    /// Frames per channel.
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Drop every frame past `seconds`. Shorter recordings are left alone.
    pub fn truncate_seconds(&mut self, seconds: f64) {
        let frames = (seconds.max(0.0) * self.sample_rate as f64).round() as usize;
        let len = frames.saturating_mul(self.channels as usize);
        self.samples.truncate(len);
    }
}

/// Errors reported by a signal device.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("{node} is not a {expected}")]
    WrongNodeKind { node: NodeId, expected: &'static str },

    #[error("Connecting {from} -> {to} would create a cycle")]
    Cycle { from: NodeId, to: NodeId },

    #[error("Source {0} was already started")]
    AlreadyStarted(NodeId),

    #[error("Parameter {param} out of range: {value}")]
    ParamOutOfRange { param: &'static str, value: f64 },

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for device calls.
pub type DeviceResult<T> = core::result::Result<T, DeviceError>;

/// An audio rendering backend with a monotonic transport clock.
///
/// Times passed to [`start_source`](Self::start_source) and
/// [`stop_source`](Self::stop_source) are absolute seconds on the clock
/// returned by [`current_time`](Self::current_time). Callers validate that
/// they are finite before issuing them.
pub trait SignalDevice {
    /// Current position of the device clock, in seconds.
    fn current_time(&self) -> f64;

    fn sample_rate(&self) -> u32;

    /// The final output node.
    fn destination(&self) -> NodeId;

    /// Create an oscillator-like source of the given waveform.
    fn create_source(&mut self, waveform: Waveform) -> DeviceResult<NodeId>;

    fn create_unit(&mut self, unit: ProcessingUnit) -> DeviceResult<NodeId>;

    /// Route the output of `from` into `to`. Fan-out and fan-in are allowed.
    fn connect(&mut self, from: NodeId, to: NodeId) -> DeviceResult<()>;

    /// Immediate scalar write, no ramping.
    fn set_param(&mut self, unit: NodeId, param: UnitParam, value: f64) -> DeviceResult<()>;

    fn start_source(&mut self, source: NodeId, at: f64) -> DeviceResult<()>;

    fn stop_source(&mut self, source: NodeId, at: f64) -> DeviceResult<()>;

    /// Drop a node and all of its connections.
    fn release(&mut self, node: NodeId) -> DeviceResult<()>;

    /// Create a sink that records whatever is connected into it.
    fn create_recording_sink(&mut self) -> DeviceResult<NodeId>;

    fn start_recording(&mut self, sink: NodeId) -> DeviceResult<()>;

    /// Stop a sink and hand over everything it recorded.
    fn stop_recording(&mut self, sink: NodeId) -> DeviceResult<CapturedAudio>;
}
