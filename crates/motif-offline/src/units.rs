//! Processing units of the offline device, built as fundsp graphs.
//!
//! Every unit is mono in, mono out. Parameters the engine writes after
//! construction are [`Shared`] values read by the graph on every sample.

use fundsp::hacker::{
    bell_hz, constant, db_amp, lowpass, pass, shared, tap, var, AudioUnit, Shared,
};
use motif_core::{DeviceError, DeviceResult, NodeId, ProcessingUnit, UnitParam};
use std::fmt;

/// Q of the low-pass filter unit (Butterworth).
pub const LOWPASS_Q: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Filter cutoffs are held below this fraction of the sample rate.
const MAX_CUTOFF_RATIO: f64 = 0.49;

enum Control {
    Level(Shared),
    DelayTime { time: Shared, max_seconds: f64 },
    Cutoff(Shared),
    Fixed,
}

/// Runtime state of one processing unit.
pub struct UnitState {
    kind: &'static str,
    sample_rate: u32,
    control: Control,
    graph: Box<dyn AudioUnit>,
}

impl fmt::Debug for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitState")
            .field("kind", &self.kind)
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}

impl UnitState {
    pub fn new(unit: ProcessingUnit, sample_rate: u32) -> Self {
        let (control, mut graph) = match unit {
            ProcessingUnit::Gain { level } => {
                let level = shared(level as f32);
                let graph: Box<dyn AudioUnit> = Box::new(pass() * var(&level));
                (Control::Level(level), graph)
            }
            ProcessingUnit::Delay {
                seconds,
                max_seconds,
            } => {
                let max_seconds = max_seconds.max(0.0);
                let time = shared(seconds.clamp(0.0, max_seconds) as f32);
                let graph: Box<dyn AudioUnit> =
                    Box::new((pass() | var(&time)) >> tap(0.0, max_seconds as f32));
                (Control::DelayTime { time, max_seconds }, graph)
            }
            ProcessingUnit::Filter { cutoff_hz } => {
                let cutoff = shared(clamp_cutoff(cutoff_hz, sample_rate));
                let graph: Box<dyn AudioUnit> =
                    Box::new((pass() | var(&cutoff) | constant(LOWPASS_Q)) >> lowpass());
                (Control::Cutoff(cutoff), graph)
            }
            // No impulse response is ever loaded.
            ProcessingUnit::Reverb => {
                let graph: Box<dyn AudioUnit> = Box::new(pass());
                (Control::Fixed, graph)
            }
            ProcessingUnit::Peaking {
                center_hz,
                q,
                gain_db,
            } => {
                let graph: Box<dyn AudioUnit> = Box::new(bell_hz(
                    clamp_cutoff(center_hz, sample_rate),
                    q.max(0.001) as f32,
                    db_amp(gain_db as f32),
                ));
                (Control::Fixed, graph)
            }
        };
        graph.set_sample_rate(sample_rate as f64);
        graph.reset();

        Self {
            kind: unit.name(),
            sample_rate,
            control,
            graph,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn process(&mut self, x: f64) -> f64 {
        self.graph.filter_mono(x as f32) as f64
    }

    /// Current value of `param`, if this unit has it.
    pub fn param(&self, param: UnitParam) -> Option<f64> {
        let value = match (&self.control, param) {
            (Control::Level(level), UnitParam::Level) => level.value(),
            (Control::DelayTime { time, .. }, UnitParam::DelayTime) => time.value(),
            (Control::Cutoff(cutoff), UnitParam::Cutoff) => cutoff.value(),
            _ => return None,
        };
        Some(value as f64)
    }

    /// Write `param`. `node` is only used to label errors.
    pub fn set_param(&mut self, node: NodeId, param: UnitParam, value: f64) -> DeviceResult<()> {
        let out_of_range = DeviceError::ParamOutOfRange {
            param: param.name(),
            value,
        };
        match (&self.control, param) {
            (Control::Level(level), UnitParam::Level) => {
                if !value.is_finite() {
                    return Err(out_of_range);
                }
                level.set_value(value as f32);
            }
            (Control::DelayTime { time, max_seconds }, UnitParam::DelayTime) => {
                if !value.is_finite() || value < 0.0 || value > *max_seconds {
                    return Err(out_of_range);
                }
                time.set_value(value as f32);
            }
            (Control::Cutoff(cutoff), UnitParam::Cutoff) => {
                if !value.is_finite() || value <= 0.0 {
                    return Err(out_of_range);
                }
                cutoff.set_value(clamp_cutoff(value, self.sample_rate));
            }
            _ => {
                let expected = match param {
                    UnitParam::Level => "gain",
                    UnitParam::DelayTime => "delay",
                    UnitParam::Cutoff => "filter",
                };
                tracing::debug!(%node, kind = self.kind, "parameter not supported");
                return Err(DeviceError::WrongNodeKind { node, expected });
            }
        }
        Ok(())
    }
}

fn clamp_cutoff(hz: f64, sample_rate: u32) -> f32 {
    hz.clamp(1.0, sample_rate as f64 * MAX_CUTOFF_RATIO) as f32
}
