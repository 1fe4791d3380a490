//! Fixed processing chain between the voices and the device output.
//!
//! Signal order:
//!
//! ```text
//! reverb -> delay -> filter -> eq[0] -> ... -> eq[9] -> gain -> destination
//! ```
//!
//! Voices connect into [`EffectsChain::entry`]. The topology never changes
//! after [`EffectsChain::build`]; only the three scalar levels do.

use crate::device::{NodeId, ProcessingUnit, SignalDevice, UnitParam};
use crate::error::{Error, Result};

/// Center frequencies of the equalizer bands, ascending.
pub const EQ_CENTER_FREQUENCIES: [f64; EQ_BANDS] = [
    32.0, 64.0, 125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0, 8000.0, 16000.0,
];

pub const EQ_BANDS: usize = 10;

/// Q of every equalizer band.
pub const EQ_Q: f64 = 1.0;

/// Longest delay the chain's delay line is allocated for.
pub const MAX_DELAY_SECONDS: f64 = 1.0;

pub const DEFAULT_GAIN: f64 = 1.0;
pub const DEFAULT_DELAY_SECONDS: f64 = 0.0;
pub const DEFAULT_CUTOFF_HZ: f64 = 20_000.0;

/// Current scalar settings of a chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainLevels {
    pub gain: f64,
    pub delay_seconds: f64,
    pub cutoff_hz: f64,
}

impl Default for ChainLevels {
    fn default() -> Self {
        Self {
            gain: DEFAULT_GAIN,
            delay_seconds: DEFAULT_DELAY_SECONDS,
            cutoff_hz: DEFAULT_CUTOFF_HZ,
        }
    }
}

/// Handles to the nodes of the processing chain.
#[derive(Debug, Clone)]
pub struct EffectsChain {
    reverb: NodeId,
    delay: NodeId,
    filter: NodeId,
    eq: [NodeId; EQ_BANDS],
    gain: NodeId,
    destination: NodeId,
    levels: ChainLevels,
}

impl EffectsChain {
    /// Create every stage on `device` and wire them in signal order.
    ///
    /// Any device failure aborts the build; nodes already created are left
    /// to the device, which owns them.
    pub fn build<D: SignalDevice + ?Sized>(device: &mut D) -> Result<Self> {
        let levels = ChainLevels::default();

        let reverb = device.create_unit(ProcessingUnit::Reverb)?;
        let delay = device.create_unit(ProcessingUnit::Delay {
            seconds: levels.delay_seconds,
            max_seconds: MAX_DELAY_SECONDS,
        })?;
        let filter = device.create_unit(ProcessingUnit::Filter {
            cutoff_hz: levels.cutoff_hz,
        })?;

        let mut eq = [NodeId::new(0); EQ_BANDS];
        for (slot, center_hz) in eq.iter_mut().zip(EQ_CENTER_FREQUENCIES) {
            *slot = device.create_unit(ProcessingUnit::Peaking {
                center_hz,
                q: EQ_Q,
                gain_db: 0.0,
            })?;
        }

        let gain = device.create_unit(ProcessingUnit::Gain {
            level: levels.gain,
        })?;
        let destination = device.destination();

        let chain = Self {
            reverb,
            delay,
            filter,
            eq,
            gain,
            destination,
            levels,
        };

        let stages = chain.stages();
        for pair in stages.windows(2) {
            device.connect(pair[0], pair[1])?;
        }
        device.connect(gain, destination)?;

        tracing::debug!(
            stages = stages.len(),
            entry = %reverb,
            "effects chain built"
        );
        Ok(chain)
    }

    /// Node voices connect into.
    pub fn entry(&self) -> NodeId {
        self.reverb
    }

    /// All stages in signal order, excluding the destination.
    pub fn stages(&self) -> Vec<NodeId> {
        let mut stages = Vec::with_capacity(EQ_BANDS + 4);
        stages.extend([self.reverb, self.delay, self.filter]);
        stages.extend(self.eq);
        stages.push(self.gain);
        stages
    }

    pub fn reverb(&self) -> NodeId {
        self.reverb
    }

    pub fn delay(&self) -> NodeId {
        self.delay
    }

    pub fn filter(&self) -> NodeId {
        self.filter
    }

    pub fn eq_bands(&self) -> &[NodeId; EQ_BANDS] {
        &self.eq
    }

    pub fn gain(&self) -> NodeId {
        self.gain
    }

    pub fn destination(&self) -> NodeId {
        self.destination
    }

    pub fn levels(&self) -> ChainLevels {
        self.levels
    }

    /// Set the output level. Must be finite and non-negative.
    pub fn set_gain<D: SignalDevice + ?Sized>(&mut self, device: &mut D, level: f64) -> Result<()> {
        if !level.is_finite() || level < 0.0 {
            return Err(Error::InvalidParameter {
                name: UnitParam::Level.name(),
                value: level,
            });
        }
        device.set_param(self.gain, UnitParam::Level, level)?;
        self.levels.gain = level;
        Ok(())
    }

    /// Set the delay time, within `0..=MAX_DELAY_SECONDS`.
    pub fn set_delay_time<D: SignalDevice + ?Sized>(
        &mut self,
        device: &mut D,
        seconds: f64,
    ) -> Result<()> {
        if !(0.0..=MAX_DELAY_SECONDS).contains(&seconds) {
            return Err(Error::InvalidParameter {
                name: UnitParam::DelayTime.name(),
                value: seconds,
            });
        }
        device.set_param(self.delay, UnitParam::DelayTime, seconds)?;
        self.levels.delay_seconds = seconds;
        Ok(())
    }

    /// Set the low-pass cutoff. Must be finite and positive.
    pub fn set_filter_cutoff<D: SignalDevice + ?Sized>(
        &mut self,
        device: &mut D,
        hz: f64,
    ) -> Result<()> {
        if !hz.is_finite() || hz <= 0.0 {
            return Err(Error::InvalidParameter {
                name: UnitParam::Cutoff.name(),
                value: hz,
            });
        }
        device.set_param(self.filter, UnitParam::Cutoff, hz)?;
        self.levels.cutoff_hz = hz;
        Ok(())
    }
}
