//! Builder for configuring and constructing a `SequencerSession`.

use crate::{Result, SequencerSession};
use motif_core::{PatternGenerator, SequencerConfig, SignalDevice};

#[cfg(feature = "midi")]
use motif_export::{FixedPitch, PitchMapper};

/// Export formats are available when their Cargo features are compiled.
/// The device is optional at build time and can be attached later with
/// [`SequencerSession::attach_device`].
///
/// # Example
///
/// ```ignore
/// use motif::prelude::*;
///
/// let session = SequencerSession::builder()
///     .bpm(90)
///     .scale("D")
///     .duration_bars(2)
///     .seed(42)
///     .device(OfflineDevice::new(44_100))
///     .build()?;
/// ```
pub struct SessionBuilder<D> {
    config: SequencerConfig,
    seed: Option<u64>,
    device: Option<D>,

    #[cfg(feature = "wav")]
    bit_depth: motif_export::BitDepth,

    #[cfg(feature = "midi")]
    pitch: Option<Box<dyn PitchMapper>>,
}

impl<D> Default for SessionBuilder<D> {
    fn default() -> Self {
        Self {
            config: SequencerConfig::default(),
            seed: None,
            device: None,

            #[cfg(feature = "wav")]
            bit_depth: motif_export::BitDepth::default(),

            #[cfg(feature = "midi")]
            pitch: None,
        }
    }
}

impl<D: SignalDevice> SessionBuilder<D> {
    /// Default: 120
    pub fn bpm(mut self, bpm: i32) -> Self {
        self.config.bpm = bpm;
        self
    }

    /// Default: "C"
    pub fn scale(mut self, root: impl Into<String>) -> Self {
        self.config.scale_root = root.into();
        self
    }

    /// Default: 4
    pub fn duration_bars(mut self, bars: i32) -> Self {
        self.config.duration_bars = bars;
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: SequencerConfig) -> Self {
        self.config = config;
        self
    }

    /// Make waveform choice reproducible. Without a seed the generator is
    /// seeded from system entropy.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Attach a device at build time.
    pub fn device(mut self, device: D) -> Self {
        self.device = Some(device);
        self
    }

    /// Sample format of captured WAV files. Default: 16-bit.
    #[cfg(feature = "wav")]
    pub fn bit_depth(mut self, bit_depth: motif_export::BitDepth) -> Self {
        self.bit_depth = bit_depth;
        self
    }

    /// Pitch assignment for note files. Default: every note on middle C.
    #[cfg(feature = "midi")]
    pub fn pitch_mapper(mut self, mapper: impl PitchMapper + 'static) -> Self {
        self.pitch = Some(Box::new(mapper));
        self
    }

    /// Validates the configuration, then builds the effects chain if a
    /// device was given.
    pub fn build(self) -> Result<SequencerSession<D>> {
        self.config.validate()?;

        let generator = match self.seed {
            Some(seed) => PatternGenerator::seeded(seed),
            None => PatternGenerator::new(),
        };

        let mut session = SequencerSession::from_parts(
            self.config,
            generator,
            #[cfg(feature = "wav")]
            self.bit_depth,
            #[cfg(feature = "midi")]
            self.pitch
                .unwrap_or_else(|| Box::new(FixedPitch::default())),
        );

        if let Some(device) = self.device {
            session.attach_device(device)?;
        }
        Ok(session)
    }
}
