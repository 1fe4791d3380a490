//! SequencerSession that owns everything one sequencer needs

use crate::{Error, Result};
use motif_core::{
    EffectsChain, Pattern, PatternGenerator, PlaybackScheduler, ScheduleReport, SequencerConfig,
    SignalDevice,
};

#[cfg(feature = "wav")]
use motif_export::{AudioCapture, CaptureHandle};

#[cfg(feature = "midi")]
use motif_export::{Artifact, PitchMapper};

/// What one call to [`SequencerSession::pump`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpReport {
    /// Voices whose stop time had passed and were released.
    pub reaped: usize,
    /// Whether the capture in progress finished during this pump.
    pub capture_finished: bool,
}

/// Device-bound state, present once a device is attached.
struct DeviceStage<D> {
    device: D,
    chain: EffectsChain,
    scheduler: PlaybackScheduler,
    #[cfg(feature = "wav")]
    capture: AudioCapture,
}

impl<D: SignalDevice> DeviceStage<D> {
    /// Cancel the capture and every live voice.
    fn shutdown(&mut self) -> usize {
        #[cfg(feature = "wav")]
        self.capture.cancel(&mut self.device);
        self.scheduler.cancel_all(&mut self.device)
    }
}

/// A generative sequencer bound to at most one [`SignalDevice`].
///
/// The session holds the configuration, the current pattern, the effects
/// chain, the playback scheduler and the capture slot. It is driven from a
/// single owner: nothing runs unless a method is called, and timed work
/// (finished voices, capture deadlines) happens in [`pump`](Self::pump).
///
/// # Example
///
/// ```ignore
/// use motif::prelude::*;
///
/// let mut session = SequencerSession::builder()
///     .bpm(120)
///     .scale("G")
///     .duration_bars(4)
///     .device(OfflineDevice::default())
///     .build()?;
///
/// let pattern = session.generate()?;
/// session.play(&pattern)?;
/// let mut capture = session.record(&pattern)?;
///
/// // Drive the device clock, then
/// session.pump();
/// let wav = capture.take_result();
/// ```
pub struct SequencerSession<D: SignalDevice> {
    config: SequencerConfig,
    generator: PatternGenerator,
    pattern: Pattern,
    stage: Option<DeviceStage<D>>,
    #[cfg(feature = "wav")]
    bit_depth: motif_export::BitDepth,
    #[cfg(feature = "midi")]
    pitch: Box<dyn PitchMapper>,
}

impl<D: SignalDevice> SequencerSession<D> {
    /// Create a new session builder
    pub fn builder() -> crate::SessionBuilder<D> {
        crate::SessionBuilder::default()
    }

    pub(crate) fn from_parts(
        config: SequencerConfig,
        generator: PatternGenerator,
        #[cfg(feature = "wav")] bit_depth: motif_export::BitDepth,
        #[cfg(feature = "midi")] pitch: Box<dyn PitchMapper>,
    ) -> Self {
        let pattern = Pattern::empty(config.scale_root.as_str(), config.bpm);
        Self {
            config,
            generator,
            pattern,
            stage: None,
            #[cfg(feature = "wav")]
            bit_depth,
            #[cfg(feature = "midi")]
            pitch,
        }
    }

    /// Attach the device and build the effects chain on it.
    ///
    /// A session has exactly one chain; a second device is refused with
    /// [`motif_core::Error::ChainAlreadyBuilt`].
    pub fn attach_device(&mut self, mut device: D) -> Result<()> {
        if self.stage.is_some() {
            return Err(motif_core::Error::ChainAlreadyBuilt.into());
        }
        let chain = EffectsChain::build(&mut device)?;
        tracing::info!(
            sample_rate = device.sample_rate(),
            stages = chain.stages().len(),
            "device attached"
        );
        self.stage = Some(DeviceStage {
            device,
            chain,
            scheduler: PlaybackScheduler::new(),
            #[cfg(feature = "wav")]
            capture: AudioCapture::new().with_bit_depth(self.bit_depth),
        });
        Ok(())
    }

    pub fn has_device(&self) -> bool {
        self.stage.is_some()
    }

    pub fn device(&self) -> Option<&D> {
        self.stage.as_ref().map(|s| &s.device)
    }

    /// Mutable device access, e.g. to advance an offline clock.
    pub fn device_mut(&mut self) -> Option<&mut D> {
        self.stage.as_mut().map(|s| &mut s.device)
    }

    pub fn chain(&self) -> Option<&EffectsChain> {
        self.stage.as_ref().map(|s| &s.chain)
    }

    pub fn scheduler(&self) -> Option<&PlaybackScheduler> {
        self.stage.as_ref().map(|s| &s.scheduler)
    }

    fn stage_mut(&mut self) -> Result<&mut DeviceStage<D>> {
        self.stage.as_mut().ok_or(Error::Core(motif_core::Error::NoDevice))
    }

    // =========================================================================
    // Configuration and generation
    // =========================================================================

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Replace the configuration.
    ///
    /// Takes effect for the next `generate`, and for the tempo of the next
    /// `play`, `record` or `export_symbolic`. Already scheduled voices keep
    /// their times.
    pub fn set_config(&mut self, config: SequencerConfig) {
        tracing::debug!(
            bpm = config.bpm,
            scale = %config.scale_root,
            bars = config.duration_bars,
            "config updated"
        );
        self.config = config;
    }

    /// Generate a fresh pattern from the current configuration.
    ///
    /// The new pattern replaces the current one; voices of earlier patterns
    /// keep playing.
    pub fn generate(&mut self) -> Result<Pattern> {
        let pattern = self.generator.generate(&self.config)?;
        tracing::info!(
            notes = pattern.len(),
            scale = pattern.scale_root(),
            bpm = pattern.bpm(),
            "pattern generated"
        );
        self.pattern = pattern.clone();
        Ok(pattern)
    }

    /// The most recently generated pattern (empty before the first
    /// `generate`).
    pub fn current_pattern(&self) -> &Pattern {
        &self.pattern
    }

    fn current_bpm(&self) -> f64 {
        self.config.bpm as f64
    }

    // =========================================================================
    // Playback
    // =========================================================================

    /// Schedule `pattern` through the effects chain, starting now.
    ///
    /// Voice lengths follow the session's current tempo. Voices that cannot
    /// be placed on the clock are listed in the report; the rest play.
    pub fn play(&mut self, pattern: &Pattern) -> Result<ScheduleReport> {
        let bpm = self.current_bpm();
        let stage = self.stage_mut()?;
        stage.scheduler.reap(&mut stage.device);
        let report = stage
            .scheduler
            .schedule(pattern, &stage.chain, &mut stage.device, bpm);
        tracing::info!(
            pass = %report.pass,
            voices = report.scheduled(),
            rejected = report.rejected.len(),
            "playback scheduled"
        );
        Ok(report)
    }

    /// Stop every live voice now. Returns how many were stopped.
    pub fn cancel_playback(&mut self) -> Result<usize> {
        let stage = self.stage_mut()?;
        let cancelled = stage.scheduler.cancel_all(&mut stage.device);
        tracing::info!(cancelled, "playback cancelled");
        Ok(cancelled)
    }

    /// Do the timed work that is due on the device clock: release finished
    /// voices and finish a capture whose window has elapsed.
    ///
    /// Without a device this does nothing.
    pub fn pump(&mut self) -> PumpReport {
        let Some(stage) = self.stage.as_mut() else {
            return PumpReport::default();
        };
        let reaped = stage.scheduler.reap(&mut stage.device);
        #[cfg(feature = "wav")]
        let capture_finished = stage.capture.poll(&mut stage.device);
        #[cfg(not(feature = "wav"))]
        let capture_finished = false;
        PumpReport {
            reaped,
            capture_finished,
        }
    }

    // =========================================================================
    // Export
    // =========================================================================

    /// Play `pattern` once more while recording it.
    ///
    /// The capture runs for the configured duration at the current tempo and
    /// completes during a later [`pump`](Self::pump).
    #[cfg(feature = "wav")]
    pub fn record(&mut self, pattern: &Pattern) -> Result<CaptureHandle> {
        let bpm = self.current_bpm();
        let bars = self.config.duration_bars;
        let stage = self.stage_mut()?;
        stage.scheduler.reap(&mut stage.device);
        let handle = stage.capture.start(
            pattern,
            &stage.chain,
            &mut stage.scheduler,
            &mut stage.device,
            bars,
            bpm,
        )?;
        Ok(handle)
    }

    #[cfg(feature = "wav")]
    pub fn is_recording(&self) -> bool {
        self.stage.as_ref().is_some_and(|s| s.capture.is_active())
    }

    /// Write `pattern` as a note file at the current tempo. Needs no device.
    #[cfg(feature = "midi")]
    pub fn export_symbolic(&self, pattern: &Pattern) -> Result<Artifact> {
        Ok(motif_export::export_notes(
            pattern,
            self.current_bpm(),
            self.pitch.as_ref(),
        )?)
    }

    // =========================================================================
    // Effects chain
    // =========================================================================

    pub fn set_gain(&mut self, level: f64) -> Result<()> {
        let stage = self.stage_mut()?;
        stage.chain.set_gain(&mut stage.device, level)?;
        Ok(())
    }

    pub fn set_delay_time(&mut self, seconds: f64) -> Result<()> {
        let stage = self.stage_mut()?;
        stage.chain.set_delay_time(&mut stage.device, seconds)?;
        Ok(())
    }

    pub fn set_filter_cutoff(&mut self, hz: f64) -> Result<()> {
        let stage = self.stage_mut()?;
        stage.chain.set_filter_cutoff(&mut stage.device, hz)?;
        Ok(())
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Cancel the capture and all voices, take the chain down and hand the
    /// device back. The session can then accept a new device.
    pub fn teardown(&mut self) -> Option<D> {
        let mut stage = self.stage.take()?;
        let cancelled = stage.shutdown();
        for node in stage.chain.stages() {
            if let Err(error) = stage.device.release(node) {
                tracing::debug!(%node, %error, "chain node not released");
            }
        }
        tracing::info!(cancelled, "session torn down");
        Some(stage.device)
    }
}

impl<D: SignalDevice> Drop for SequencerSession<D> {
    fn drop(&mut self) {
        if let Some(stage) = self.stage.as_mut() {
            stage.shutdown();
        }
    }
}

#[cfg(all(test, feature = "offline"))]
mod tests {
    use super::*;
    use motif_offline::OfflineDevice;

    fn session() -> SequencerSession<OfflineDevice> {
        SequencerSession::builder()
            .seed(1)
            .device(OfflineDevice::new(8_000))
            .build()
            .unwrap()
    }

    #[test]
    fn test_no_device_errors() {
        let mut session: SequencerSession<OfflineDevice> =
            SequencerSession::builder().seed(1).build().unwrap();
        let pattern = session.generate().unwrap();

        let is_no_device = |e: Error| matches!(e.as_core(), Some(motif_core::Error::NoDevice));
        assert!(is_no_device(session.play(&pattern).unwrap_err()));
        assert!(is_no_device(session.set_gain(0.5).unwrap_err()));
        assert!(is_no_device(session.cancel_playback().unwrap_err()));
        #[cfg(feature = "wav")]
        assert!(is_no_device(session.record(&pattern).unwrap_err()));
        assert_eq!(session.pump(), PumpReport::default());
        assert!(session.teardown().is_none());
    }

    #[test]
    fn test_second_device_refused() {
        let mut session = session();
        let err = session.attach_device(OfflineDevice::new(8_000)).unwrap_err();
        assert!(matches!(
            err.as_core(),
            Some(motif_core::Error::ChainAlreadyBuilt)
        ));
    }

    #[test]
    fn test_generate_replaces_current_pattern() {
        let mut session = session();
        assert!(session.current_pattern().is_empty());
        let first = session.generate().unwrap();
        assert_eq!(first.len(), 16);
        assert!(session.current_pattern().shares_events_with(&first));

        let second = session.generate().unwrap();
        assert!(session.current_pattern().shares_events_with(&second));
        assert!(!first.shares_events_with(&second));
    }

    #[test]
    fn test_unknown_scale_keeps_current_pattern() {
        let mut session = session();
        let pattern = session.generate().unwrap();
        session.set_config(SequencerConfig::new(120, "Q", 4));
        assert!(matches!(
            session.generate().unwrap_err().as_core(),
            Some(motif_core::Error::UnknownScale(_))
        ));
        assert!(session.current_pattern().shares_events_with(&pattern));
    }

    #[test]
    fn test_teardown_returns_device_and_allows_reattach() {
        let mut session = session();
        let pattern = session.generate().unwrap();
        session.play(&pattern).unwrap();

        let device = session.teardown().unwrap();
        // Voices and chain stages released; only the destination remains
        assert_eq!(device.node_count(), 1);
        assert!(!session.has_device());

        session.attach_device(device).unwrap();
        assert!(session.has_device());
    }
}
