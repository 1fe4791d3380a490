//! Playback scheduling.
//!
//! A pass reads the device clock once, then turns every event of a pattern
//! into a source that starts and stops at absolute clock times. Commands
//! are issued back to back without waiting on the device, so the relative
//! timing of voices is exactly the relative timing of their offsets.

use crate::device::{DeviceResult, NodeId, SignalDevice};
use crate::effects::EffectsChain;
use crate::error::Error;
use crate::note::{Pattern, Waveform};
use crate::timing::{self, VoiceTiming};
use crate::voice::{PassId, ScheduledVoice, VoiceArena, VoiceHandle};

/// A voice the scheduler refused or failed to issue.
#[derive(Debug)]
pub struct RejectedVoice {
    pub event_index: usize,
    pub error: Error,
}

/// Outcome of one scheduling pass.
#[derive(Debug)]
pub struct ScheduleReport {
    pub pass: PassId,
    /// Clock reading the pass was anchored to.
    pub anchor: f64,
    pub voices: Vec<VoiceHandle>,
    pub rejected: Vec<RejectedVoice>,
}

impl ScheduleReport {
    pub fn scheduled(&self) -> usize {
        self.voices.len()
    }

    /// Whether every event of the pattern was issued.
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Issues voices against a [`SignalDevice`] and tracks them until they end.
#[derive(Debug, Default)]
pub struct PlaybackScheduler {
    voices: VoiceArena,
    last_pass: PassId,
}

impl PlaybackScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule every event of `pattern` into the chain.
    ///
    /// `bpm` is the tempo at call time and sets each voice's duration; it
    /// need not match [`Pattern::bpm`]. Voices that would land at a
    /// non-finite, negative or backwards time are rejected before any
    /// device call, and the rest of the pass continues.
    pub fn schedule<D: SignalDevice + ?Sized>(
        &mut self,
        pattern: &Pattern,
        chain: &EffectsChain,
        device: &mut D,
        bpm: f64,
    ) -> ScheduleReport {
        self.schedule_with_taps(pattern, chain, device, bpm, &[])
    }

    /// Like [`schedule`](Self::schedule), but also routes every voice into
    /// each node of `taps` in parallel with the chain.
    pub fn schedule_with_taps<D: SignalDevice + ?Sized>(
        &mut self,
        pattern: &Pattern,
        chain: &EffectsChain,
        device: &mut D,
        bpm: f64,
        taps: &[NodeId],
    ) -> ScheduleReport {
        let pass = self.last_pass.next();
        self.last_pass = pass;

        let now = device.current_time();
        let note_duration = timing::note_duration(bpm);

        let mut report = ScheduleReport {
            pass,
            anchor: now,
            voices: Vec::with_capacity(pattern.len()),
            rejected: Vec::new(),
        };

        for (event_index, event) in pattern.iter().enumerate() {
            let issued = timing::voice_timing(
                event_index,
                now,
                event.offset_seconds(),
                note_duration,
            )
            .and_then(|t| {
                issue_voice(device, chain.entry(), taps, event.waveform(), t).map(|source| {
                    ScheduledVoice {
                        pass,
                        event_index,
                        waveform: event.waveform(),
                        source,
                        start: t.start(),
                        stop: t.stop(),
                    }
                })
            });

            match issued {
                Ok(voice) => report.voices.push(self.voices.insert(voice)),
                Err(error) => {
                    tracing::warn!(%pass, event_index, %error, "voice rejected");
                    report.rejected.push(RejectedVoice { event_index, error });
                }
            }
        }

        tracing::debug!(
            %pass,
            anchor = now,
            scheduled = report.voices.len(),
            rejected = report.rejected.len(),
            "pass scheduled"
        );
        report
    }

    /// Release every voice whose stop time has passed on the device clock.
    ///
    /// Returns the number of voices released.
    pub fn reap<D: SignalDevice + ?Sized>(&mut self, device: &mut D) -> usize {
        let now = device.current_time();
        let ended = self.voices.handles_where(|v| v.stop <= now);
        for handle in &ended {
            self.finish(*handle, device);
        }
        ended.len()
    }

    /// Notification that a voice's source has finished.
    ///
    /// Handles that were already reaped or cancelled are ignored, so a late
    /// notification can never touch a voice from a later pass.
    pub fn on_voice_ended<D: SignalDevice + ?Sized>(
        &mut self,
        handle: VoiceHandle,
        device: &mut D,
    ) -> bool {
        if !self.voices.contains(handle) {
            tracing::trace!(slot = handle.slot(), "ignoring stale voice handle");
            return false;
        }
        self.finish(handle, device);
        true
    }

    /// Stop and release every live voice of `pass` right now.
    pub fn cancel_pass<D: SignalDevice + ?Sized>(&mut self, pass: PassId, device: &mut D) -> usize {
        let handles = self.voices.handles_where(|v| v.pass == pass);
        self.cancel_handles(&handles, device)
    }

    /// Stop and release every live voice.
    pub fn cancel_all<D: SignalDevice + ?Sized>(&mut self, device: &mut D) -> usize {
        let handles = self.voices.handles_where(|_| true);
        self.cancel_handles(&handles, device)
    }

    pub fn voice(&self, handle: VoiceHandle) -> Option<&ScheduledVoice> {
        self.voices.get(handle)
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn voices(&self) -> impl Iterator<Item = (VoiceHandle, &ScheduledVoice)> {
        self.voices.iter()
    }

    fn cancel_handles<D: SignalDevice + ?Sized>(
        &mut self,
        handles: &[VoiceHandle],
        device: &mut D,
    ) -> usize {
        let now = device.current_time();
        for handle in handles {
            if let Some(voice) = self.voices.get(*handle) {
                if voice.stop > now {
                    // Unstarted sources may refuse a stop; release below
                    // detaches them either way.
                    if let Err(error) = device.stop_source(voice.source, now.max(voice.start)) {
                        tracing::debug!(source = %voice.source, %error, "stop on cancel failed");
                    }
                }
            }
            self.finish(*handle, device);
        }
        handles.len()
    }

    fn finish<D: SignalDevice + ?Sized>(&mut self, handle: VoiceHandle, device: &mut D) {
        if let Some(voice) = self.voices.remove(handle) {
            if let Err(error) = device.release(voice.source) {
                tracing::debug!(source = %voice.source, %error, "release failed");
            }
        }
    }
}

/// Create, wire and start one source. A source created before a later
/// failure is released again.
fn issue_voice<D: SignalDevice + ?Sized>(
    device: &mut D,
    entry: NodeId,
    taps: &[NodeId],
    waveform: Waveform,
    timing: VoiceTiming,
) -> Result<NodeId, Error> {
    let source = device.create_source(waveform)?;
    if let Err(error) = wire_voice(device, source, entry, taps, timing) {
        if let Err(release_error) = device.release(source) {
            tracing::debug!(%source, error = %release_error, "release of half-wired voice failed");
        }
        return Err(error.into());
    }
    Ok(source)
}

fn wire_voice<D: SignalDevice + ?Sized>(
    device: &mut D,
    source: NodeId,
    entry: NodeId,
    taps: &[NodeId],
    timing: VoiceTiming,
) -> DeviceResult<()> {
    device.connect(source, entry)?;
    for tap in taps {
        device.connect(source, *tap)?;
    }
    device.start_source(source, timing.start())?;
    device.stop_source(source, timing.stop())
}
