//! Rendered-audio capture.
//!
//! A capture taps every voice of one scheduling pass into a recording sink
//! and stops the sink once the device clock passes the capture window. The
//! stop is not a timer: [`AudioCapture::poll`] checks the device clock and
//! finishes the capture when it is due, so a capture can never outlive the
//! session that drives it.

use crate::artifact::Artifact;
use crate::error::{ExportError, Result};
use crate::format::wav::{self, BitDepth};
use crossbeam_channel::{bounded, Receiver, Sender};
use motif_core::{
    timing, EffectsChain, NodeId, PassId, Pattern, PlaybackScheduler, SignalDevice,
};

/// Handle to a capture in progress.
///
/// Poll with [`try_result`](Self::try_result) after driving the owning
/// [`AudioCapture`].
#[derive(Debug)]
pub struct CaptureHandle {
    rx: Receiver<Result<Artifact>>,
    outcome: Option<Result<Artifact>>,
    pass: PassId,
    window_ms: f64,
    deadline: f64,
}

impl CaptureHandle {
    fn receive(&mut self) {
        if self.outcome.is_none() {
            if let Ok(outcome) = self.rx.try_recv() {
                self.outcome = Some(outcome);
            }
        }
    }

    /// The outcome, once the capture has finished (non-blocking).
    pub fn try_result(&mut self) -> Option<&Result<Artifact>> {
        self.receive();
        self.outcome.as_ref()
    }

    /// Take the outcome out of the handle (non-blocking).
    pub fn take_result(&mut self) -> Option<Result<Artifact>> {
        self.receive();
        self.outcome.take()
    }

    pub fn is_done(&self) -> bool {
        self.outcome.is_some() || !self.rx.is_empty()
    }

    /// Scheduling pass whose voices are being captured.
    pub fn pass(&self) -> PassId {
        self.pass
    }

    /// Nominal capture length in milliseconds.
    pub fn window_ms(&self) -> f64 {
        self.window_ms
    }

    /// Device clock time at which the capture stops.
    pub fn deadline(&self) -> f64 {
        self.deadline
    }
}

#[derive(Debug)]
struct ActiveCapture {
    sink: NodeId,
    deadline: f64,
    window_ms: f64,
    tx: Sender<Result<Artifact>>,
}

/// The exclusive capture slot of a session.
#[derive(Debug, Default)]
pub struct AudioCapture {
    active: Option<ActiveCapture>,
    bit_depth: BitDepth,
}

impl AudioCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bit_depth(mut self, bit_depth: BitDepth) -> Self {
        self.bit_depth = bit_depth;
        self
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Start capturing a fresh playback of `pattern`.
    ///
    /// Recording starts before any voice is issued. Voices are scheduled
    /// exactly as [`PlaybackScheduler::schedule`] would, with the sink as an
    /// extra tap beside the chain. The capture window is
    /// `duration_bars * 60000 / bpm` milliseconds from now.
    pub fn start<D: SignalDevice + ?Sized>(
        &mut self,
        pattern: &Pattern,
        chain: &EffectsChain,
        scheduler: &mut PlaybackScheduler,
        device: &mut D,
        duration_bars: i32,
        bpm: f64,
    ) -> Result<CaptureHandle> {
        if self.active.is_some() {
            return Err(motif_core::Error::CaptureAlreadyActive.into());
        }

        let window_ms = timing::recording_window_ms(duration_bars, bpm);
        if !window_ms.is_finite() || window_ms <= 0.0 {
            return Err(ExportError::InvalidWindow(window_ms));
        }

        let sink = device.create_recording_sink()?;
        if let Err(e) = device.start_recording(sink) {
            release_sink(device, sink);
            return Err(e.into());
        }

        let started_at = device.current_time();
        let report = scheduler.schedule_with_taps(pattern, chain, device, bpm, &[sink]);
        let deadline = started_at + window_ms / 1000.0;

        let (tx, rx) = bounded(1);
        self.active = Some(ActiveCapture {
            sink,
            deadline,
            window_ms,
            tx,
        });

        tracing::info!(
            pass = %report.pass,
            voices = report.scheduled(),
            rejected = report.rejected.len(),
            window_ms,
            deadline,
            "capture started"
        );

        Ok(CaptureHandle {
            rx,
            outcome: None,
            pass: report.pass,
            window_ms,
            deadline,
        })
    }

    /// Finish the capture if the device clock has reached its deadline.
    ///
    /// The file holds exactly the capture window, however late the poll
    /// lands after the deadline.
    ///
    /// Returns `true` if a capture completed during this call.
    pub fn poll<D: SignalDevice + ?Sized>(&mut self, device: &mut D) -> bool {
        let due = self
            .active
            .as_ref()
            .is_some_and(|a| device.current_time() >= a.deadline);
        if !due {
            return false;
        }
        let Some(active) = self.active.take() else {
            return false;
        };

        let outcome = device
            .stop_recording(active.sink)
            .map_err(ExportError::from)
            .and_then(|mut audio| {
                audio.truncate_seconds(active.window_ms / 1000.0);
                tracing::debug!(
                    frames = audio.frames(),
                    seconds = audio.duration_seconds(),
                    "capture stopped"
                );
                wav::encode_captured(&audio, self.bit_depth)
            })
            .map(Artifact::wav);
        release_sink(device, active.sink);

        match &outcome {
            Ok(artifact) => tracing::info!(bytes = artifact.len(), "capture complete"),
            Err(error) => tracing::warn!(%error, "capture failed"),
        }
        deliver(&active.tx, outcome);
        true
    }

    /// Abandon the capture in progress, if any. Its handle completes with
    /// [`motif_core::Error::CaptureCancelled`].
    pub fn cancel<D: SignalDevice + ?Sized>(&mut self, device: &mut D) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };
        if let Err(error) = device.stop_recording(active.sink) {
            tracing::debug!(sink = %active.sink, %error, "stop on cancel failed");
        }
        release_sink(device, active.sink);
        tracing::info!("capture cancelled");
        deliver(&active.tx, Err(motif_core::Error::CaptureCancelled.into()));
        true
    }
}

fn release_sink<D: SignalDevice + ?Sized>(device: &mut D, sink: NodeId) {
    if let Err(error) = device.release(sink) {
        tracing::debug!(%sink, %error, "sink release failed");
    }
}

fn deliver(tx: &Sender<Result<Artifact>>, outcome: Result<Artifact>) {
    if tx.try_send(outcome).is_err() {
        tracing::debug!("capture handle dropped before completion");
    }
}
