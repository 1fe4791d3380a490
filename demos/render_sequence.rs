//! # Render Sequence
//!
//! Generate a pattern, play it through the effects chain on the offline
//! device, and write both exports.
//!
//! **Concepts:** `SequencerSession`, `record()`, `export_symbolic()`, `pump()`
//!
//! ```bash
//! cargo run --example render_sequence -- [output-dir] [scale] [bpm] [bars]
//! RUST_LOG=motif=debug cargo run --example render_sequence
//! ```

use motif::prelude::*;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Offline clock step between pumps.
const STEP_SECONDS: f64 = 0.01;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::from_default_env()
        .add_directive("motif=info".parse()?)
        .add_directive("motif_export=info".parse()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    let mut args = std::env::args().skip(1);
    let out_dir = PathBuf::from(args.next().unwrap_or_else(|| ".".into()));
    let scale = args.next().unwrap_or_else(|| "C".into());
    let bpm: i32 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(120);
    let bars: i32 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(4);

    let mut session = SequencerSession::builder()
        .bpm(bpm)
        .scale(scale)
        .duration_bars(bars)
        .pitch_mapper(ScaleWalk::default())
        .device(OfflineDevice::default())
        .build()?;

    let pattern = session.generate()?;
    for (i, event) in pattern.iter().enumerate() {
        println!("{:>3}  {:>6.3}s  {}", i, event.offset_seconds(), event.waveform());
    }

    session.set_delay_time(0.125)?;
    session.set_filter_cutoff(3_000.0)?;

    let mut capture = session.record(&pattern)?;
    let deadline = capture.deadline();

    // Drive the offline clock past the capture window
    while !capture.is_done() {
        let device = session.device_mut().ok_or("device detached")?;
        device.advance(STEP_SECONDS);
        session.pump();
        if session.device().is_some_and(|d| d.current_time() > deadline + 1.0) {
            return Err("capture did not finish".into());
        }
    }

    let wav = capture.take_result().ok_or("capture produced nothing")??;
    println!("Exported: {}", wav.write_to_dir(&out_dir)?.display());

    let midi = session.export_symbolic(&pattern)?;
    println!("Exported: {}", midi.write_to_dir(&out_dir)?.display());

    Ok(())
}
