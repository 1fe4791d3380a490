//! Capture and symbolic export against the offline device.

mod helpers;

use approx::assert_relative_eq;
use helpers::*;
use motif_core::{Error, SequencerConfig, SignalDevice};
use motif_export::format::wav::decode_wav_memory;
use motif_export::{export_notes, AudioCapture, ExportError, FixedPitch, NoteTrack, ScaleWalk};

#[test]
fn test_capture_length_matches_window() {
    let mut rig = rig();
    let config = SequencerConfig::default();
    let pattern = generated(&config, 11);
    let mut capture = AudioCapture::new();

    let mut handle = capture
        .start(
            &pattern,
            &rig.chain,
            &mut rig.scheduler,
            &mut rig.device,
            config.duration_bars,
            config.bpm as f64,
        )
        .unwrap();
    assert_eq!(handle.window_ms(), 2000.0);

    let mut polls = 0;
    while !capture.poll(&mut rig.device) {
        rig.device.advance(0.1);
        polls += 1;
        assert!(polls <= 20, "capture never finished");
    }

    let wav = handle.take_result().unwrap().unwrap();
    let audio = decode_wav_memory(wav.bytes()).unwrap();
    assert_eq!(audio.sample_rate, TEST_SAMPLE_RATE);
    assert_eq!(audio.frames(), 96_000);
    assert_relative_eq!(audio.duration_seconds(), 2.0);
}

#[test]
fn test_capture_is_dry_and_follows_onsets() {
    let mut rig = rig();
    let pattern = square_run(4);
    let mut capture = AudioCapture::new();

    // Muting the chain leaves the tap untouched
    rig.chain.set_gain(&mut rig.device, 0.0).unwrap();
    let mut handle = capture
        .start(&pattern, &rig.chain, &mut rig.scheduler, &mut rig.device, 4, 120.0)
        .unwrap();
    rig.device.advance(2.0);
    capture.poll(&mut rig.device);

    let audio = decode_wav_memory(handle.take_result().unwrap().unwrap().bytes()).unwrap();
    let quarter = TEST_SAMPLE_RATE as usize / 4;
    // Four back-to-back quarter-second notes, then silence
    assert!(peak(&audio.samples[..4 * quarter]) > 0.9);
    assert_eq!(peak(&audio.samples[4 * quarter..]), 0.0);
    assert_eq!(peak(rig.device.destination_output()), 0.0);
}

#[test]
fn test_capture_slot_is_exclusive() {
    let mut rig = rig();
    let pattern = square_run(2);
    let mut capture = AudioCapture::new();

    let mut first = capture
        .start(&pattern, &rig.chain, &mut rig.scheduler, &mut rig.device, 1, 120.0)
        .unwrap();
    let second = capture.start(&pattern, &rig.chain, &mut rig.scheduler, &mut rig.device, 1, 120.0);
    assert!(matches!(second, Err(ExportError::Core(Error::CaptureAlreadyActive))));
    // The refused start issued no voices
    assert_eq!(rig.scheduler.active_voices(), 2);

    rig.device.advance(0.5);
    assert!(capture.poll(&mut rig.device));
    assert!(first.take_result().unwrap().is_ok());
    assert!(capture
        .start(&pattern, &rig.chain, &mut rig.scheduler, &mut rig.device, 1, 120.0)
        .is_ok());
}

#[test]
fn test_note_file_matches_scheduled_voices() {
    let mut rig = rig();
    let config = SequencerConfig::new(90, "E", 2);
    let pattern = generated(&config, 3);
    let bpm = config.bpm as f64;

    let report = rig.scheduler.schedule(&pattern, &rig.chain, &mut rig.device, bpm);
    let artifact = export_notes(&pattern, bpm, &FixedPitch::default()).unwrap();
    let track = NoteTrack::parse(artifact.bytes()).unwrap();

    assert_eq!(track.notes.len(), report.scheduled());
    assert_relative_eq!(track.bpm, 90.0, epsilon = 1e-3);
    for (note, handle) in track.notes.iter().zip(&report.voices) {
        let voice = rig.scheduler.voice(*handle).unwrap();
        let tick = 60.0 / bpm / 480.0;
        assert_relative_eq!(note.time, voice.start - report.anchor, epsilon = tick);
        assert_relative_eq!(note.duration, voice.stop - voice.start, epsilon = tick);
        assert_eq!(note.pitch, 60);
    }
}

#[test]
fn test_note_file_written_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let config = SequencerConfig::new(120, "A", 1);
    let pattern = generated(&config, 5);

    let path = export_notes(&pattern, 120.0, &ScaleWalk::default())
        .unwrap()
        .write_to_dir(dir.path())
        .unwrap();
    assert_eq!(path.file_name().unwrap(), "sequence.mid");

    let track = NoteTrack::parse(&std::fs::read(&path).unwrap()).unwrap();
    // One bar at 120 bpm is four notes: A4 B4 C#5 D5
    let pitches: Vec<u8> = track.notes.iter().map(|n| n.pitch).collect();
    assert_eq!(pitches, vec![69, 71, 73, 74]);
}

#[test]
fn test_symbolic_export_needs_no_device() {
    let pattern = square_run(3);
    let first = export_notes(&pattern, 120.0, &FixedPitch(64)).unwrap();
    let second = export_notes(&pattern, 120.0, &FixedPitch(64)).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.mime_type(), "audio/midi");

    let device = motif_offline::OfflineDevice::new(TEST_SAMPLE_RATE);
    assert_eq!(device.current_time(), 0.0);
}
