//! WAV encoder using hound
//!
//! Encodes captured device audio as 16-bit, 24-bit or 32-bit float PCM.

use crate::error::{ExportError, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use motif_core::CapturedAudio;
use std::io::{Cursor, Seek, Write};

/// Output sample format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitDepth {
    #[default]
    Int16,
    Int24,
    Float32,
}

impl BitDepth {
    /// Bits per sample.
    pub fn bits(&self) -> u16 {
        match self {
            BitDepth::Int16 => 16,
            BitDepth::Int24 => 24,
            BitDepth::Float32 => 32,
        }
    }
}

/// WAV encoder configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of interleaved channels
    pub channels: u16,
    pub bit_depth: BitDepth,
}

impl WavConfig {
    /// Config matching a capture's layout.
    pub fn for_capture(audio: &CapturedAudio, bit_depth: BitDepth) -> Self {
        Self {
            sample_rate: audio.sample_rate,
            channels: audio.channels,
            bit_depth,
        }
    }

    fn spec(&self) -> WavSpec {
        WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: self.bit_depth.bits(),
            sample_format: match self.bit_depth {
                BitDepth::Float32 => SampleFormat::Float,
                _ => SampleFormat::Int,
            },
        }
    }
}

/// Encode a capture to WAV bytes.
pub fn encode_captured(audio: &CapturedAudio, bit_depth: BitDepth) -> Result<Vec<u8>> {
    encode_wav_memory(&audio.samples, &WavConfig::for_capture(audio, bit_depth))
}

/// Encode interleaved samples to WAV in memory
///
/// # Arguments
/// * `samples` - Interleaved samples (normalized -1.0 to 1.0)
/// * `config` - WAV configuration
pub fn encode_wav_memory(samples: &[f32], config: &WavConfig) -> Result<Vec<u8>> {
    if config.channels == 0 || config.sample_rate == 0 {
        return Err(ExportError::InvalidData(format!(
            "{} channels at {} Hz",
            config.channels, config.sample_rate
        )));
    }
    if samples.len() % config.channels as usize != 0 {
        return Err(ExportError::InvalidData(
            "Sample count is not a multiple of the channel count".into(),
        ));
    }

    let mut buffer = Vec::new();
    {
        let cursor = Cursor::new(&mut buffer);
        let mut writer = WavWriter::new(cursor, config.spec())?;

        write_samples(&mut writer, samples, config.bit_depth)?;

        // Finalize writes the header lengths
        writer.finalize()?;
    }

    Ok(buffer)
}

/// Decode WAV bytes back into normalized `f32` samples.
pub fn decode_wav_memory(bytes: &[u8]) -> Result<CapturedAudio> {
    let reader = WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();

    let samples = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, _) => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        (SampleFormat::Int, bits) => {
            let scale = ((1i64 << (bits - 1)) - 1) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    Ok(CapturedAudio {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        samples,
    })
}

fn write_samples<W: Write + Seek>(
    writer: &mut WavWriter<W>,
    samples: &[f32],
    bit_depth: BitDepth,
) -> Result<()> {
    match bit_depth {
        BitDepth::Int16 => {
            for &sample in samples {
                writer.write_sample(float_to_i16(sample))?;
            }
        }
        BitDepth::Int24 => {
            for &sample in samples {
                writer.write_sample(float_to_i24(sample))?;
            }
        }
        BitDepth::Float32 => {
            for &sample in samples {
                writer.write_sample(sample)?;
            }
        }
    }
    Ok(())
}

/// Convert float sample to 16-bit integer with clipping
#[inline]
fn float_to_i16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    (clamped * 32767.0) as i16
}

/// Convert float sample to 24-bit integer (stored as i32) with clipping
#[inline]
fn float_to_i24(sample: f32) -> i32 {
    let clamped = sample.clamp(-1.0, 1.0);
    (clamped * 8388607.0) as i32
}
