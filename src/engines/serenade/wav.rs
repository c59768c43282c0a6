//! WAV container encoding.
//!
//! Songs are stored as 16-bit PCM mono, the most widely playable WAV flavour.

use std::io::Cursor;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::error::SynthesisError;

pub const CHANNELS: u16 = 1;
pub const BITS_PER_SAMPLE: u16 = 16;
pub const MIME_TYPE: &str = "audio/wav";

/// Most samples a RIFF container can describe (32-bit chunk sizes, with
/// room for the header).
pub const MAX_PCM_SAMPLES: usize = (u32::MAX as usize - 64) / (BITS_PER_SAMPLE as usize / 8);

fn spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: CHANNELS,
        sample_rate,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    }
}

/// Convert `-1.0..=1.0` samples to `i16`, clamping out-of-range input.
pub fn to_pcm_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect()
}

/// Encode samples into a complete in-memory WAV file.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, SynthesisError> {
    if samples.len() > MAX_PCM_SAMPLES {
        return Err(SynthesisError::BufferTooLarge {
            samples: samples.len(),
        });
    }

    let mut cursor = Cursor::new(Vec::with_capacity(64 + samples.len() * 2));
    {
        let mut writer = WavWriter::new(&mut cursor, spec(sample_rate))?;
        for sample in to_pcm_i16(samples) {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// Encode samples straight to a WAV file on disk.
pub fn write_wav(samples: &[f32], sample_rate: u32, path: &Path) -> Result<(), SynthesisError> {
    if samples.len() > MAX_PCM_SAMPLES {
        return Err(SynthesisError::BufferTooLarge {
            samples: samples.len(),
        });
    }

    let mut writer = WavWriter::create(path, spec(sample_rate))?;
    for sample in to_pcm_i16(samples) {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}
