use std::path::Path;

use crate::audio::types::AudioBuffer;
use crate::error::{OutputError, Result};

/// Writes buffers as WAV files through hound
///
/// A write acquires the destination, streams every sample once and finalizes
/// the header. Partial files left by a failed write are not cleaned up.
pub struct AudioWriter {
    bits_per_sample: u16,
}

impl AudioWriter {
    /// `bits_per_sample` is 16 or 24 for integer PCM, 32 for float
    pub fn new(bits_per_sample: u16) -> Self {
        Self { bits_per_sample }
    }

    pub fn write<P: AsRef<Path>>(&self, buffer: &AudioBuffer, path: P) -> Result<()> {
        let path = path.as_ref();
        let write_failed = |reason: String| OutputError::WriteFailure {
            path: path.display().to_string(),
            reason,
        };

        let spec = hound::WavSpec {
            channels: buffer.channels(),
            sample_rate: buffer.sample_rate(),
            bits_per_sample: self.bits_per_sample,
            sample_format: if self.bits_per_sample == 32 {
                hound::SampleFormat::Float
            } else {
                hound::SampleFormat::Int
            },
        };

        let mut writer = hound::WavWriter::create(path, spec).map_err(|e| write_failed(e.to_string()))?;

        for &sample in buffer.samples() {
            let sample = sample.clamp(-1.0, 1.0);
            let result = match self.bits_per_sample {
                32 => writer.write_sample(sample),
                24 => writer.write_sample((sample * 8_388_607.0).round() as i32),
                _ => writer.write_sample((sample * 32_767.0).round() as i16),
            };
            result.map_err(|e| write_failed(e.to_string()))?;
        }

        writer.finalize().map_err(|e| write_failed(e.to_string()))?;
        tracing::debug!("Wrote {} frames to {:?}", buffer.frames(), path);
        Ok(())
    }
}

impl Default for AudioWriter {
    fn default() -> Self {
        Self::new(16)
    }
}
