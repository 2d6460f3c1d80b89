use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::audio::types::{AudioBuffer, AudioFile, FileMetadata};
use crate::error::{AudioError, ClicktrackError, Result};

/// Extensions accepted as analysis input
pub const AUDIO_EXTENSIONS: [&str; 6] = ["wav", "mp3", "flac", "ogg", "m4a", "aac"];

/// Decodes audio files into [`AudioBuffer`]s
pub struct AudioLoader;

impl AudioLoader {
    /// Decode a file on a blocking worker thread
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<AudioFile> {
        let path = path.as_ref().to_path_buf();
        let display = path.display().to_string();

        tokio::task::spawn_blocking(move || Self::load_blocking(&path))
            .await
            .map_err(|_| ClicktrackError::from(AudioError::LoadFailed { path: display }))?
    }

    /// Decode a file on the current thread
    pub fn load_blocking<P: AsRef<Path>>(path: P) -> Result<AudioFile> {
        let path = path.as_ref();
        let extension = Self::detect_format(path).unwrap_or_default();

        if !Self::is_format_supported(&extension) {
            return Err(AudioError::UnsupportedFormat { format: extension }.into());
        }

        let size_bytes = std::fs::metadata(path)
            .map_err(|_| AudioError::LoadFailed {
                path: path.display().to_string(),
            })?
            .len();

        let (buffer, bit_depth, codec) = if extension == "wav" {
            Self::decode_wav(path)?
        } else {
            Self::decode_with_symphonia(path)?
        };

        tracing::debug!(
            "Decoded {:?}: {} frames, {} Hz, {} channels",
            path,
            buffer.frames(),
            buffer.sample_rate(),
            buffer.channels()
        );

        Ok(AudioFile {
            buffer,
            metadata: FileMetadata {
                path: path.to_path_buf(),
                file_name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                size_bytes,
                extension,
                bit_depth,
                codec,
            },
        })
    }

    /// WAV goes through hound, which handles every PCM layout we write ourselves
    fn decode_wav(path: &Path) -> Result<(AudioBuffer, Option<u16>, Option<String>)> {
        let load_failed = || AudioError::LoadFailed {
            path: path.display().to_string(),
        };

        let reader = hound::WavReader::open(path).map_err(|_| load_failed())?;
        let spec = reader.spec();

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|_| load_failed())?,
            hound::SampleFormat::Int => reader
                .into_samples::<i32>()
                .map(|s| s.map(|s| Self::int_to_float(s, spec.bits_per_sample)))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|_| load_failed())?,
        };

        let buffer = AudioBuffer::new(samples, spec.channels, spec.sample_rate)?;
        Ok((buffer, Some(spec.bits_per_sample), None))
    }

    /// Compressed formats go through Symphonia
    fn decode_with_symphonia(path: &Path) -> Result<(AudioBuffer, Option<u16>, Option<String>)> {
        let load_failed = || AudioError::LoadFailed {
            path: path.display().to_string(),
        };

        let file = File::open(path).map_err(|_| load_failed())?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(extension);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|_| load_failed())?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(load_failed)?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let sample_rate = codec_params.sample_rate.ok_or_else(|| AudioError::InvalidParameters {
            details: "No sample rate found".to_string(),
        })?;
        let channels = codec_params
            .channels
            .ok_or_else(|| AudioError::InvalidParameters {
                details: "No channel information found".to_string(),
            })?
            .count() as u16;

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|_| load_failed())?;

        let mut samples = Vec::new();
        let mut sample_buf: Option<SampleBuffer<f32>> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    continue;
                }
                // End of stream surfaces as an IO error
                Err(_) => break,
            };

            while !format.metadata().is_latest() {
                format.metadata().pop();
            }

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let buf = sample_buf.get_or_insert_with(|| {
                        SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec())
                    });
                    if buf.capacity() < decoded.capacity() * decoded.spec().channels.count() {
                        *buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
                    }
                    buf.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buf.samples());
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    tracing::debug!("Skipping undecodable packet: {}", e);
                    continue;
                }
                Err(_) => break,
            }
        }

        let bit_depth = codec_params.bits_per_sample.map(|b| b as u16);
        let codec = Some(format!("{:?}", codec_params.codec));
        let buffer = AudioBuffer::new(samples, channels, sample_rate)?;

        Ok((buffer, bit_depth, codec))
    }

    /// Convert integer sample to float (-1.0 to 1.0)
    fn int_to_float(sample: i32, bit_depth: u16) -> f32 {
        match bit_depth {
            8 => sample as f32 / 128.0,
            16 => sample as f32 / 32768.0,
            24 => sample as f32 / 8388608.0,
            32 => sample as f32 / 2147483648.0,
            _ => sample as f32 / 32768.0,
        }
    }

    /// Lower-case extension of a path
    pub fn detect_format<P: AsRef<Path>>(path: P) -> Option<String> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
    }

    /// Check if a file format is supported
    pub fn is_format_supported(extension: &str) -> bool {
        AUDIO_EXTENSIONS.contains(&extension.to_lowercase().as_str())
    }
}
