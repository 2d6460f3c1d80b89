use rayon::prelude::*;

use crate::audio::AudioBuffer;
use crate::error::{AudioError, Result};

/// A mono click waveform and the weight it is mixed at
#[derive(Debug, Clone)]
pub struct ClickLayer {
    pub waveform: Vec<f32>,
    pub weight: f32,
}

impl ClickLayer {
    pub fn new(waveform: Vec<f32>, weight: f32) -> Self {
        Self { waveform, weight }
    }
}

/// Overlays mono click layers onto a source buffer of any channel count
pub struct ChannelMixer;

impl ChannelMixer {
    /// `source + Σ weight_i × click_i`, each click broadcast to every channel.
    ///
    /// Every layer must have exactly as many samples as the source has frames.
    pub fn mix(source: &AudioBuffer, layers: &[ClickLayer]) -> Result<AudioBuffer> {
        let frames = source.frames();
        if let Some(layer) = layers.iter().find(|l| l.waveform.len() != frames) {
            return Err(AudioError::LengthMismatch {
                expected: frames,
                actual: layer.waveform.len(),
            }
            .into());
        }

        let channels = source.channels() as usize;
        let mut mixed = source.samples().to_vec();

        mixed
            .par_chunks_mut(channels)
            .enumerate()
            .for_each(|(frame, samples)| {
                let click: f32 = layers.iter().map(|l| l.weight * l.waveform[frame]).sum();
                if click != 0.0 {
                    for sample in samples.iter_mut() {
                        *sample += click;
                    }
                }
            });

        AudioBuffer::new(mixed, source.channels(), source.sample_rate())
    }
}
