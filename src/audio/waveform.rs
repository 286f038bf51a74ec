use std::path::Path;

use claxon::FlacReader;
use hound::{SampleFormat, WavReader};

use crate::error::EditPointError;
use crate::pipeline::traits::WaveformAccess;

/// Planar multi-channel PCM, samples normalized to [-1, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub sample_rate_hz: u32,
    pub channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    pub fn frames(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn interleaved(&self) -> Vec<f32> {
        let frames = self.frames();
        let mut out = Vec::with_capacity(frames * self.channels.len());
        for frame in 0..frames {
            for channel in &self.channels {
                out.push(channel[frame]);
            }
        }
        out
    }
}

/// Decoded utterance audio. The mono analysis track (channel mean) is derived
/// once at construction and reused by every candidate.
#[derive(Debug, Clone)]
pub struct Waveform {
    sample_rate_hz: u32,
    channels: Vec<Vec<f32>>,
    analysis: Vec<f32>,
}

impl Waveform {
    pub fn from_mono(sample_rate_hz: u32, samples: Vec<f32>) -> Self {
        Self {
            sample_rate_hz,
            analysis: samples.clone(),
            channels: vec![samples],
        }
    }

    pub fn from_channels(
        sample_rate_hz: u32,
        channels: Vec<Vec<f32>>,
    ) -> Result<Self, EditPointError> {
        let Some(first) = channels.first() else {
            return Err(EditPointError::invalid_input("waveform has zero channels"));
        };
        let frames = first.len();
        if channels.iter().any(|c| c.len() != frames) {
            return Err(EditPointError::invalid_input(
                "waveform channels have different lengths",
            ));
        }
        if channels.len() == 1 {
            return Ok(Self::from_mono(
                sample_rate_hz,
                channels.into_iter().next().unwrap_or_default(),
            ));
        }

        let scale = 1.0 / channels.len() as f32;
        let analysis = (0..frames)
            .map(|frame| channels.iter().map(|c| c[frame]).sum::<f32>() * scale)
            .collect();
        Ok(Self {
            sample_rate_hz,
            channels,
            analysis,
        })
    }

    pub fn from_interleaved(
        sample_rate_hz: u32,
        channel_count: usize,
        interleaved: &[f32],
    ) -> Result<Self, EditPointError> {
        if channel_count == 0 {
            return Err(EditPointError::invalid_input("waveform has zero channels"));
        }
        if interleaved.len() % channel_count != 0 {
            return Err(EditPointError::invalid_input(format!(
                "interleaved buffer of {} samples is not a multiple of {channel_count} channels",
                interleaved.len()
            )));
        }
        let frames = interleaved.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in interleaved.chunks_exact(channel_count) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }
        Self::from_channels(sample_rate_hz, channels)
    }

    /// Loads a `.wav` or `.flac` file, chosen by extension.
    pub fn load(path: &Path) -> Result<Self, EditPointError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("wav") | Some("wave") => Self::from_wav_file(path),
            Some("flac") => Self::from_flac_file(path),
            _ => Err(EditPointError::audio_decode(
                path.display().to_string(),
                "unsupported audio container (expected .wav or .flac)",
            )),
        }
    }

    pub fn from_wav_file(path: &Path) -> Result<Self, EditPointError> {
        let display = path.display().to_string();
        let reader = WavReader::open(path).map_err(|e| EditPointError::audio_decode(&display, e))?;
        let spec = reader.spec();
        let channel_count = spec.channels as usize;

        let interleaved = match spec.sample_format {
            SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| EditPointError::audio_decode(&display, e))?,
            SampleFormat::Int => {
                let scale = int_scale(spec.bits_per_sample as i32);
                reader
                    .into_samples::<i32>()
                    .map(|sample| sample.map(|s| s as f32 / scale))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| EditPointError::audio_decode(&display, e))?
            }
        };
        Self::from_interleaved(spec.sample_rate, channel_count, &interleaved)
    }

    pub fn from_flac_file(path: &Path) -> Result<Self, EditPointError> {
        let display = path.display().to_string();
        let mut reader =
            FlacReader::open(path).map_err(|e| EditPointError::audio_decode(&display, e))?;
        let streaminfo = reader.streaminfo();
        let channel_count = streaminfo.channels as usize;
        let scale = int_scale(streaminfo.bits_per_sample as i32);
        let sample_rate_hz = streaminfo.sample_rate;

        let mut interleaved = Vec::new();
        for sample in reader.samples() {
            let sample = sample.map_err(|e| EditPointError::audio_decode(&display, e))?;
            interleaved.push(sample as f32 / scale);
        }
        Self::from_interleaved(sample_rate_hz, channel_count, &interleaved)
    }
}

fn int_scale(bits_per_sample: i32) -> f32 {
    if bits_per_sample > 1 {
        ((1_i64 << (bits_per_sample - 1)) - 1) as f32
    } else {
        1.0
    }
}

impl WaveformAccess for Waveform {
    fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    fn len(&self) -> usize {
        self.analysis.len()
    }

    fn channel_count(&self) -> usize {
        self.channels.len()
    }

    fn sample_at(&self, index: usize) -> Result<f32, EditPointError> {
        self.analysis
            .get(index)
            .copied()
            .ok_or(EditPointError::OutOfRange {
                index,
                len: self.analysis.len(),
            })
    }

    fn slice(&self, start: usize, end: usize) -> Result<AudioBuffer, EditPointError> {
        let len = self.analysis.len();
        if start >= end || end > len {
            return Err(EditPointError::InvalidRange { start, end, len });
        }
        Ok(AudioBuffer {
            sample_rate_hz: self.sample_rate_hz,
            channels: self
                .channels
                .iter()
                .map(|channel| channel[start..end].to_vec())
                .collect(),
        })
    }

    fn analysis_samples(&self) -> &[f32] {
        &self.analysis
    }
}
