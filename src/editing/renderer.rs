use std::path::{Path, PathBuf};
use std::sync::Mutex;

use hound::{SampleFormat, WavSpec, WavWriter};
use serde::{Deserialize, Serialize};

use crate::audio::resample::resample_buffer;
use crate::audio::waveform::AudioBuffer;
use crate::config::ClipFormat;
use crate::error::EditPointError;
use crate::pipeline::traits::{ClipRequest, ClipSink, WaveformAccess};
use crate::types::{ClipRecord, CutSpec, CutTriplet, EditType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WavEncoding {
    #[default]
    Pcm16,
    Float32,
}

/// `<utterance_id>_<index:04>_<edit_type>.wav`
pub fn clip_file_name(utterance_id: &str, candidate_index: usize, edit_type: EditType) -> String {
    format!(
        "{}_{candidate_index:04}_{}.wav",
        path_component(utterance_id),
        edit_type.as_str()
    )
}

fn path_component(raw: &str) -> String {
    raw.chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect()
}

/// Writes each clip to `<output_dir>/<utterance_id>/<file name>`.
pub struct WavClipSink {
    output_dir: PathBuf,
    encoding: WavEncoding,
}

impl WavClipSink {
    pub fn new(output_dir: impl Into<PathBuf>, encoding: WavEncoding) -> Self {
        Self {
            output_dir: output_dir.into(),
            encoding,
        }
    }

    pub fn clip_path(&self, utterance_id: &str, candidate_index: usize, edit_type: EditType) -> PathBuf {
        self.output_dir
            .join(path_component(utterance_id))
            .join(clip_file_name(utterance_id, candidate_index, edit_type))
    }

    fn write_wav(&self, path: &Path, audio: &AudioBuffer) -> Result<(), hound::Error> {
        let spec = WavSpec {
            channels: audio.channel_count() as u16,
            sample_rate: audio.sample_rate_hz,
            bits_per_sample: match self.encoding {
                WavEncoding::Pcm16 => 16,
                WavEncoding::Float32 => 32,
            },
            sample_format: match self.encoding {
                WavEncoding::Pcm16 => SampleFormat::Int,
                WavEncoding::Float32 => SampleFormat::Float,
            },
        };
        let mut writer = WavWriter::create(path, spec)?;
        match self.encoding {
            WavEncoding::Pcm16 => {
                for sample in audio.interleaved() {
                    let clamped = sample.clamp(-1.0, 1.0);
                    writer.write_sample((clamped * i16::MAX as f32) as i16)?;
                }
            }
            WavEncoding::Float32 => {
                for sample in audio.interleaved() {
                    writer.write_sample(sample)?;
                }
            }
        }
        writer.finalize()
    }
}

impl ClipSink for WavClipSink {
    fn write_clip(&self, request: &ClipRequest<'_>) -> Result<Option<PathBuf>, EditPointError> {
        let path = self.clip_path(
            request.utterance_id,
            request.candidate_index,
            request.spec.edit_type,
        );
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| EditPointError::write_failure(parent.display().to_string(), e))?;
        }
        if let Err(err) = self.write_wav(&path, request.audio) {
            // hound leaves a truncated file behind when a write fails midway.
            let _ = std::fs::remove_file(&path);
            return Err(EditPointError::write_failure(path.display().to_string(), err));
        }
        Ok(Some(path))
    }

    fn discard_clip(
        &self,
        request: &ClipRequest<'_>,
        location: Option<&Path>,
    ) -> Result<(), EditPointError> {
        let path = match location {
            Some(path) => path.to_path_buf(),
            None => self.clip_path(
                request.utterance_id,
                request.candidate_index,
                request.spec.edit_type,
            ),
        };
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(EditPointError::write_failure(path.display().to_string(), err)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedClip {
    pub utterance_id: String,
    pub candidate_index: usize,
    pub edit_type: EditType,
    pub audio: AudioBuffer,
}

/// Keeps rendered clips in memory instead of on disk.
#[derive(Default)]
pub struct MemoryClipSink {
    clips: Mutex<Vec<RenderedClip>>,
}

impl MemoryClipSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drains everything written so far.
    pub fn take(&self) -> Vec<RenderedClip> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<RenderedClip>> {
        self.clips
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ClipSink for MemoryClipSink {
    fn write_clip(&self, request: &ClipRequest<'_>) -> Result<Option<PathBuf>, EditPointError> {
        self.lock().push(RenderedClip {
            utterance_id: request.utterance_id.to_string(),
            candidate_index: request.candidate_index,
            edit_type: request.spec.edit_type,
            audio: request.audio.clone(),
        });
        Ok(None)
    }

    fn discard_clip(
        &self,
        request: &ClipRequest<'_>,
        _location: Option<&Path>,
    ) -> Result<(), EditPointError> {
        self.lock().retain(|clip| {
            !(clip.utterance_id == request.utterance_id
                && clip.candidate_index == request.candidate_index
                && clip.edit_type == request.spec.edit_type)
        });
        Ok(())
    }
}

/// Slices, converts and writes all three clips of a triplet. Any failure
/// invalidates the whole triplet: clips already written are discarded again
/// before the error is returned, and the caller decides whether to drop the
/// candidate.
pub fn render_triplet(
    utterance_id: &str,
    triplet: &CutTriplet,
    waveform: &dyn WaveformAccess,
    format: &ClipFormat,
    sink: &dyn ClipSink,
) -> Result<Vec<ClipRecord>, EditPointError> {
    let clips = triplet
        .specs()
        .into_iter()
        .map(|spec| Ok((spec, clip_audio(waveform, spec, format)?)))
        .collect::<Result<Vec<_>, EditPointError>>()?;

    let mut written: Vec<(ClipRequest<'_>, Option<PathBuf>)> = Vec::with_capacity(3);
    for (spec, audio) in &clips {
        let request = ClipRequest {
            utterance_id,
            candidate_index: triplet.candidate_index,
            spec,
            audio,
        };
        match sink.write_clip(&request) {
            Ok(location) => written.push((request, location)),
            Err(err) => {
                discard_written(sink, &written);
                return Err(err);
            }
        }
    }

    Ok(written
        .into_iter()
        .map(|(request, location)| {
            clip_record(
                utterance_id,
                triplet,
                request.spec,
                waveform.sample_rate_hz(),
                request.audio,
                location,
            )
        })
        .collect())
}

fn discard_written(sink: &dyn ClipSink, written: &[(ClipRequest<'_>, Option<PathBuf>)]) {
    for (request, location) in written {
        if let Err(err) = sink.discard_clip(request, location.as_deref()) {
            tracing::warn!(
                utterance_id = request.utterance_id,
                candidate = request.candidate_index,
                edit_type = request.spec.edit_type.as_str(),
                error = %err,
                "failed to discard clip of a dropped triplet"
            );
        }
    }
}

/// Mono output reuses the analysis track instead of downmixing again.
fn clip_audio(
    waveform: &dyn WaveformAccess,
    spec: &CutSpec,
    format: &ClipFormat,
) -> Result<AudioBuffer, EditPointError> {
    let mut audio = waveform.slice(spec.start_sample, spec.end_sample)?;
    if format.mono && audio.channel_count() > 1 {
        audio.channels =
            vec![waveform.analysis_samples()[spec.start_sample..spec.end_sample].to_vec()];
    }
    match format.sample_rate_hz {
        Some(rate) => resample_buffer(audio, rate),
        None => Ok(audio),
    }
}

fn clip_record(
    utterance_id: &str,
    triplet: &CutTriplet,
    spec: &CutSpec,
    sample_rate_hz: u32,
    audio: &AudioBuffer,
    clip_path: Option<PathBuf>,
) -> ClipRecord {
    ClipRecord {
        utterance_id: utterance_id.to_string(),
        candidate_index: triplet.candidate_index,
        edit_type: spec.edit_type,
        start_sample: spec.start_sample,
        end_sample: spec.end_sample,
        splice_sample: spec.splice_sample,
        invasion_samples: spec.invasion_samples,
        invaded_side: spec.invaded_side,
        gap_start_sample: spec.gap.start_sample,
        gap_end_sample: spec.gap.end_sample,
        gap_duration_samples: triplet.gap_duration_samples,
        snapped: spec.snapped,
        sample_rate_hz,
        clip_sample_rate_hz: audio.sample_rate_hz,
        clip_channels: audio.channel_count(),
        clip_path: clip_path.map(|p| p.display().to_string()),
    }
}
