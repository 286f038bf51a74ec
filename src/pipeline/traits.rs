use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::rngs::StdRng;

use crate::audio::waveform::AudioBuffer;
use crate::config::EditPointConfig;
use crate::error::EditPointError;
use crate::types::{AlignedWord, CutSpec, CutTriplet, EditCandidate};

/// Read-only view over one utterance's decoded audio.
pub trait WaveformAccess: Send + Sync {
    fn sample_rate_hz(&self) -> u32;

    /// Number of sample frames (per channel).
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn channel_count(&self) -> usize;

    /// Mono analysis amplitude at `index`.
    fn sample_at(&self, index: usize) -> Result<f32, EditPointError>;

    /// Copies `[start, end)` across all channels.
    fn slice(&self, start: usize, end: usize) -> Result<AudioBuffer, EditPointError>;

    /// Mono track used for zero-crossing search.
    fn analysis_samples(&self) -> &[f32];
}

pub trait EditPointSelector: Send + Sync {
    fn select<'a>(
        &self,
        words: &'a [AlignedWord],
        config: &EditPointConfig,
    ) -> Vec<EditCandidate<'a>>;
}

pub trait CutSynthesizer: Send + Sync {
    fn synthesize(
        &self,
        candidate: &EditCandidate<'_>,
        waveform: &dyn WaveformAccess,
        config: &EditPointConfig,
        rng: &mut StdRng,
    ) -> Result<CutTriplet, EditPointError>;
}

/// Everything a sink needs to persist one rendered clip.
pub struct ClipRequest<'a> {
    pub utterance_id: &'a str,
    pub candidate_index: usize,
    pub spec: &'a CutSpec,
    pub audio: &'a AudioBuffer,
}

pub trait ClipSink: Send + Sync {
    /// Persists a clip and returns where it landed, if the sink has locations.
    fn write_clip(&self, request: &ClipRequest<'_>) -> Result<Option<PathBuf>, EditPointError>;

    /// Removes a clip written earlier, when a later clip of the same triplet
    /// failed. `location` is whatever `write_clip` returned for it.
    fn discard_clip(
        &self,
        _request: &ClipRequest<'_>,
        _location: Option<&Path>,
    ) -> Result<(), EditPointError> {
        Ok(())
    }
}

impl<S: ClipSink + ?Sized> ClipSink for Arc<S> {
    fn write_clip(&self, request: &ClipRequest<'_>) -> Result<Option<PathBuf>, EditPointError> {
        (**self).write_clip(request)
    }

    fn discard_clip(
        &self,
        request: &ClipRequest<'_>,
        location: Option<&Path>,
    ) -> Result<(), EditPointError> {
        (**self).discard_clip(request, location)
    }
}
