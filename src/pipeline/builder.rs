use std::path::PathBuf;

use crate::config::EditPointConfig;
use crate::error::EditPointError;
use crate::pipeline::defaults::{GapSelector, MemoryClipSink, MidpointInvasionSynthesizer, WavClipSink, WavEncoding};
use crate::pipeline::runtime::{EditPointEngine, EditPointEngineParts};
use crate::pipeline::traits::{ClipSink, CutSynthesizer, EditPointSelector};

pub struct EditPointEngineBuilder {
    config: EditPointConfig,
    selector: Option<Box<dyn EditPointSelector>>,
    synthesizer: Option<Box<dyn CutSynthesizer>>,
    clip_sink: Option<Box<dyn ClipSink>>,
}

impl EditPointEngineBuilder {
    pub fn new(config: EditPointConfig) -> Self {
        Self {
            config,
            selector: None,
            synthesizer: None,
            clip_sink: None,
        }
    }

    pub fn with_selector(mut self, selector: Box<dyn EditPointSelector>) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: Box<dyn CutSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    pub fn with_clip_sink(mut self, clip_sink: Box<dyn ClipSink>) -> Self {
        self.clip_sink = Some(clip_sink);
        self
    }

    /// Shorthand for a [`WavClipSink`] rooted at `output_dir`.
    pub fn with_wav_output(self, output_dir: impl Into<PathBuf>, encoding: WavEncoding) -> Self {
        self.with_clip_sink(Box::new(WavClipSink::new(output_dir, encoding)))
    }

    /// Without an explicit sink, clips are kept in an in-memory sink.
    pub fn build(self) -> Result<EditPointEngine, EditPointError> {
        self.config.validate()?;
        Ok(EditPointEngine::from_parts(EditPointEngineParts {
            config: self.config,
            selector: self.selector.unwrap_or_else(|| Box::new(GapSelector)),
            synthesizer: self
                .synthesizer
                .unwrap_or_else(|| Box::new(MidpointInvasionSynthesizer)),
            clip_sink: self
                .clip_sink
                .unwrap_or_else(|| Box::new(MemoryClipSink::new())),
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use rand::rngs::StdRng;

    use crate::audio::waveform::Waveform;
    use crate::pipeline::traits::{ClipRequest, WaveformAccess};
    use crate::types::{AlignedWord, ChunkFlags, CutTriplet, EditCandidate, UtteranceAlignment};

    use super::*;

    struct MockSynthesizer {
        fail_candidate: usize,
    }

    impl CutSynthesizer for MockSynthesizer {
        fn synthesize(
            &self,
            candidate: &EditCandidate<'_>,
            waveform: &dyn WaveformAccess,
            config: &EditPointConfig,
            rng: &mut StdRng,
        ) -> Result<CutTriplet, EditPointError> {
            if candidate.index == self.fail_candidate {
                return Err(EditPointError::geometry("mock geometry failure"));
            }
            MidpointInvasionSynthesizer.synthesize(candidate, waveform, config, rng)
        }
    }

    struct FailingSink;

    impl ClipSink for FailingSink {
        fn write_clip(&self, request: &ClipRequest<'_>) -> Result<Option<PathBuf>, EditPointError> {
            Err(EditPointError::write_failure(
                request.utterance_id,
                "disk full",
            ))
        }
    }

    struct FatalSink;

    impl ClipSink for FatalSink {
        fn write_clip(&self, _request: &ClipRequest<'_>) -> Result<Option<PathBuf>, EditPointError> {
            Err(EditPointError::invalid_config("sink misconfigured"))
        }
    }

    fn word(start: usize, end: usize) -> AlignedWord {
        AlignedWord {
            text: format!("w{start}"),
            start_sample: start,
            end_sample: end,
            chunk_id: 0,
            chunk_flags: ChunkFlags::default(),
            phonemes: Vec::new(),
        }
    }

    fn fixture() -> (UtteranceAlignment, Waveform) {
        let alignment = UtteranceAlignment {
            utterance_id: "utt".to_string(),
            sample_rate_hz: 16_000,
            words: vec![
                word(1_000, 4_000),
                word(8_000, 11_000),
                word(15_000, 18_000),
            ],
        };
        (alignment, Waveform::from_mono(16_000, vec![0.0; 20_000]))
    }

    #[test]
    fn build_rejects_invalid_config() {
        let config = EditPointConfig {
            worker_threads: 0,
            ..EditPointConfig::default()
        };
        assert!(matches!(
            EditPointEngineBuilder::new(config).build(),
            Err(EditPointError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn defaults_render_every_candidate() {
        let sink = Arc::new(MemoryClipSink::new());
        let engine = EditPointEngineBuilder::new(EditPointConfig::default())
            .with_clip_sink(Box::new(Arc::clone(&sink)))
            .build()
            .expect("build engine");
        let (alignment, waveform) = fixture();
        let output = engine.process_utterance(&alignment, &waveform).expect("process");
        assert_eq!(output.records.len(), 6);
        assert!(output.dropped.is_empty());
        assert_eq!(sink.len(), 6);
    }

    #[test]
    fn geometry_failure_drops_only_that_candidate() {
        let engine = EditPointEngineBuilder::new(EditPointConfig::default())
            .with_synthesizer(Box::new(MockSynthesizer { fail_candidate: 0 }))
            .build()
            .expect("build engine");
        let (alignment, waveform) = fixture();
        let output = engine.process_utterance(&alignment, &waveform).expect("process");
        assert_eq!(output.dropped.len(), 1);
        assert_eq!(output.dropped[0].candidate_index, 0);
        assert!(output.records.iter().all(|r| r.candidate_index == 1));
    }

    #[test]
    fn write_failures_are_reported_not_fatal() {
        let engine = EditPointEngineBuilder::new(EditPointConfig::default())
            .with_clip_sink(Box::new(FailingSink))
            .build()
            .expect("build engine");
        let (alignment, waveform) = fixture();
        let output = engine.process_utterance(&alignment, &waveform).expect("process");
        assert!(output.records.is_empty());
        assert_eq!(output.dropped.len(), 2);
        assert!(output.dropped[0].reason.contains("disk full"));
    }

    #[test]
    fn non_candidate_errors_abort_the_utterance() {
        let engine = EditPointEngineBuilder::new(EditPointConfig::default())
            .with_clip_sink(Box::new(FatalSink))
            .build()
            .expect("build engine");
        let (alignment, waveform) = fixture();
        assert!(engine.process_utterance(&alignment, &waveform).is_err());
    }

    #[test]
    fn invalid_alignment_aborts_before_selection() {
        let engine = EditPointEngineBuilder::new(EditPointConfig::default())
            .build()
            .expect("build engine");
        let (mut alignment, waveform) = fixture();
        alignment.sample_rate_hz = 22_050;
        assert!(matches!(
            engine.plan_utterance(&alignment, &waveform),
            Err(EditPointError::InvalidInput { .. })
        ));
    }

    #[test]
    fn wav_output_shorthand_writes_files() {
        let dir = tempfile::tempdir().expect("create tempdir");
        let engine = EditPointEngineBuilder::new(EditPointConfig::default())
            .with_wav_output(dir.path(), WavEncoding::Pcm16)
            .build()
            .expect("build engine");
        let (alignment, waveform) = fixture();
        let output = engine.process_utterance(&alignment, &waveform).expect("process");
        for record in &output.records {
            let path = PathBuf::from(record.clip_path.as_deref().expect("clip path"));
            assert!(path.exists(), "missing {}", path.display());
        }
    }
}
