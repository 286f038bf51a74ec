use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::alignment::validation::validate_alignment;
use crate::config::EditPointConfig;
use crate::editing::renderer::render_triplet;
use crate::error::EditPointError;
use crate::pipeline::traits::{ClipSink, CutSynthesizer, EditPointSelector, WaveformAccess};
use crate::types::{
    CutTriplet, DroppedCandidate, EditCandidate, UtteranceAlignment, UtteranceOutput,
};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

pub struct EditPointEngine {
    config: EditPointConfig,
    selector: Box<dyn EditPointSelector>,
    synthesizer: Box<dyn CutSynthesizer>,
    clip_sink: Box<dyn ClipSink>,
}

pub(crate) struct EditPointEngineParts {
    pub config: EditPointConfig,
    pub selector: Box<dyn EditPointSelector>,
    pub synthesizer: Box<dyn CutSynthesizer>,
    pub clip_sink: Box<dyn ClipSink>,
}

/// Cut geometry for one utterance, before anything is rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtterancePlan {
    pub triplets: Vec<CutTriplet>,
    pub dropped: Vec<DroppedCandidate>,
}

impl EditPointEngine {
    pub(crate) fn from_parts(parts: EditPointEngineParts) -> Self {
        Self {
            config: parts.config,
            selector: parts.selector,
            synthesizer: parts.synthesizer,
            clip_sink: parts.clip_sink,
        }
    }

    pub fn config(&self) -> &EditPointConfig {
        &self.config
    }

    /// Selects candidates and computes their cut triplets without writing
    /// audio. Candidates whose geometry cannot be satisfied are reported in
    /// `dropped`.
    pub fn plan_utterance(
        &self,
        alignment: &UtteranceAlignment,
        waveform: &dyn WaveformAccess,
    ) -> Result<UtterancePlan, EditPointError> {
        let mut plan = UtterancePlan::default();
        for (candidate, outcome) in self.run_candidates(alignment, waveform, |candidate, rng| {
            self.synthesizer
                .synthesize(candidate, waveform, &self.config, rng)
        })? {
            match outcome {
                Ok(triplet) => plan.triplets.push(triplet),
                Err(err) => plan
                    .dropped
                    .push(self.drop_candidate(&alignment.utterance_id, candidate, err)?),
            }
        }
        Ok(plan)
    }

    /// Full pass over one utterance: select, synthesize, render. Returns three
    /// records per surviving candidate in candidate order.
    pub fn process_utterance(
        &self,
        alignment: &UtteranceAlignment,
        waveform: &dyn WaveformAccess,
    ) -> Result<UtteranceOutput, EditPointError> {
        let utterance_id = alignment.utterance_id.as_str();
        let outcomes = self.run_candidates(alignment, waveform, |candidate, rng| {
            let triplet = self
                .synthesizer
                .synthesize(candidate, waveform, &self.config, rng)?;
            render_triplet(
                utterance_id,
                &triplet,
                waveform,
                &self.config.clip_format,
                self.clip_sink.as_ref(),
            )
        })?;

        let candidate_count = outcomes.len();
        let mut output = UtteranceOutput::default();
        for (candidate, outcome) in outcomes {
            match outcome {
                Ok(records) => output.records.extend(records),
                Err(err) => output
                    .dropped
                    .push(self.drop_candidate(utterance_id, candidate, err)?),
            }
        }

        tracing::info!(
            utterance_id,
            candidates = candidate_count,
            clips = output.records.len(),
            dropped = output.dropped.len(),
            "processed utterance"
        );
        Ok(output)
    }

    fn drop_candidate(
        &self,
        utterance_id: &str,
        candidate_index: usize,
        err: EditPointError,
    ) -> Result<DroppedCandidate, EditPointError> {
        if !err.is_candidate_scoped() {
            return Err(err);
        }
        tracing::warn!(
            utterance_id,
            candidate = candidate_index,
            error = %err,
            "dropping edit candidate"
        );
        Ok(DroppedCandidate {
            utterance_id: utterance_id.to_string(),
            candidate_index,
            reason: err.to_string(),
        })
    }

    /// Validates the utterance, selects candidates, and runs `job` once per
    /// candidate with its own generator. Seeds are drawn up front in
    /// candidate order so results do not depend on `worker_threads`.
    fn run_candidates<T, F>(
        &self,
        alignment: &UtteranceAlignment,
        waveform: &dyn WaveformAccess,
        job: F,
    ) -> Result<Vec<(usize, Result<T, EditPointError>)>, EditPointError>
    where
        T: Send,
        F: Fn(&EditCandidate<'_>, &mut StdRng) -> Result<T, EditPointError> + Sync,
    {
        validate_alignment(
            alignment,
            waveform.len(),
            waveform.sample_rate_hz(),
            self.config.phoneme_tolerance_samples,
        )?;

        let candidates = self.selector.select(&alignment.words, &self.config);
        let mut utterance_rng =
            StdRng::seed_from_u64(utterance_seed(self.config.random_seed, &alignment.utterance_id));
        let seeds: Vec<u64> = candidates.iter().map(|_| utterance_rng.gen()).collect();

        let run_one = |candidate: &EditCandidate<'_>, seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            (candidate.index, job(candidate, &mut rng))
        };

        let workers = self.config.worker_threads.min(candidates.len());
        if workers <= 1 {
            return Ok(candidates
                .iter()
                .zip(&seeds)
                .map(|(candidate, &seed)| run_one(candidate, seed))
                .collect());
        }

        let chunk_len = candidates.len().div_ceil(workers);
        tracing::debug!(
            utterance_id = alignment.utterance_id.as_str(),
            candidates = candidates.len(),
            workers,
            "synthesizing candidates in parallel"
        );
        let results: Vec<(usize, Result<T, EditPointError>)> = std::thread::scope(|scope| {
            let handles: Vec<_> = candidates
                .chunks(chunk_len)
                .zip(seeds.chunks(chunk_len))
                .map(|(chunk, chunk_seeds)| {
                    let run_one = &run_one;
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .zip(chunk_seeds)
                            .map(|(candidate, &seed)| run_one(candidate, seed))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
                })
                .collect()
        });
        Ok(results)
    }
}

/// Stable per-utterance seed: FNV-1a of the id mixed into the configured seed.
pub(crate) fn utterance_seed(random_seed: u64, utterance_id: &str) -> u64 {
    let hash = utterance_id
        .bytes()
        .fold(FNV_OFFSET_BASIS, |hash, byte| {
            (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
        });
    random_seed ^ hash
}
