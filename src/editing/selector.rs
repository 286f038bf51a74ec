use crate::config::EditPointConfig;
use crate::pipeline::traits::EditPointSelector;
use crate::types::{AlignedWord, EditCandidate, SilenceGap};

/// Picks silent gaps between consecutive words of the same chunk.
pub struct GapSelector;

impl EditPointSelector for GapSelector {
    fn select<'a>(
        &self,
        words: &'a [AlignedWord],
        config: &EditPointConfig,
    ) -> Vec<EditCandidate<'a>> {
        let mut candidates: Vec<EditCandidate<'a>> = words
            .windows(2)
            .enumerate()
            .filter_map(|(word_index, pair)| {
                let (prev, next) = (&pair[0], &pair[1]);
                if prev.chunk_id != next.chunk_id {
                    return None;
                }
                if config.skip_flagged_chunks
                    && (prev.chunk_flags.any() || next.chunk_flags.any())
                {
                    return None;
                }
                let gap = SilenceGap {
                    start_sample: prev.end_sample,
                    end_sample: next.start_sample,
                };
                let gap_duration_samples = gap.duration_samples();
                if gap_duration_samples < config.min_gap_duration_samples {
                    return None;
                }
                Some(EditCandidate {
                    index: 0,
                    word_index,
                    gap,
                    preceding_word: prev,
                    following_word: next,
                    gap_duration_samples,
                })
            })
            .collect();

        if let Some(max) = config.max_candidates_per_utterance {
            if candidates.len() > max {
                tracing::debug!(
                    eligible = candidates.len(),
                    kept = max,
                    "truncating edit candidates to the largest gaps"
                );
                candidates.sort_by(|a, b| {
                    b.gap_duration_samples
                        .cmp(&a.gap_duration_samples)
                        .then(a.gap.start_sample.cmp(&b.gap.start_sample))
                });
                candidates.truncate(max);
                candidates.sort_by_key(|c| c.gap.start_sample);
            }
        }

        for (index, candidate) in candidates.iter_mut().enumerate() {
            candidate.index = index;
        }
        candidates
    }
}
