use rand::rngs::StdRng;
use rand::Rng;

use crate::audio::zero_crossing::{SearchDirection, ZeroCrossingLocator};
use crate::config::{EditPointConfig, InvadedSide};
use crate::error::EditPointError;
use crate::pipeline::traits::{CutSynthesizer, WaveformAccess};
use crate::types::{
    AlignedWord, BoundarySide, CutSpec, CutTriplet, EditCandidate, EditType, SilenceGap,
};

/// Natural cuts splice at the gap midpoint; unnatural cuts push into the
/// adjacent word by a random share of its boundary phoneme, stopping at that
/// phoneme's midpoint.
///
/// The natural clip keeps the half-context on the side of the splice facing
/// away from the invaded word, and the unnatural clip the half-context facing
/// into it, so the two never share samples.
pub struct MidpointInvasionSynthesizer;

impl CutSynthesizer for MidpointInvasionSynthesizer {
    fn synthesize(
        &self,
        candidate: &EditCandidate<'_>,
        waveform: &dyn WaveformAccess,
        config: &EditPointConfig,
        rng: &mut StdRng,
    ) -> Result<CutTriplet, EditPointError> {
        let len = waveform.len();
        let gap = candidate.gap;
        if gap.duration_samples() == 0 || gap.end_sample > len {
            return Err(EditPointError::geometry(format!(
                "gap [{}, {}) does not fit a waveform of {len} samples",
                gap.start_sample, gap.end_sample
            )));
        }

        let side = match config.invaded_side {
            InvadedSide::Following => BoundarySide::Following,
            InvadedSide::Preceding => BoundarySide::Preceding,
            InvadedSide::Random => {
                if rng.gen_bool(0.5) {
                    BoundarySide::Following
                } else {
                    BoundarySide::Preceding
                }
            }
        };

        let geometry = CutGeometry {
            samples: waveform.analysis_samples(),
            len,
            gap,
            half_context: config.original_clip_context_samples / 2,
            radius: config.zero_crossing_search_radius_samples,
            locator: ZeroCrossingLocator::new(config.zero_crossing_search_radius_samples),
        };

        let original = geometry.original(candidate, config.original_clip_context_samples)?;
        let natural = geometry.natural(side)?;
        let unnatural = geometry.unnatural(candidate, side, config, rng)?;

        tracing::debug!(
            candidate = candidate.index,
            gap_start = gap.start_sample,
            gap_end = gap.end_sample,
            natural_splice = ?natural.splice_sample,
            unnatural_splice = ?unnatural.splice_sample,
            invasion = ?unnatural.invasion_samples,
            side = ?side,
            "synthesized cut triplet"
        );

        Ok(CutTriplet {
            candidate_index: candidate.index,
            gap_duration_samples: candidate.gap_duration_samples,
            original,
            natural,
            unnatural,
        })
    }
}

struct CutGeometry<'s> {
    samples: &'s [f32],
    len: usize,
    gap: SilenceGap,
    half_context: usize,
    radius: usize,
    locator: ZeroCrossingLocator,
}

impl CutGeometry<'_> {
    /// Centered on the gap midpoint. A window that does not fit the buffer is
    /// cut back to the span of the two words around the gap.
    fn original(
        &self,
        candidate: &EditCandidate<'_>,
        context: usize,
    ) -> Result<CutSpec, EditPointError> {
        let mid = self.gap.midpoint_sample();
        let before = context / 2;
        let after = context - before;
        let (start, end) = if mid >= before && mid + after <= self.len {
            (mid - before, mid + after)
        } else {
            (
                mid.saturating_sub(before)
                    .max(candidate.preceding_word.start_sample),
                (mid + after)
                    .min(candidate.following_word.end_sample)
                    .min(self.len),
            )
        };
        let (start_sample, end_sample) = non_empty(EditType::Original, start, end)?;
        Ok(CutSpec {
            edit_type: EditType::Original,
            start_sample,
            end_sample,
            gap: self.gap,
            target_sample: None,
            splice_sample: None,
            invasion_samples: None,
            invaded_side: None,
            snapped: false,
        })
    }

    fn natural(&self, side: BoundarySide) -> Result<CutSpec, EditPointError> {
        let target = self.gap.midpoint_sample();
        let lo = self.gap.start_sample.max(target.saturating_sub(self.radius));
        let hi = (self.gap.end_sample - 1).min(target + self.radius);
        let snap = self
            .locator
            .locate_within(self.samples, target, SearchDirection::Nearest, lo..=hi);
        let splice = snap.index;

        let (start, end) = match side {
            BoundarySide::Following => (splice.saturating_sub(self.half_context), splice),
            BoundarySide::Preceding => (splice, (splice + self.half_context).min(self.len)),
        };
        let (start_sample, end_sample) = non_empty(EditType::Natural, start, end)?;
        Ok(CutSpec {
            edit_type: EditType::Natural,
            start_sample,
            end_sample,
            gap: self.gap,
            target_sample: Some(target),
            splice_sample: Some(splice),
            invasion_samples: None,
            invaded_side: None,
            snapped: snap.is_crossing(),
        })
    }

    fn unnatural(
        &self,
        candidate: &EditCandidate<'_>,
        side: BoundarySide,
        config: &EditPointConfig,
        rng: &mut StdRng,
    ) -> Result<CutSpec, EditPointError> {
        let (word, boundary) = match side {
            BoundarySide::Following => (candidate.following_word, candidate.following_word.start_sample),
            BoundarySide::Preceding => (candidate.preceding_word, candidate.preceding_word.end_sample),
        };
        let (duration, phoneme_mid) = invaded_phoneme(word, side);

        let (min_invasion, max_invasion) =
            config.invasion_range.resolve(duration).ok_or_else(|| {
                EditPointError::geometry(format!(
                    "invasion range is empty for a {duration}-sample phoneme in '{}'",
                    word.text
                ))
            })?;
        let room = match side {
            BoundarySide::Following => phoneme_mid.saturating_sub(boundary),
            BoundarySide::Preceding => boundary.saturating_sub(phoneme_mid),
        };
        let drawn = rng.gen_range(min_invasion..=max_invasion);
        let invasion = drawn.min(room);
        if invasion < min_invasion {
            return Err(EditPointError::geometry(format!(
                "only {room} samples between boundary {boundary} and phoneme midpoint {phoneme_mid}, need {min_invasion}"
            )));
        }

        let (target, direction, lo, hi) = match side {
            BoundarySide::Following => {
                let target = boundary + invasion;
                (
                    target,
                    SearchDirection::Backward,
                    (boundary + min_invasion).max(target.saturating_sub(self.radius)),
                    phoneme_mid.min(target + self.radius),
                )
            }
            BoundarySide::Preceding => {
                let target = boundary - invasion;
                (
                    target,
                    SearchDirection::Forward,
                    phoneme_mid.max(target.saturating_sub(self.radius)),
                    (boundary - min_invasion).min(target + self.radius),
                )
            }
        };
        let snap = self.locator.locate_within(self.samples, target, direction, lo..=hi);
        let splice = snap.index;

        let (start, end) = match side {
            BoundarySide::Following => (splice, (splice + self.half_context).min(self.len)),
            BoundarySide::Preceding => (splice.saturating_sub(self.half_context), splice),
        };
        let (start_sample, end_sample) = non_empty(EditType::Unnatural, start, end)?;
        Ok(CutSpec {
            edit_type: EditType::Unnatural,
            start_sample,
            end_sample,
            gap: self.gap,
            target_sample: Some(target),
            splice_sample: Some(splice),
            invasion_samples: Some(invasion),
            invaded_side: Some(side),
            snapped: snap.is_crossing(),
        })
    }
}

/// Duration and midpoint of the first phoneme of a following word or the
/// last phoneme of a preceding word. Words without phonemes count as one
/// phoneme spanning the word.
fn invaded_phoneme(word: &AlignedWord, side: BoundarySide) -> (usize, usize) {
    let phoneme = match side {
        BoundarySide::Following => word.phonemes.first(),
        BoundarySide::Preceding => word.phonemes.last(),
    };
    match phoneme {
        Some(p) => (p.duration_samples(), p.midpoint_sample()),
        None => (
            word.end_sample.saturating_sub(word.start_sample),
            word.start_sample + word.end_sample.saturating_sub(word.start_sample) / 2,
        ),
    }
}

fn non_empty(edit_type: EditType, start: usize, end: usize) -> Result<(usize, usize), EditPointError> {
    if start >= end {
        return Err(EditPointError::geometry(format!(
            "{} clip range [{start}, {end}) is empty",
            edit_type.as_str()
        )));
    }
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use crate::audio::waveform::Waveform;
    use crate::audio::zero_crossing::is_on_crossing;
    use crate::config::InvasionRange;
    use crate::types::{AlignedPhoneme, ChunkFlags};

    use super::*;

    const LEN: usize = 40_000;

    fn tone() -> Waveform {
        let samples = (0..LEN)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * i as f32 / 37.3).sin())
            .collect();
        Waveform::from_mono(16_000, samples)
    }

    fn phoneme(label: &str, start: usize, end: usize) -> AlignedPhoneme {
        AlignedPhoneme {
            label: label.to_string(),
            start_sample: start,
            end_sample: end,
        }
    }

    fn words() -> Vec<AlignedWord> {
        vec![
            AlignedWord {
                text: "before".to_string(),
                start_sample: 1_000,
                end_sample: 8_000,
                chunk_id: 0,
                chunk_flags: ChunkFlags::default(),
                phonemes: vec![phoneme("B", 1_000, 6_000), phoneme("OR", 6_000, 8_000)],
            },
            AlignedWord {
                text: "after".to_string(),
                start_sample: 12_800,
                end_sample: 20_000,
                chunk_id: 0,
                chunk_flags: ChunkFlags::default(),
                phonemes: vec![phoneme("AE", 12_800, 14_000), phoneme("FT", 14_000, 20_000)],
            },
        ]
    }

    fn candidate(words: &[AlignedWord]) -> EditCandidate<'_> {
        let gap = SilenceGap {
            start_sample: words[0].end_sample,
            end_sample: words[1].start_sample,
        };
        EditCandidate {
            index: 0,
            word_index: 0,
            gap,
            preceding_word: &words[0],
            following_word: &words[1],
            gap_duration_samples: gap.duration_samples(),
        }
    }

    fn synthesize(config: &EditPointConfig, seed: u64) -> Result<CutTriplet, EditPointError> {
        let words = words();
        let waveform = tone();
        let mut rng = StdRng::seed_from_u64(seed);
        MidpointInvasionSynthesizer.synthesize(&candidate(&words), &waveform, config, &mut rng)
    }

    #[test]
    fn original_window_centers_or_shrinks_to_word_span() {
        let roomy = EditPointConfig {
            original_clip_context_samples: 8_000,
            ..EditPointConfig::default()
        };
        let triplet = synthesize(&roomy, 0).expect("triplet");
        assert_eq!(
            (triplet.original.start_sample, triplet.original.end_sample),
            (6_400, 14_400)
        );

        // 38000 samples around 10400 would start before sample 0.
        let short = EditPointConfig {
            original_clip_context_samples: 38_000,
            ..EditPointConfig::default()
        };
        let triplet = synthesize(&short, 0).expect("triplet");
        assert_eq!(
            (triplet.original.start_sample, triplet.original.end_sample),
            (1_000, 20_000)
        );
    }

    #[test]
    fn following_invasion_geometry() {
        let config = EditPointConfig::default();
        for seed in 0..20 {
            let triplet = synthesize(&config, seed).expect("triplet");
            assert_eq!(triplet.original.start_sample, 1_000);
            assert_eq!(triplet.original.end_sample, 20_000);

            let natural = &triplet.natural;
            let splice = natural.splice_sample.expect("natural splice");
            assert_eq!(natural.target_sample, Some(10_400));
            assert!(splice.abs_diff(10_400) <= config.zero_crossing_search_radius_samples);
            assert_eq!(natural.end_sample, splice);

            let unnatural = &triplet.unnatural;
            let invasion = unnatural.invasion_samples.expect("invasion");
            // 0.2..=0.5 of a 1200-sample phoneme, capped at its midpoint.
            assert!((240..=600).contains(&invasion), "invasion {invasion}");
            let splice = unnatural.splice_sample.expect("unnatural splice");
            assert!((12_800 + 240..=13_400).contains(&splice));
            assert_eq!(unnatural.start_sample, splice);
            assert_eq!(unnatural.invaded_side, Some(BoundarySide::Following));

            assert!(!natural.overlaps(unnatural));
        }
    }

    #[test]
    fn preceding_invasion_mirrors_geometry() {
        let config = EditPointConfig {
            invaded_side: InvadedSide::Preceding,
            ..EditPointConfig::default()
        };
        let triplet = synthesize(&config, 3).expect("triplet");
        let unnatural = &triplet.unnatural;
        let invasion = unnatural.invasion_samples.expect("invasion");
        // Last phoneme of "before" is 2000 samples long: 400..=1000.
        assert!((400..=1_000).contains(&invasion));
        let splice = unnatural.splice_sample.expect("splice");
        assert!((7_000..=8_000 - 400).contains(&splice));
        assert_eq!(unnatural.end_sample, splice);
        assert_eq!(triplet.natural.start_sample, triplet.natural.splice_sample.unwrap());
        assert!(!triplet.natural.overlaps(unnatural));
    }

    #[test]
    fn same_seed_same_triplet() {
        let config = EditPointConfig {
            invaded_side: InvadedSide::Random,
            ..EditPointConfig::default()
        };
        assert_eq!(synthesize(&config, 11).unwrap(), synthesize(&config, 11).unwrap());
        let sides: std::collections::HashSet<_> = (0..32)
            .map(|seed| synthesize(&config, seed).unwrap().unnatural.invaded_side)
            .collect();
        assert_eq!(sides.len(), 2);
    }

    #[test]
    fn sample_range_is_capped_at_phoneme_midpoint() {
        let config = EditPointConfig {
            invasion_range: InvasionRange::Samples { min: 100, max: 5_000 },
            ..EditPointConfig::default()
        };
        for seed in 0..10 {
            let triplet = synthesize(&config, seed).unwrap();
            assert!(triplet.unnatural.invasion_samples.unwrap() <= 600);
        }
    }

    #[test]
    fn minimum_beyond_midpoint_is_a_geometry_error() {
        let config = EditPointConfig {
            invasion_range: InvasionRange::Samples { min: 700, max: 900 },
            ..EditPointConfig::default()
        };
        assert!(matches!(
            synthesize(&config, 0),
            Err(EditPointError::Geometry { .. })
        ));
    }

    #[test]
    fn word_without_phonemes_is_one_phoneme() {
        let mut words = words();
        words[1].phonemes.clear();
        let waveform = tone();
        let mut rng = StdRng::seed_from_u64(5);
        let triplet = MidpointInvasionSynthesizer
            .synthesize(&candidate(&words), &waveform, &EditPointConfig::default(), &mut rng)
            .unwrap();
        // Whole word is 7200 samples: 1440..=3600.
        let invasion = triplet.unnatural.invasion_samples.unwrap();
        assert!((1_440..=3_600).contains(&invasion));
    }

    #[test]
    fn splices_land_on_crossings_of_a_tone() {
        let waveform = tone();
        let mut unnatural_snaps = 0;
        for seed in 0..16 {
            let triplet = synthesize(&EditPointConfig::default(), seed).unwrap();
            assert!(triplet.natural.snapped);
            assert!(!triplet.original.snapped);
            let splice = triplet.unnatural.splice_sample.unwrap();
            assert_eq!(
                triplet.unnatural.snapped,
                is_on_crossing(waveform.analysis_samples(), splice)
            );
            unnatural_snaps += usize::from(triplet.unnatural.snapped);
        }
        assert!(unnatural_snaps > 8);
    }
}
