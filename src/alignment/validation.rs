use crate::error::EditPointError;
use crate::types::{AlignedWord, UtteranceAlignment};

/// Checks the ordering and nesting contract every downstream stage relies on.
/// Phonemes must tile their word: holes at either edge or between phonemes
/// may not exceed `phoneme_tolerance_samples`. A failure here rejects the
/// whole utterance.
pub fn validate_alignment(
    alignment: &UtteranceAlignment,
    waveform_len: usize,
    waveform_sample_rate_hz: u32,
    phoneme_tolerance_samples: usize,
) -> Result<(), EditPointError> {
    if alignment.sample_rate_hz == 0 {
        return Err(EditPointError::invalid_input(format!(
            "utterance {}: sample rate must be positive",
            alignment.utterance_id
        )));
    }
    if alignment.sample_rate_hz != waveform_sample_rate_hz {
        return Err(EditPointError::invalid_input(format!(
            "utterance {}: alignment sample rate {} Hz does not match waveform {} Hz",
            alignment.utterance_id, alignment.sample_rate_hz, waveform_sample_rate_hz
        )));
    }

    let mut previous: Option<&AlignedWord> = None;
    for (index, word) in alignment.words.iter().enumerate() {
        let fail = |reason: String| {
            EditPointError::invalid_input(format!(
                "utterance {}: word {index} ('{}'): {reason}",
                alignment.utterance_id, word.text
            ))
        };

        if word.start_sample >= word.end_sample {
            return Err(fail(format!(
                "non-positive duration [{}, {})",
                word.start_sample, word.end_sample
            )));
        }
        if word.end_sample > waveform_len {
            return Err(fail(format!(
                "ends at sample {} beyond waveform length {waveform_len}",
                word.end_sample
            )));
        }
        if let Some(prev) = previous {
            if word.start_sample < prev.start_sample {
                return Err(fail("words are not ordered by start sample".to_string()));
            }
            if word.start_sample < prev.end_sample {
                return Err(fail(format!(
                    "overlaps previous word ending at sample {}",
                    prev.end_sample
                )));
            }
        }

        let nest_lo = word.start_sample.saturating_sub(phoneme_tolerance_samples);
        let nest_hi = word.end_sample + phoneme_tolerance_samples;
        let mut previous_phoneme_end: Option<usize> = None;
        for (p, phoneme) in word.phonemes.iter().enumerate() {
            if phoneme.start_sample >= phoneme.end_sample {
                return Err(fail(format!(
                    "phoneme {p} ('{}') has non-positive duration",
                    phoneme.label
                )));
            }
            if phoneme.start_sample < nest_lo || phoneme.end_sample > nest_hi {
                return Err(fail(format!(
                    "phoneme {p} ('{}') [{}, {}) lies outside the word",
                    phoneme.label, phoneme.start_sample, phoneme.end_sample
                )));
            }
            let expected_start = previous_phoneme_end.unwrap_or(word.start_sample);
            if phoneme.start_sample + phoneme_tolerance_samples < expected_start {
                return Err(fail(format!(
                    "phoneme {p} ('{}') starts before the previous phoneme ends",
                    phoneme.label
                )));
            }
            let hole = phoneme.start_sample.saturating_sub(expected_start);
            if hole > phoneme_tolerance_samples {
                return Err(fail(format!(
                    "{hole}-sample hole before phoneme {p} ('{}') at sample {}",
                    phoneme.label, phoneme.start_sample
                )));
            }
            previous_phoneme_end = Some(phoneme.end_sample);
        }
        if let Some(last_end) = previous_phoneme_end {
            let hole = word.end_sample.saturating_sub(last_end);
            if hole > phoneme_tolerance_samples {
                return Err(fail(format!(
                    "{hole}-sample hole after the last phoneme, which ends at sample {last_end}"
                )));
            }
        }

        previous = Some(word);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::types::AlignedPhoneme;

    use super::*;

    fn word(text: &str, start: usize, end: usize) -> AlignedWord {
        AlignedWord {
            text: text.to_string(),
            start_sample: start,
            end_sample: end,
            chunk_id: 0,
            chunk_flags: Default::default(),
            phonemes: Vec::new(),
        }
    }

    fn alignment(words: Vec<AlignedWord>) -> UtteranceAlignment {
        UtteranceAlignment {
            utterance_id: "utt".to_string(),
            sample_rate_hz: 16_000,
            words,
        }
    }

    fn is_input_error(result: Result<(), EditPointError>) -> bool {
        matches!(result, Err(EditPointError::InvalidInput { .. }))
    }

    #[test]
    fn accepts_well_formed_alignment_and_empty_word_list() {
        let mut first = word("a", 100, 400);
        first.phonemes = vec![
            AlignedPhoneme {
                label: "AH".to_string(),
                start_sample: 96,
                end_sample: 250,
            },
            AlignedPhoneme {
                label: "B".to_string(),
                start_sample: 250,
                end_sample: 410,
            },
        ];
        let ok = alignment(vec![first, word("b", 400, 900)]);
        assert!(validate_alignment(&ok, 1_000, 16_000, 16).is_ok());
        assert!(validate_alignment(&alignment(Vec::new()), 0, 16_000, 16).is_ok());
    }

    #[test]
    fn rejects_sample_rate_mismatch() {
        let a = alignment(vec![word("a", 0, 10)]);
        assert!(is_input_error(validate_alignment(&a, 100, 22_050, 0)));
    }

    #[test]
    fn rejects_bad_word_geometry() {
        let empty = alignment(vec![word("a", 10, 10)]);
        assert!(is_input_error(validate_alignment(&empty, 100, 16_000, 0)));

        let overlapping = alignment(vec![word("a", 0, 50), word("b", 40, 80)]);
        assert!(is_input_error(validate_alignment(&overlapping, 100, 16_000, 0)));

        let unordered = alignment(vec![word("a", 50, 60), word("b", 0, 10)]);
        assert!(is_input_error(validate_alignment(&unordered, 100, 16_000, 0)));

        let too_long = alignment(vec![word("a", 0, 101)]);
        assert!(is_input_error(validate_alignment(&too_long, 100, 16_000, 0)));
    }

    #[test]
    fn rejects_phoneme_outside_word() {
        let mut w = word("a", 100, 200);
        w.phonemes.push(AlignedPhoneme {
            label: "AA".to_string(),
            start_sample: 110,
            end_sample: 240,
        });
        let a = alignment(vec![w]);
        assert!(is_input_error(validate_alignment(&a, 1_000, 16_000, 16)));
        assert!(validate_alignment(&a, 1_000, 16_000, 40).is_ok());
    }

    fn phoneme(label: &str, start: usize, end: usize) -> AlignedPhoneme {
        AlignedPhoneme {
            label: label.to_string(),
            start_sample: start,
            end_sample: end,
        }
    }

    #[test]
    fn rejects_holes_in_phoneme_tiling() {
        let mut leading = word("a", 1_000, 5_000);
        leading.phonemes = vec![phoneme("K", 3_000, 3_500), phoneme("AE", 3_500, 5_000)];
        assert!(is_input_error(validate_alignment(
            &alignment(vec![leading]),
            6_000,
            16_000,
            16
        )));

        let mut inner = word("a", 1_000, 5_000);
        inner.phonemes = vec![phoneme("K", 1_000, 3_500), phoneme("AE", 4_500, 5_000)];
        assert!(is_input_error(validate_alignment(
            &alignment(vec![inner]),
            6_000,
            16_000,
            16
        )));

        let mut trailing = word("a", 1_000, 5_000);
        trailing.phonemes = vec![phoneme("K", 1_000, 3_500), phoneme("AE", 3_500, 4_000)];
        assert!(is_input_error(validate_alignment(
            &alignment(vec![trailing]),
            6_000,
            16_000,
            16
        )));

        let mut rounded = word("a", 1_000, 5_000);
        rounded.phonemes = vec![phoneme("K", 1_010, 3_500), phoneme("AE", 3_512, 4_990)];
        assert!(validate_alignment(&alignment(vec![rounded]), 6_000, 16_000, 16).is_ok());
    }
}
