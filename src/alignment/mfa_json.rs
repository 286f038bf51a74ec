//! Adapter for the word list written by the MFA normalization stage.
//!
//! Each record carries times in seconds relative to the full recording plus
//! the chunk diagnostics that stage computed. Records are converted to
//! sample indices by rounding `seconds * sample_rate_hz`.

use serde::{Deserialize, Serialize};

use crate::error::EditPointError;
use crate::types::{AlignedPhoneme, AlignedWord, ChunkFlags, UtteranceAlignment};

/// Text the transcription service emits for non-speech audio events.
const AUDIO_EVENT_MARKER: &str = "...";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MfaPhonemeRecord {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MfaChunkInfo {
    pub id: u32,
    pub contains_audio_event: bool,
    pub contains_oov_words: bool,
    pub contains_mismatched_words: bool,
    pub oov_words: Vec<String>,
    pub mismatched_pairs: Vec<Vec<String>>,
}

impl MfaChunkInfo {
    fn flags(&self) -> ChunkFlags {
        ChunkFlags {
            contains_audio_event: self.contains_audio_event,
            contains_oov_words: self.contains_oov_words,
            contains_mismatched_words: self.contains_mismatched_words,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MfaWordRecord {
    #[serde(default)]
    pub id: Option<u64>,
    /// Transcript spelling of the word.
    #[serde(default)]
    pub word: String,
    /// Spelling the aligner matched, which may differ after normalization.
    #[serde(default)]
    pub mfa_word: Option<String>,
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub phonemes: Vec<MfaPhonemeRecord>,
    #[serde(default)]
    pub chunk_info: Option<MfaChunkInfo>,
}

impl MfaWordRecord {
    fn display_text(&self) -> &str {
        let word = self.word.trim();
        if !word.is_empty() {
            return word;
        }
        self.mfa_word.as_deref().map(str::trim).unwrap_or("")
    }
}

fn seconds_to_sample(seconds: f64, sample_rate_hz: u32, what: &str) -> Result<usize, EditPointError> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(EditPointError::invalid_input(format!(
            "{what} time {seconds} is not a non-negative number of seconds"
        )));
    }
    Ok((seconds * sample_rate_hz as f64).round() as usize)
}

impl UtteranceAlignment {
    /// Builds a sample-indexed alignment from normalizer records. Empty words
    /// and audio-event markers are skipped, as are unlabeled phonemes.
    pub fn from_mfa_records(
        utterance_id: &str,
        sample_rate_hz: u32,
        records: &[MfaWordRecord],
    ) -> Result<Self, EditPointError> {
        if sample_rate_hz == 0 {
            return Err(EditPointError::invalid_input("sample rate must be positive"));
        }

        let mut words = Vec::with_capacity(records.len());
        let mut skipped = 0usize;
        for record in records {
            let text = record.display_text();
            if text.is_empty() || text == AUDIO_EVENT_MARKER {
                skipped += 1;
                continue;
            }

            let mut phonemes = Vec::with_capacity(record.phonemes.len());
            for phoneme in &record.phonemes {
                let label = phoneme.text.trim();
                if label.is_empty() {
                    continue;
                }
                phonemes.push(AlignedPhoneme {
                    label: label.to_string(),
                    start_sample: seconds_to_sample(phoneme.start, sample_rate_hz, "phoneme start")?,
                    end_sample: seconds_to_sample(phoneme.end, sample_rate_hz, "phoneme end")?,
                });
            }

            let chunk = record.chunk_info.as_ref();
            words.push(AlignedWord {
                text: text.to_string(),
                start_sample: seconds_to_sample(record.start, sample_rate_hz, "word start")?,
                end_sample: seconds_to_sample(record.end, sample_rate_hz, "word end")?,
                chunk_id: chunk.map(|c| c.id).unwrap_or(0),
                chunk_flags: chunk.map(MfaChunkInfo::flags).unwrap_or_default(),
                phonemes,
            });
        }

        if skipped > 0 {
            tracing::debug!(
                utterance_id,
                skipped,
                kept = words.len(),
                "skipped non-word entries in mfa alignment"
            );
        }

        Ok(Self {
            utterance_id: utterance_id.to_string(),
            sample_rate_hz,
            words,
        })
    }
}
