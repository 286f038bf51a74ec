pub mod mfa_json;
pub mod validation;

use std::path::Path;

use serde::Deserialize;

use crate::error::EditPointError;
use crate::types::UtteranceAlignment;

pub use mfa_json::{MfaChunkInfo, MfaPhonemeRecord, MfaWordRecord};
pub use validation::validate_alignment;

/// Alignment files come either as the normalizer's flat word list or as an
/// already sample-indexed `UtteranceAlignment`.
#[derive(Deserialize)]
#[serde(untagged)]
enum AlignmentDocument {
    Mfa(Vec<MfaWordRecord>),
    Normalized(UtteranceAlignment),
}

/// Reads an alignment JSON file in either supported layout. `utterance_id`
/// and `sample_rate_hz` are only used for the MFA layout, which carries
/// neither.
pub fn load_alignment(
    path: &Path,
    utterance_id: &str,
    sample_rate_hz: u32,
) -> Result<UtteranceAlignment, EditPointError> {
    let data =
        std::fs::read_to_string(path).map_err(|e| EditPointError::io("read alignment json", e))?;
    let document: AlignmentDocument = serde_json::from_str(&data)
        .map_err(|e| EditPointError::json("parse alignment json", e))?;
    match document {
        AlignmentDocument::Mfa(records) => {
            UtteranceAlignment::from_mfa_records(utterance_id, sample_rate_hz, &records)
        }
        AlignmentDocument::Normalized(alignment) => Ok(alignment),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_alignment_accepts_both_layouts() {
        let dir = tempfile::tempdir().expect("create tempdir");

        let mfa_path = dir.path().join("mfa.json");
        std::fs::write(
            &mfa_path,
            r#"[{"id": 1, "word": "hello", "start": 0.5, "end": 0.9, "phonemes": []}]"#,
        )
        .expect("write mfa json");
        let mfa = load_alignment(&mfa_path, "utt", 16_000).expect("load mfa layout");
        assert_eq!(mfa.utterance_id, "utt");
        assert_eq!(mfa.words[0].start_sample, 8_000);

        let normalized_path = dir.path().join("normalized.json");
        std::fs::write(
            &normalized_path,
            r#"{"utterance_id": "kept", "sample_rate_hz": 8000, "words": [
                {"text": "a", "start_sample": 10, "end_sample": 20, "chunk_id": 0}
            ]}"#,
        )
        .expect("write normalized json");
        let normalized = load_alignment(&normalized_path, "ignored", 16_000).expect("load");
        assert_eq!(normalized.utterance_id, "kept");
        assert_eq!(normalized.sample_rate_hz, 8_000);
    }

    #[test]
    fn load_alignment_reports_parse_errors() {
        let dir = tempfile::tempdir().expect("create tempdir");
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").expect("write");
        assert!(matches!(
            load_alignment(&path, "utt", 16_000),
            Err(EditPointError::Json { .. })
        ));
    }
}
