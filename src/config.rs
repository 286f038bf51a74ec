use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::EditPointError;

/// Which word an unnatural cut intrudes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvadedSide {
    Preceding,
    Following,
    /// Resolved independently for every candidate from the seeded generator.
    Random,
}

/// Bounds for the unnatural-cut invasion distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", rename_all = "lowercase")]
pub enum InvasionRange {
    /// Raw sample counts measured from the word boundary.
    Samples { min: usize, max: usize },
    /// Fractions of the invaded phoneme's duration.
    Fraction { min: f64, max: f64 },
}

impl InvasionRange {
    /// Resolves the range into inclusive sample bounds for a phoneme of the
    /// given duration. Returns `None` when the range is empty at that duration.
    pub fn resolve(&self, phoneme_duration_samples: usize) -> Option<(usize, usize)> {
        let (min, max) = match *self {
            Self::Samples { min, max } => (min, max),
            Self::Fraction { min, max } => {
                let duration = phoneme_duration_samples as f64;
                ((min * duration).ceil() as usize, (max * duration).floor() as usize)
            }
        };
        let min = min.max(1);
        if min > max {
            return None;
        }
        Some((min, max))
    }
}

/// Shape every rendered clip is converted to before it reaches the sink, so
/// downstream consumers see uniform audio regardless of the source recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipFormat {
    /// Replace the source channels with the mono analysis track.
    pub mono: bool,
    /// `None` keeps the source rate.
    pub sample_rate_hz: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditPointConfig {
    pub min_gap_duration_samples: usize,
    /// `None` keeps every eligible gap.
    pub max_candidates_per_utterance: Option<usize>,
    pub invasion_range: InvasionRange,
    pub invaded_side: InvadedSide,
    pub zero_crossing_search_radius_samples: usize,
    pub original_clip_context_samples: usize,
    pub random_seed: u64,
    /// Slack allowed when checking that phonemes nest inside their word.
    pub phoneme_tolerance_samples: usize,
    /// Skip gaps touching chunks the upstream normalizer flagged as unreliable
    /// (audio events, out-of-vocabulary words, transcript mismatches).
    pub skip_flagged_chunks: bool,
    pub worker_threads: usize,
    pub clip_format: ClipFormat,
}

impl EditPointConfig {
    pub const DEFAULT_MIN_GAP_DURATION_SAMPLES: usize = 2_000;
    pub const DEFAULT_SEARCH_RADIUS_SAMPLES: usize = 480;
    pub const DEFAULT_CONTEXT_SAMPLES: usize = 48_000;
    pub const DEFAULT_PHONEME_TOLERANCE_SAMPLES: usize = 16;

    pub fn load(path: &Path) -> Result<Self, EditPointError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| EditPointError::io("read edit-point config", e))?;
        let config: Self = serde_json::from_str(&data)
            .map_err(|e| EditPointError::json("parse edit-point config", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EditPointError> {
        if self.min_gap_duration_samples == 0 {
            return Err(EditPointError::invalid_config(
                "min_gap_duration_samples must be >= 1",
            ));
        }
        if self.max_candidates_per_utterance == Some(0) {
            return Err(EditPointError::invalid_config(
                "max_candidates_per_utterance must be >= 1 when set",
            ));
        }
        if self.original_clip_context_samples < 2 {
            return Err(EditPointError::invalid_config(
                "original_clip_context_samples must be >= 2",
            ));
        }
        if self.worker_threads == 0 {
            return Err(EditPointError::invalid_config("worker_threads must be >= 1"));
        }
        if self.clip_format.sample_rate_hz == Some(0) {
            return Err(EditPointError::invalid_config(
                "clip_format.sample_rate_hz must be positive when set",
            ));
        }
        match self.invasion_range {
            InvasionRange::Samples { min, max } => {
                if max == 0 || min > max {
                    return Err(EditPointError::invalid_config(format!(
                        "invasion_range samples must satisfy 0 < min <= max (got min={min}, max={max})"
                    )));
                }
            }
            InvasionRange::Fraction { min, max } => {
                if !(min.is_finite() && max.is_finite()) || min < 0.0 || min > max || max > 1.0 {
                    return Err(EditPointError::invalid_config(format!(
                        "invasion_range fractions must satisfy 0 <= min <= max <= 1 (got min={min}, max={max})"
                    )));
                }
                // Anything above one half always hits the phoneme-midpoint clamp.
                if min > 0.5 {
                    return Err(EditPointError::invalid_config(format!(
                        "invasion_range fraction min={min} can never be honored: cuts stop at the phoneme midpoint"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for EditPointConfig {
    fn default() -> Self {
        Self {
            min_gap_duration_samples: Self::DEFAULT_MIN_GAP_DURATION_SAMPLES,
            max_candidates_per_utterance: None,
            invasion_range: InvasionRange::Fraction { min: 0.2, max: 0.5 },
            invaded_side: InvadedSide::Following,
            zero_crossing_search_radius_samples: Self::DEFAULT_SEARCH_RADIUS_SAMPLES,
            original_clip_context_samples: Self::DEFAULT_CONTEXT_SAMPLES,
            random_seed: 0,
            phoneme_tolerance_samples: Self::DEFAULT_PHONEME_TOLERANCE_SAMPLES,
            skip_flagged_chunks: true,
            worker_threads: 1,
            clip_format: ClipFormat::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_point_config_default() {
        let config = EditPointConfig::default();
        assert_eq!(config.min_gap_duration_samples, 2_000);
        assert_eq!(config.max_candidates_per_utterance, None);
        assert_eq!(config.invaded_side, InvadedSide::Following);
        assert_eq!(config.worker_threads, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{
            "min_gap_duration_samples": 1200,
            "invasion_range": { "unit": "samples", "min": 40, "max": 200 },
            "invaded_side": "random",
            "random_seed": 7
        }"#;
        let config: EditPointConfig = serde_json::from_str(json).expect("valid config json");
        assert_eq!(config.min_gap_duration_samples, 1200);
        assert_eq!(
            config.invasion_range,
            InvasionRange::Samples { min: 40, max: 200 }
        );
        assert_eq!(config.invaded_side, InvadedSide::Random);
        assert_eq!(config.random_seed, 7);
        assert_eq!(
            config.zero_crossing_search_radius_samples,
            EditPointConfig::DEFAULT_SEARCH_RADIUS_SAMPLES
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_unreachable_fraction() {
        let config = EditPointConfig {
            invasion_range: InvasionRange::Fraction { min: 0.7, max: 0.9 },
            ..EditPointConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(EditPointError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn validate_rejects_zero_gap_and_workers() {
        let zero_gap = EditPointConfig {
            min_gap_duration_samples: 0,
            ..EditPointConfig::default()
        };
        assert!(zero_gap.validate().is_err());
        let zero_workers = EditPointConfig {
            worker_threads: 0,
            ..EditPointConfig::default()
        };
        assert!(zero_workers.validate().is_err());
    }

    #[test]
    fn clip_format_parses_and_rejects_zero_rate() {
        let config: EditPointConfig =
            serde_json::from_str(r#"{"clip_format": {"mono": true, "sample_rate_hz": 16000}}"#)
                .expect("valid config json");
        assert_eq!(
            config.clip_format,
            ClipFormat {
                mono: true,
                sample_rate_hz: Some(16_000),
            }
        );
        assert!(config.validate().is_ok());

        let zero_rate = EditPointConfig {
            clip_format: ClipFormat {
                mono: false,
                sample_rate_hz: Some(0),
            },
            ..EditPointConfig::default()
        };
        assert!(zero_rate.validate().is_err());
    }

    #[test]
    fn invasion_range_resolve() {
        let fraction = InvasionRange::Fraction { min: 0.2, max: 0.5 };
        assert_eq!(fraction.resolve(1000), Some((200, 500)));
        // 0.2 * 3 = 0.6 -> ceil 1, 0.5 * 3 = 1.5 -> floor 1
        assert_eq!(fraction.resolve(3), Some((1, 1)));
        assert_eq!(fraction.resolve(1), None);

        let samples = InvasionRange::Samples { min: 0, max: 10 };
        assert_eq!(samples.resolve(5), Some((1, 10)));
    }

    #[test]
    fn load_reads_and_validates_file() {
        let dir = tempfile::tempdir().expect("create tempdir");
        let path = dir.path().join("editpoint.json");
        std::fs::write(&path, r#"{"worker_threads": 4}"#).expect("write config");
        let config = EditPointConfig::load(&path).expect("load config");
        assert_eq!(config.worker_threads, 4);

        std::fs::write(&path, r#"{"worker_threads": 0}"#).expect("write config");
        assert!(EditPointConfig::load(&path).is_err());
        assert!(EditPointConfig::load(&dir.path().join("missing.json")).is_err());
    }
}
